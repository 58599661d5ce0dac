//! Showcase routes. Content comes from the [`Showcase`] in
//! [`AppState`]; nothing here is persisted.
//!
//! [`Showcase`]: questline_core::showcase::Showcase

use axum::{
  Json,
  extract::{Query, State},
};
use questline_core::{
  profile::UserProfile,
  showcase::{GeneratedChallenge, LearningAnalytics, ShadowSession, SwarmProject, TechSpotlight},
  store::Store,
};
use serde::Deserialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct TopicParams {
  pub topic: Option<String>,
}

async fn profile<S>(state: &AppState<S>, current: &CurrentUser) -> Result<UserProfile, ApiError>
where
  S: Store + 'static,
{
  state
    .store
    .ensure_profile(current.user.id)
    .await
    .map_err(ApiError::store)
}

/// `GET /showcase/ai-challenges`
pub async fn ai_challenges<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<GeneratedChallenge>>, ApiError>
where
  S: Store + 'static,
{
  let profile = profile(&state, &current).await?;
  Ok(Json(state.showcase.ai_challenges(&profile)))
}

/// `GET /showcase/shadow-session?topic`
pub async fn shadow_session<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Query(params): Query<TopicParams>,
) -> Json<ShadowSession>
where
  S: Store + 'static,
{
  let topic = params.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
  Json(state.showcase.shadow_session(current.user.id, topic))
}

/// `GET /showcase/swarm-projects`
pub async fn swarm_projects<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
) -> Json<Vec<SwarmProject>>
where
  S: Store + 'static,
{
  Json(state.showcase.swarm_projects())
}

/// `GET /showcase/tech-spotlight`
pub async fn tech_spotlight<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
) -> Json<TechSpotlight>
where
  S: Store + 'static,
{
  Json(state.showcase.tech_spotlight(state.clock.today()))
}

/// `GET /showcase/analytics`
pub async fn analytics<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<LearningAnalytics>, ApiError>
where
  S: Store + 'static,
{
  let profile = profile(&state, &current).await?;
  Ok(Json(state.showcase.learning_analytics(&profile)))
}
