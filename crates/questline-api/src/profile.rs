//! Handlers for `/profile` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/profile` | Creates the profile on first use |
//! | `PATCH` | `/profile` | Bio, interests, pace, style |
//! | `POST`  | `/profile/onboarding` | Interests, pace, style, tier; marks complete |

use axum::{Json, extract::State};
use questline_core::{
  profile::{Onboarding, ProfileUpdate, UserProfile},
  progression::xp_to_next_level,
  store::Store,
};
use serde::Serialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// A profile together with the distance to the next level.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
  #[serde(flatten)]
  pub profile:          UserProfile,
  pub xp_to_next_level: u64,
}

impl From<UserProfile> for ProfileResponse {
  fn from(profile: UserProfile) -> Self {
    let xp_to_next_level = xp_to_next_level(profile.xp);
    Self { profile, xp_to_next_level }
  }
}

/// `GET /profile`
pub async fn get_own<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: Store + 'static,
{
  let profile = state
    .store
    .ensure_profile(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile.into()))
}

/// `PATCH /profile`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  state.store.ensure_profile(user_id).await.map_err(ApiError::store)?;
  let profile = state
    .store
    .update_profile(user_id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile for user {user_id} not found")))?;
  Ok(Json(profile.into()))
}

/// `POST /profile/onboarding`
pub async fn onboarding<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<Onboarding>,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: Store + 'static,
{
  let profile = state
    .store
    .complete_onboarding(current.user.id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %current.user.id, "onboarding complete");
  Ok(Json(profile.into()))
}
