//! Handlers for `/quests` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/quests` | Cached |
//! | `POST` | `/quests` | Creates a catalog quest |
//! | `GET`  | `/quests/mine` | Caller's records |
//! | `POST` | `/quests/{id}/start` | Idempotent assignment |
//! | `POST` | `/quests/{id}/progress` | `{delta}` |
//! | `POST` | `/quests/{id}/complete` | Requires progress at target |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questline_core::{
  activity::{ContentKind, Transition, UserQuest},
  catalog::{NewQuest, Quest},
  store::Store,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  rewards::{Progress, grant_completion},
};

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
  pub delta: u32,
}

/// `GET /quests`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Quest>>, ApiError>
where
  S: Store + 'static,
{
  let quests = state
    .cache
    .quests
    .get_or_try_insert_with((), || state.store.list_quests())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(quests))
}

/// `POST /quests`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<NewQuest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let quest = state.store.create_quest(body).await.map_err(ApiError::store)?;
  state.cache.quests.invalidate(&());
  tracing::info!(quest_id = %quest.id, created_by = %current.user.id, "quest created");
  Ok((StatusCode::CREATED, Json(quest)))
}

/// `GET /quests/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<UserQuest>>, ApiError>
where
  S: Store + 'static,
{
  let records = state
    .store
    .list_user_quests(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /quests/{id}/start`
pub async fn start<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UserQuest>, ApiError>
where
  S: Store + 'static,
{
  let record = state
    .store
    .assign_quest(current.user.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `POST /quests/{id}/progress`
pub async fn progress<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ProgressBody>,
) -> Result<Json<Progress<UserQuest>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let transition = state
    .store
    .record_quest_progress(user_id, id, body.delta)
    .await
    .map_err(ApiError::store)?;
  finish(&state, user_id, id, transition).await
}

/// `POST /quests/{id}/complete`
pub async fn complete<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Progress<UserQuest>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let transition = state
    .store
    .complete_quest(user_id, id)
    .await
    .map_err(ApiError::store)?;
  finish(&state, user_id, id, transition).await
}

async fn finish<S>(
  state: &AppState<S>,
  user_id: Uuid,
  quest_id: Uuid,
  transition: Transition<UserQuest>,
) -> Result<Json<Progress<UserQuest>>, ApiError>
where
  S: Store + 'static,
{
  if !transition.newly_completed {
    return Ok(Json(Progress::new(transition, None)));
  }
  let quest = state
    .store
    .get_quest(quest_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("quest {quest_id} not found")))?;
  let achievement =
    grant_completion(state, user_id, ContentKind::Quest, quest_id, quest.xp_reward).await?;
  Ok(Json(Progress::new(transition, Some(achievement))))
}
