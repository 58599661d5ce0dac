//! Handlers for `/roadmaps` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questline_core::{
  activity::{ContentKind, UserRoadmap},
  catalog::{NewRoadmap, Roadmap},
  store::Store,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  rewards::{Progress, grant_completion},
};

/// `GET /roadmaps`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Roadmap>>, ApiError>
where
  S: Store + 'static,
{
  let roadmaps = state
    .cache
    .roadmaps
    .get_or_try_insert_with((), || state.store.list_roadmaps())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(roadmaps))
}

/// `POST /roadmaps`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<NewRoadmap>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let roadmap = state.store.create_roadmap(body).await.map_err(ApiError::store)?;
  state.cache.roadmaps.invalidate(&());
  tracing::info!(roadmap_id = %roadmap.id, created_by = %current.user.id, "roadmap created");
  Ok((StatusCode::CREATED, Json(roadmap)))
}

/// `GET /roadmaps/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<UserRoadmap>>, ApiError>
where
  S: Store + 'static,
{
  let records = state
    .store
    .list_user_roadmaps(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /roadmaps/{id}/start`
pub async fn start<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UserRoadmap>, ApiError>
where
  S: Store + 'static,
{
  let record = state
    .store
    .start_roadmap(current.user.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `POST /roadmaps/{id}/milestones/{index}/complete`
pub async fn complete_milestone<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path((id, index)): Path<(Uuid, u32)>,
) -> Result<Json<Progress<UserRoadmap>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let transition = state
    .store
    .complete_milestone(user_id, id, index)
    .await
    .map_err(ApiError::store)?;
  if !transition.newly_completed {
    return Ok(Json(Progress::new(transition, None)));
  }

  let roadmap = state
    .store
    .get_roadmap(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("roadmap {id} not found")))?;
  let achievement =
    grant_completion(&state, user_id, ContentKind::Roadmap, id, roadmap.xp_reward).await?;
  Ok(Json(Progress::new(transition, Some(achievement))))
}
