//! Handlers for `/courses` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questline_core::{
  activity::{ContentKind, UserCourse},
  catalog::{Course, NewCourse},
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
  /// 0-100.
  pub percent: u8,
}

/// `GET /courses`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Course>>, ApiError>
where
  S: Store + 'static,
{
  let courses = state
    .cache
    .courses
    .get_or_try_insert_with((), || state.store.list_courses())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(courses))
}

/// `POST /courses`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let course = state.store.create_course(body).await.map_err(ApiError::store)?;
  state.cache.courses.invalidate(&());
  tracing::info!(course_id = %course.id, created_by = %current.user.id, "course created");
  Ok((StatusCode::CREATED, Json(course)))
}

/// `GET /courses/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<UserCourse>>, ApiError>
where
  S: Store + 'static,
{
  let records = state
    .store
    .list_user_courses(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /courses/{id}/start`
pub async fn start<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UserCourse>, ApiError>
where
  S: Store + 'static,
{
  let record = state
    .store
    .start_course(current.user.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `POST /courses/{id}/progress`
///
/// Reaching 100% completes the course and awards its XP.
pub async fn progress<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<ProgressBody>,
) -> Result<Json<Progress<UserCourse>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let transition = state
    .store
    .record_course_progress(user_id, id, body.percent)
    .await
    .map_err(ApiError::store)?;
  if !transition.newly_completed {
    return Ok(Json(Progress::new(transition, None)));
  }

  let course = state
    .store
    .get_course(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("course {id} not found")))?;
  let achievement =
    grant_completion(&state, user_id, ContentKind::Course, id, course.xp_reward).await?;
  Ok(Json(Progress::new(transition, Some(achievement))))
}
