//! Handlers for `/challenges` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/challenges?arenaId&difficulty` | Cached |
//! | `GET`  | `/challenges/mine` | Caller's records |
//! | `GET`  | `/challenges/{id}` | Cached |
//! | `POST` | `/challenges/{id}/start` | Idempotent |
//! | `POST` | `/challenges/{id}/submit` | `{code, score}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use questline_core::{
  activity::{ContentKind, Submission, UserChallenge},
  catalog::{Challenge, ChallengeFilter},
  progression::FIRST_CHALLENGE_BADGE,
  store::Store,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  rewards::{Achievement, Progress, grant_completion},
};

async fn cached_list<S>(
  state: &AppState<S>,
  filter: ChallengeFilter,
) -> Result<Vec<Challenge>, ApiError>
where
  S: Store + 'static,
{
  let store = &state.store;
  state
    .cache
    .challenges
    .get_or_try_insert_with(filter.clone(), || store.list_challenges(&filter))
    .await
    .map_err(ApiError::store)
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// `GET /challenges`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(filter): Query<ChallengeFilter>,
) -> Result<Json<Vec<Challenge>>, ApiError>
where
  S: Store + 'static,
{
  Ok(Json(cached_list(&state, filter).await?))
}

/// `GET /challenges/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Challenge>, ApiError>
where
  S: Store + 'static,
{
  cached_list(&state, ChallengeFilter::default())
    .await?
    .into_iter()
    .find(|c| c.id == id)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("challenge {id} not found")))
}

// ─── Caller's records ────────────────────────────────────────────────────────

/// `GET /challenges/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<UserChallenge>>, ApiError>
where
  S: Store + 'static,
{
  let records = state
    .store
    .list_user_challenges(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /challenges/{id}/start`
pub async fn start<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UserChallenge>, ApiError>
where
  S: Store + 'static,
{
  let record = state
    .store
    .start_challenge(current.user.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(record))
}

/// `POST /challenges/{id}/submit`
///
/// A passing score completes the challenge exactly once; that call carries
/// the `achievement` block.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<Submission>,
) -> Result<Json<Progress<UserChallenge>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let transition = state
    .store
    .submit_challenge(user_id, id, body)
    .await
    .map_err(ApiError::store)?;

  let achievement = if transition.newly_completed {
    Some(reward_challenge(&state, user_id, id).await?)
  } else {
    None
  };
  Ok(Json(Progress::new(transition, achievement)))
}

async fn reward_challenge<S>(
  state: &AppState<S>,
  user_id: Uuid,
  challenge_id: Uuid,
) -> Result<Achievement, ApiError>
where
  S: Store + 'static,
{
  let challenge = state
    .store
    .get_challenge(challenge_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("challenge {challenge_id} not found")))?;

  // Racing completions can both observe a count above one, so award on any
  // completion; the store ignores a badge the user already holds.
  let completed = state
    .store
    .completed_challenge_count(user_id)
    .await
    .map_err(ApiError::store)?;
  if completed >= 1 {
    state
      .store
      .award_badge(user_id, FIRST_CHALLENGE_BADGE)
      .await
      .map_err(ApiError::store)?;
  }

  grant_completion(state, user_id, ContentKind::Challenge, challenge_id, challenge.xp_reward).await
}
