//! Handlers for `/clans` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/clans` | |
//! | `POST` | `/clans` | Caller becomes leader |
//! | `GET`  | `/clans/{id}` | Includes members |
//! | `POST` | `/clans/{id}/join` | 409 when full or already a member |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questline_core::{
  DomainError, Error,
  clan::{Clan, ClanDetail, ClanMember, NewClan},
  store::Store,
};
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// `GET /clans`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Clan>>, ApiError>
where
  S: Store + 'static,
{
  let clans = state.store.list_clans().await.map_err(ApiError::store)?;
  Ok(Json(clans))
}

/// `GET /clans/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ClanDetail>, ApiError>
where
  S: Store + 'static,
{
  state
    .store
    .get_clan(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("clan {id} not found")))
}

/// `POST /clans`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<NewClan>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let clan = state
    .store
    .create_clan(current.user.id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(clan_id = %clan.id, owner_id = %clan.owner_id, name = %clan.name, "clan created");
  Ok((StatusCode::CREATED, Json(clan)))
}

/// `POST /clans/{id}/join`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ClanMember>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  let member = state.store.join_clan(id, user_id).await.map_err(|e| {
    if let Some(Error::ClanFull { max_members, .. }) = e.domain() {
      tracing::info!(clan_id = %id, %user_id, max_members, "join rejected: clan is full");
    }
    ApiError::store(e)
  })?;
  Ok(Json(member))
}
