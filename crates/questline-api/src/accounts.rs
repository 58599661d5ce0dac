//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"email","penName","password"}`; 201 `{user, token}` |
//! | `POST` | `/auth/login` | Body: `{"email","password"}`; `{user, token}` |
//! | `POST` | `/auth/logout` | Revokes the presented token; 204 |
//! | `GET`  | `/auth/user` | The current user, or 401 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use questline_core::{
  store::Store,
  user::{NewUser, User, validate_password},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{CurrentUser, hash_password, issue_session, verify_password},
  error::ApiError,
};

#[derive(Debug, Serialize)]
pub struct SessionResponse {
  pub user:  User,
  pub token: String,
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
  pub email:    String,
  pub pen_name: String,
  pub password: String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  validate_password(&body.password)?;
  let password_hash = hash_password(&body.password)?;
  let input = NewUser::new(&body.email, &body.pen_name, password_hash)?;

  let user = state.store.create_user(input).await.map_err(ApiError::store)?;
  state.store.ensure_profile(user.id).await.map_err(ApiError::store)?;
  let token = issue_session(&state, user.id).await?;

  tracing::info!(user_id = %user.id, "user registered");
  Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<SessionResponse>, ApiError>
where
  S: Store + 'static,
{
  let credentials = state
    .store
    .find_credentials(&body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::InvalidCredentials)?;

  if !verify_password(&body.password, &credentials.password_hash) {
    tracing::info!(user_id = %credentials.user.id, "login rejected");
    return Err(ApiError::InvalidCredentials);
  }

  let token = issue_session(&state, credentials.user.id).await?;
  Ok(Json(SessionResponse { user: credentials.user, token }))
}

// ─── Logout / current user ───────────────────────────────────────────────────

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<StatusCode, ApiError>
where
  S: Store + 'static,
{
  state
    .store
    .revoke_session(&current.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/user`
pub async fn current<S>(current: CurrentUser) -> Json<User>
where
  S: Store + 'static,
{
  Json(current.user)
}
