//! Handlers for `/messages` endpoints. All require a session.
//!
//! Content is stored exactly as sent; length and blank checks belong to the
//! composer (see [`questline_core::message::validate_outgoing`]).

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questline_core::{
  message::{ConversationSummary, Message, NewMessage},
  store::Store,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
  pub receiver_id: Uuid,
  pub content:     String,
}

/// `POST /messages`
pub async fn send<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + 'static,
{
  let message = state
    .store
    .send_message(NewMessage {
      sender_id:   current.user.id,
      receiver_id: body.receiver_id,
      content:     body.content,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(message_id = %message.id, sender_id = %message.sender_id, "message sent");
  Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /messages/conversations`
pub async fn conversations<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError>
where
  S: Store + 'static,
{
  let summaries = state
    .store
    .conversations(current.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summaries))
}

/// `GET /messages/{user_id}`
///
/// Reading a thread marks the partner's messages to the caller as read.
pub async fn thread<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  Path(partner_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: Store + 'static,
{
  let user_id = current.user.id;
  state
    .store
    .mark_conversation_read(user_id, partner_id)
    .await
    .map_err(ApiError::store)?;
  let messages = state
    .store
    .conversation(user_id, partner_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}
