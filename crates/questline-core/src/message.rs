//! Direct messages between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Longest message the composer accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
  pub id:          Uuid,
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub content:     String,
  /// Flips false → true only.
  pub is_read:     bool,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub content:     String,
}

/// One row of the conversation list: the other party, the latest message in
/// either direction and how many of theirs are still unread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
  pub partner_id:       Uuid,
  pub partner_pen_name: String,
  pub last_message:     Message,
  pub unread_count:     u32,
}

/// Composer-side check run before a message is sent.
///
/// The HTTP API accepts any string; this is the rule the web client applies
/// before it ever calls the API. Returns the trimmed content.
pub fn validate_outgoing(content: &str) -> Result<&str> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid("message must not be empty".into()));
  }
  if trimmed.chars().count() > MAX_MESSAGE_CHARS {
    return Err(Error::Invalid(format!(
      "message must be at most {MAX_MESSAGE_CHARS} characters"
    )));
  }
  Ok(trimmed)
}
