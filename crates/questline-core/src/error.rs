//! Error types for `questline-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::activity::ContentKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("profile not found for user {0}")]
  ProfileNotFound(Uuid),

  #[error("{kind} not found: {id}")]
  ContentNotFound { kind: ContentKind, id: Uuid },

  #[error("{kind} {id} has not been started")]
  NotStarted { kind: ContentKind, id: Uuid },

  #[error("{kind} {id} is already completed")]
  AlreadyCompleted { kind: ContentKind, id: Uuid },

  #[error("email is already registered: {0}")]
  EmailTaken(String),

  #[error("clan not found: {0}")]
  ClanNotFound(Uuid),

  #[error("clan name is already taken: {0}")]
  ClanNameTaken(String),

  #[error("clan {clan_id} is full ({max_members} members)")]
  ClanFull { clan_id: Uuid, max_members: u32 },

  #[error("user {user_id} is already a member of clan {clan_id}")]
  AlreadyMember { clan_id: Uuid, user_id: Uuid },

  #[error("invalid score {0}: must be between 0 and 100")]
  InvalidScore(u32),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by outer layers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Validation,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_)
      | Self::ProfileNotFound(_)
      | Self::ContentNotFound { .. }
      | Self::ClanNotFound(_) => ErrorKind::NotFound,
      Self::NotStarted { .. }
      | Self::AlreadyCompleted { .. }
      | Self::EmailTaken(_)
      | Self::ClanNameTaken(_)
      | Self::ClanFull { .. }
      | Self::AlreadyMember { .. } => ErrorKind::Conflict,
      Self::InvalidScore(_) | Self::Invalid(_) => ErrorKind::Validation,
      Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

/// A backend error that may carry a domain-level [`Error`].
///
/// Store implementations wrap domain failures (a full clan, a completed
/// challenge) inside their own error type; this trait lets the API layer get
/// them back out without knowing the concrete backend.
pub trait DomainError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
