//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"error": <message>, "code": <code>}`.
//! Debug builds add a `detail` field carrying the full source chain.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use questline_core::{DomainError, ErrorKind};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::provider::ProviderError;

/// Machine-readable error category sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
  Network,
  Auth,
  Validation,
  Server,
  Unknown,
  NotFound,
  Conflict,
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Not authenticated")]
  Unauthorized,

  #[error("Invalid email or password")]
  InvalidCredentials,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("AI provider error: {0}")]
  Upstream(#[from] ProviderError),

  #[error("unavailable: {0}")]
  Unavailable(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error to a response, surfacing any domain error it wraps.
  pub fn store<E: DomainError>(e: E) -> Self {
    let mapped = e
      .domain()
      .and_then(|domain| Self::from_domain(domain.kind(), domain.to_string()));
    mapped.unwrap_or_else(|| Self::Store(Box::new(e)))
  }

  fn from_domain(kind: ErrorKind, message: String) -> Option<Self> {
    match kind {
      ErrorKind::NotFound => Some(Self::NotFound(message)),
      ErrorKind::Conflict => Some(Self::Conflict(message)),
      ErrorKind::Validation => Some(Self::BadRequest(message)),
      ErrorKind::Internal => None,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Upstream(_) => StatusCode::BAD_GATEWAY,
      Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Internal(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Unauthorized | Self::InvalidCredentials => ErrorCode::Auth,
      Self::NotFound(_) => ErrorCode::NotFound,
      Self::BadRequest(_) => ErrorCode::Validation,
      Self::Conflict(_) => ErrorCode::Conflict,
      Self::Upstream(_) => ErrorCode::Network,
      Self::Unavailable(_) | Self::Store(_) => ErrorCode::Server,
      Self::Internal(_) => ErrorCode::Unknown,
    }
  }

  /// The message shown to clients. Server-side faults are not described.
  fn public_message(&self) -> String {
    match self {
      Self::NotFound(m) | Self::BadRequest(m) | Self::Conflict(m) | Self::Unavailable(m) => {
        m.clone()
      }
      Self::Upstream(_) => "AI provider request failed".into(),
      Self::Internal(_) | Self::Store(_) => "Internal server error".into(),
      Self::Unauthorized | Self::InvalidCredentials => self.to_string(),
    }
  }

  fn chain(&self) -> String {
    let mut out = self.to_string();
    let mut source = std::error::Error::source(self);
    while let Some(e) = source {
      out.push_str(": ");
      out.push_str(&e.to_string());
      source = e.source();
    }
    out
  }
}

/// Domain errors raised directly by handlers (validation before a store call).
impl From<questline_core::Error> for ApiError {
  fn from(e: questline_core::Error) -> Self {
    let message = e.to_string();
    Self::from_domain(e.kind(), message).unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self.chain(), "request failed");
    }

    let mut body = json!({ "error": self.public_message(), "code": self.code() });
    if cfg!(debug_assertions) {
      body["detail"] = json!(self.chain());
    }
    (status, Json(body)).into_response()
  }
}
