//! Accounts and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PEN_NAME_CHARS: usize = 40;

/// A registered user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub pen_name:   String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_user`]. The password has
/// already been hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub pen_name:      String,
  pub password_hash: String,
}

impl NewUser {
  /// Normalise and validate registration input.
  pub fn new(
    email: &str,
    pen_name: &str,
    password_hash: String,
  ) -> Result<Self> {
    let email = normalize_email(email);
    if !is_plausible_email(&email) {
      return Err(Error::Invalid(format!("not an email address: {email:?}")));
    }
    let pen_name = pen_name.trim();
    if pen_name.is_empty() || pen_name.chars().count() > MAX_PEN_NAME_CHARS {
      return Err(Error::Invalid(format!(
        "pen name must be 1-{MAX_PEN_NAME_CHARS} characters"
      )));
    }
    Ok(Self { email, pen_name: pen_name.to_owned(), password_hash })
  }
}

/// A user together with the stored password hash; only used at login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  /// PHC string produced by argon2.
  pub password_hash: String,
}

/// A bearer session. Only the digest of the token is ever stored.
#[derive(Debug, Clone)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn is_plausible_email(email: &str) -> bool {
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
    }
    None => false,
  }
}

pub fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_CHARS {
    return Err(Error::Invalid(format!(
      "password must be at least {MIN_PASSWORD_CHARS} characters"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_is_normalised() {
    let user = NewUser::new("  Ada@Example.COM ", "ada", "hash".into()).unwrap();
    assert_eq!(user.email, "ada@example.com");
  }

  #[test]
  fn rejects_bad_email_and_pen_name() {
    assert!(NewUser::new("not-an-email", "ada", "h".into()).is_err());
    assert!(NewUser::new("a@b", "ada", "h".into()).is_err());
    assert!(NewUser::new("ada@example.com", "   ", "h".into()).is_err());
    let long = "x".repeat(MAX_PEN_NAME_CHARS + 1);
    assert!(NewUser::new("ada@example.com", &long, "h".into()).is_err());
  }

  #[test]
  fn short_passwords_are_rejected() {
    assert!(validate_password("short").is_err());
    assert!(validate_password("long enough").is_ok());
  }
}
