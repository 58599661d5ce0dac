//! Users and bearer sessions.

use chrono::{DateTime, Utc};
use questline_core::{
  store::AccountStore,
  user::{Credentials, NewUser, Session, User, normalize_email},
};
use rusqlite::{OptionalExtension as _, params};
use uuid::Uuid;

use super::SqliteStore;
use crate::{
  Result,
  encode::{RawUser, USER_COLUMNS, encode_dt, encode_uuid},
};

impl AccountStore for SqliteStore {
  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      email:      input.email,
      pen_name:   input.pen_name,
      created_at: self.clock.now(),
    };
    let row = user.clone();
    let password_hash = input.password_hash;

    self
      .write(move |conn| {
        let taken: bool = conn
          .query_row("SELECT 1 FROM users WHERE email = ?1", params![row.email], |_| {
            Ok(true)
          })
          .optional()?
          .unwrap_or(false);
        if taken {
          return Err(questline_core::Error::EmailTaken(row.email).into());
        }

        conn.execute(
          "INSERT INTO users (user_id, email, pen_name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            encode_uuid(row.id),
            row.email,
            row.pen_name,
            password_hash,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(user_id = %user.id, "registered user");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    self
      .read(move |conn| {
        conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![id_str],
            RawUser::from_row,
          )
          .optional()?
          .map(RawUser::into_user)
          .transpose()
      })
      .await
  }

  async fn find_credentials<'a>(&'a self, email: &'a str) -> Result<Option<Credentials>> {
    let email = normalize_email(email);
    self
      .read(move |conn| {
        let row = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            params![email],
            |row| Ok((RawUser::from_row(row)?, row.get::<_, String>(4)?)),
          )
          .optional()?;

        row
          .map(|(raw, password_hash)| {
            Ok(Credentials { user: raw.into_user()?, password_hash })
          })
          .transpose()
      })
      .await
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            session.token_hash,
            encode_uuid(session.user_id),
            encode_dt(session.created_at),
            encode_dt(session.expires_at),
          ],
        )?;
        Ok(())
      })
      .await
  }

  async fn session_user<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> Result<Option<User>> {
    let token_hash = token_hash.to_owned();
    let now_str = encode_dt(now);
    self
      .read(move |conn| {
        conn
          .query_row(
            "SELECT u.user_id, u.email, u.pen_name, u.created_at
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token_hash = ?1 AND s.expires_at > ?2",
            params![token_hash, now_str],
            RawUser::from_row,
          )
          .optional()?
          .map(RawUser::into_user)
          .transpose()
      })
      .await
  }

  async fn revoke_session<'a>(&'a self, token_hash: &'a str) -> Result<bool> {
    let token_hash = token_hash.to_owned();
    self
      .write(move |conn| {
        let n = conn.execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])?;
        Ok(n > 0)
      })
      .await
  }
}
