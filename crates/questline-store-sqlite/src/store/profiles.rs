//! Profiles and the progression writes: XP awards, streaks and badges.

use chrono::{DateTime, NaiveDate, Utc};
use questline_core::{
  Error as CoreError,
  profile::{Onboarding, ProfileUpdate, UserProfile},
  progression::{RewardOutcome, XpAward, XpSource, advance_streak, level_for_xp, promotion},
  store::ProfileStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use super::SqliteStore;
use crate::{
  Result,
  encode::{PROFILE_COLUMNS, RawProfile, decode_int, encode_date, encode_dt, encode_json, encode_uuid},
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

pub(super) fn load_profile(conn: &Connection, user_id: Uuid) -> Result<Option<UserProfile>> {
  conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?1"),
      params![encode_uuid(user_id)],
      RawProfile::from_row,
    )
    .optional()?
    .map(RawProfile::into_profile)
    .transpose()
}

pub(super) fn user_exists(conn: &Connection, user_id: Uuid) -> Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE user_id = ?1", params![encode_uuid(user_id)], |_| {
        Ok(true)
      })
      .optional()?
      .unwrap_or(false),
  )
}

/// Load the profile for `user_id`, creating a default one if the user exists
/// but has none yet.
fn load_or_create_profile(
  conn: &Connection,
  user_id: Uuid,
  now: DateTime<Utc>,
) -> Result<UserProfile> {
  if let Some(profile) = load_profile(conn, user_id)? {
    return Ok(profile);
  }
  if !user_exists(conn, user_id)? {
    return Err(CoreError::UserNotFound(user_id).into());
  }

  let profile = UserProfile::new(user_id, now);
  conn.execute(
    "INSERT INTO user_profiles (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
    params![encode_uuid(user_id), encode_dt(now)],
  )?;
  tracing::debug!(%user_id, "created profile");
  Ok(profile)
}

/// Write every profile column except `xp`, which only ever changes through
/// the atomic increment in [`ProfileStore::add_xp`].
fn save_profile(conn: &Connection, profile: &UserProfile) -> Result<()> {
  conn.execute(
    "UPDATE user_profiles SET
       daily_streak        = ?2,
       last_active_on      = ?3,
       tech_tier           = ?4,
       interests           = ?5,
       badges              = ?6,
       learning_pace       = ?7,
       learning_style      = ?8,
       bio                 = ?9,
       onboarding_complete = ?10,
       updated_at          = ?11
     WHERE user_id = ?1",
    params![
      encode_uuid(profile.user_id),
      profile.daily_streak,
      profile.last_active_on.map(encode_date),
      profile.tech_tier.as_ref(),
      encode_json(&profile.interests)?,
      encode_json(&profile.badges)?,
      profile.learning_pace,
      profile.learning_style,
      profile.bio,
      profile.onboarding_complete,
      encode_dt(profile.updated_at),
    ],
  )?;
  Ok(())
}

fn source_columns(source: XpSource) -> (String, Option<String>) {
  match source {
    XpSource::Content { content, id } => (content.as_ref().to_owned(), Some(encode_uuid(id))),
    XpSource::Bonus => ("bonus".to_owned(), None),
  }
}

// ─── ProfileStore ────────────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
    self.read(move |conn| load_profile(conn, user_id)).await
  }

  async fn ensure_profile(&self, user_id: Uuid) -> Result<UserProfile> {
    let now = self.clock.now();
    self
      .write(move |conn| load_or_create_profile(conn, user_id, now))
      .await
  }

  async fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> Result<Option<UserProfile>> {
    update.validate()?;
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(mut profile) = load_profile(conn, user_id)? else {
          return Ok(None);
        };
        update.apply_to(&mut profile);
        profile.updated_at = now;
        save_profile(conn, &profile)?;
        Ok(Some(profile))
      })
      .await
  }

  async fn complete_onboarding(
    &self,
    user_id: Uuid,
    onboarding: Onboarding,
  ) -> Result<UserProfile> {
    onboarding.validate()?;
    let now = self.clock.now();
    self
      .write(move |conn| {
        let mut profile = load_or_create_profile(conn, user_id, now)?;
        onboarding.apply_to(&mut profile);
        profile.updated_at = now;
        save_profile(conn, &profile)?;
        Ok(profile)
      })
      .await
  }

  async fn add_xp(&self, user_id: Uuid, amount: i64, source: XpSource) -> Result<XpAward> {
    let now = self.clock.now();
    let outcome = self
      .write(move |conn| {
        let Some(before) = load_profile(conn, user_id)? else {
          return Ok(XpAward::ProfileMissing);
        };
        let id_str = encode_uuid(user_id);

        conn.execute(
          "UPDATE user_profiles SET xp = MAX(0, xp + ?2) WHERE user_id = ?1",
          params![id_str, amount],
        )?;
        let xp: i64 = conn.query_row(
          "SELECT xp FROM user_profiles WHERE user_id = ?1",
          params![id_str],
          |r| r.get(0),
        )?;
        let xp: u64 = decode_int(xp, "xp")?;
        let applied = xp as i64 - before.xp as i64;

        if applied != 0 {
          let (kind, source_id) = source_columns(source);
          conn.execute(
            "INSERT INTO xp_ledger (entry_id, user_id, amount, source_kind, source_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
              encode_uuid(Uuid::new_v4()),
              id_str,
              applied,
              kind,
              source_id,
              encode_dt(now),
            ],
          )?;
        }

        let previous_level = before.level;
        let mut profile = before;
        profile.xp = xp;
        profile.level = level_for_xp(xp);
        profile.updated_at = now;

        let promoted_to = promotion(profile.tech_tier, profile.level);
        if let Some(tier) = promoted_to {
          profile.tech_tier = tier;
          let badge = tier.badge();
          if !profile.has_badge(&badge) {
            profile.badges.push(badge);
          }
        }
        save_profile(conn, &profile)?;

        Ok(XpAward::Applied(Box::new(RewardOutcome {
          profile,
          applied,
          previous_level,
          promoted_to,
        })))
      })
      .await?;

    match &outcome {
      XpAward::Applied(o) => tracing::debug!(
        %user_id,
        applied = o.applied,
        level = o.profile.level,
        promoted_to = ?o.promoted_to,
        "xp awarded"
      ),
      XpAward::ProfileMissing => tracing::debug!(%user_id, "xp award skipped: no profile"),
    }
    Ok(outcome)
  }

  async fn record_activity(
    &self,
    user_id: Uuid,
    today: NaiveDate,
  ) -> Result<Option<UserProfile>> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(mut profile) = load_profile(conn, user_id)? else {
          return Ok(None);
        };
        profile.daily_streak = advance_streak(profile.daily_streak, profile.last_active_on, today);
        profile.last_active_on = Some(profile.last_active_on.map_or(today, |last| last.max(today)));
        profile.updated_at = now;
        save_profile(conn, &profile)?;
        Ok(Some(profile))
      })
      .await
  }

  async fn award_badge<'a>(
    &'a self,
    user_id: Uuid,
    badge: &'a str,
  ) -> Result<Option<UserProfile>> {
    let badge = badge.to_owned();
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(mut profile) = load_profile(conn, user_id)? else {
          return Ok(None);
        };
        if !profile.has_badge(&badge) {
          profile.badges.push(badge);
          profile.updated_at = now;
          save_profile(conn, &profile)?;
        }
        Ok(Some(profile))
      })
      .await
  }
}
