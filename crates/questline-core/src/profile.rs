//! Per-user profile and the inputs that edit it.
//!
//! `level` is never stored. Backends fill it from `xp` with
//! [`level_for_xp`](crate::progression::level_for_xp) every time a profile is
//! read, so the two can never disagree.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  progression::{TechTier, level_for_xp},
};

pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_INTERESTS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub user_id:             Uuid,
  pub xp:                  u64,
  /// Derived from `xp`; see the module docs.
  pub level:               u64,
  pub daily_streak:        u32,
  pub last_active_on:      Option<NaiveDate>,
  pub tech_tier:           TechTier,
  pub interests:           BTreeSet<String>,
  /// Append-only, in award order.
  pub badges:              Vec<String>,
  pub learning_pace:       Option<String>,
  pub learning_style:      Option<String>,
  pub bio:                 Option<String>,
  pub onboarding_complete: bool,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl UserProfile {
  /// A brand-new profile for `user_id`.
  pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      xp: 0,
      level: level_for_xp(0),
      daily_streak: 0,
      last_active_on: None,
      tech_tier: TechTier::default(),
      interests: BTreeSet::new(),
      badges: Vec::new(),
      learning_pace: None,
      learning_style: None,
      bio: None,
      onboarding_complete: false,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn has_badge(&self, badge: &str) -> bool {
    self.badges.iter().any(|b| b == badge)
  }
}

/// Body of `PATCH /api/profile`. Progression fields (XP, tier, badges,
/// streak) are deliberately absent; they only change through rewards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  pub bio:            Option<String>,
  pub interests:      Option<BTreeSet<String>>,
  pub learning_pace:  Option<String>,
  pub learning_style: Option<String>,
}

impl ProfileUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(bio) = &self.bio
      && bio.chars().count() > MAX_BIO_CHARS
    {
      return Err(Error::Invalid(format!(
        "bio must be at most {MAX_BIO_CHARS} characters"
      )));
    }
    if let Some(interests) = &self.interests {
      validate_interests(interests)?;
    }
    Ok(())
  }

  /// Overwrite the fields present in this update.
  pub fn apply_to(self, profile: &mut UserProfile) {
    if let Some(bio) = self.bio {
      profile.bio = Some(bio);
    }
    if let Some(interests) = self.interests {
      profile.interests = normalize_interests(interests);
    }
    if let Some(pace) = self.learning_pace {
      profile.learning_pace = Some(pace);
    }
    if let Some(style) = self.learning_style {
      profile.learning_style = Some(style);
    }
  }
}

/// Body of `POST /api/profile/onboarding`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Onboarding {
  pub interests:      BTreeSet<String>,
  pub learning_pace:  String,
  pub learning_style: String,
  /// Self-assessed starting tier. Never lowers a tier already held.
  #[serde(default)]
  pub tech_tier:      TechTier,
}

impl Onboarding {
  pub fn validate(&self) -> Result<()> {
    if self.interests.is_empty() {
      return Err(Error::Invalid("pick at least one interest".into()));
    }
    validate_interests(&self.interests)
  }

  pub fn apply_to(self, profile: &mut UserProfile) {
    profile.interests = normalize_interests(self.interests);
    profile.learning_pace = Some(self.learning_pace);
    profile.learning_style = Some(self.learning_style);
    profile.tech_tier = profile.tech_tier.max(self.tech_tier);
    profile.onboarding_complete = true;
  }
}

fn validate_interests(interests: &BTreeSet<String>) -> Result<()> {
  if interests.len() > MAX_INTERESTS {
    return Err(Error::Invalid(format!(
      "at most {MAX_INTERESTS} interests are allowed"
    )));
  }
  Ok(())
}

fn normalize_interests(interests: BTreeSet<String>) -> BTreeSet<String> {
  interests
    .into_iter()
    .map(|i| i.trim().to_lowercase())
    .filter(|i| !i.is_empty())
    .collect()
}
