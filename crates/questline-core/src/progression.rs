//! Progression rules: XP → level, level → tier, daily streaks, and the
//! outcome of applying an XP award.
//!
//! Everything here is pure. The store applies these rules inside the same
//! transaction that changes the XP column.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

use crate::{activity::ContentKind, profile::UserProfile};

/// XP required per level.
pub const XP_PER_LEVEL: u64 = 1000;

/// Badge appended the first time a user completes any challenge.
pub const FIRST_CHALLENGE_BADGE: &str = "first-challenge";

/// `floor(xp / 1000) + 1`. Level 1 starts at zero XP.
pub fn level_for_xp(xp: u64) -> u64 { xp / XP_PER_LEVEL + 1 }

/// XP still needed to reach the next level.
pub fn xp_to_next_level(xp: u64) -> u64 { XP_PER_LEVEL - xp % XP_PER_LEVEL }

/// Apply a signed delta to an XP total, flooring at zero.
pub fn apply_xp_delta(xp: u64, amount: i64) -> u64 {
  if amount >= 0 {
    xp.saturating_add(amount.unsigned_abs())
  } else {
    xp.saturating_sub(amount.unsigned_abs())
  }
}

// ─── Tiers ───────────────────────────────────────────────────────────────────

/// Coarse skill label. Ordered: a later variant is a higher tier.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TechTier {
  #[default]
  Beginner,
  Explorer,
  Builder,
  Expert,
  Master,
  Legend,
}

impl TechTier {
  /// The lowest level at which this tier is earned.
  pub fn min_level(self) -> u64 {
    match self {
      Self::Beginner => 1,
      Self::Explorer => 3,
      Self::Builder => 6,
      Self::Expert => 10,
      Self::Master => 15,
      Self::Legend => 25,
    }
  }

  /// The highest tier whose threshold `level` meets.
  pub fn for_level(level: u64) -> Self {
    Self::iter()
      .rev()
      .find(|tier| level >= tier.min_level())
      .unwrap_or_default()
  }

  /// Badge recorded when a user is promoted into this tier.
  pub fn badge(self) -> String { format!("tier:{self}") }
}

/// The tier a user should be promoted to at `level`, if any. Tiers never
/// demote: a tier chosen during onboarding above the earned one is kept.
pub fn promotion(current: TechTier, level: u64) -> Option<TechTier> {
  let earned = TechTier::for_level(level);
  (earned > current).then_some(earned)
}

// ─── Streaks ─────────────────────────────────────────────────────────────────

/// The streak after recording activity on `today`.
///
/// Consecutive days extend the streak, repeat activity on the same day leaves
/// it alone, and any gap starts over at one.
pub fn advance_streak(
  current: u32,
  last_active_on: Option<NaiveDate>,
  today: NaiveDate,
) -> u32 {
  match last_active_on {
    Some(last) if last == today => current.max(1),
    Some(last) if last > today => current,
    Some(last) if last.succ_opt() == Some(today) => current.saturating_add(1),
    _ => 1,
  }
}

// ─── Awards ──────────────────────────────────────────────────────────────────

/// Where an XP award came from; recorded in the XP ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XpSource {
  Content { content: ContentKind, id: Uuid },
  Bonus,
}

/// The result of an applied XP award.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardOutcome {
  /// The profile after the award, tier promotion and badge included.
  pub profile:        UserProfile,
  /// The XP delta actually applied (differs from the request only when a
  /// negative award hit the zero floor).
  pub applied:        i64,
  pub previous_level: u64,
  pub promoted_to:    Option<TechTier>,
}

impl RewardOutcome {
  pub fn leveled_up(&self) -> bool { self.profile.level > self.previous_level }
}

/// Outcome of [`crate::store::ProfileStore::add_xp`]. A missing profile is a
/// normal outcome, not an error; callers decide what it means for them.
#[derive(Debug, Clone)]
pub enum XpAward {
  Applied(Box<RewardOutcome>),
  ProfileMissing,
}

impl XpAward {
  pub fn applied(self) -> Option<RewardOutcome> {
    match self {
      Self::Applied(outcome) => Some(*outcome),
      Self::ProfileMissing => None,
    }
  }
}
