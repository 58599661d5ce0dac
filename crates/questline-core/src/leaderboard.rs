//! Leaderboard query and entry types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progression::TechTier;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardCategory {
  /// XP earned in the period (lifetime XP for all-time).
  #[default]
  Xp,
  /// Challenges completed in the period.
  Challenges,
  /// Current daily streak; the period is ignored.
  Streak,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
  #[default]
  AllTime,
  Monthly,
  Weekly,
}

impl LeaderboardPeriod {
  /// Start of the rolling window ending at `now`, or `None` for all time.
  pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match self {
      Self::AllTime => None,
      Self::Monthly => Some(now - Duration::days(30)),
      Self::Weekly => Some(now - Duration::days(7)),
    }
  }
}

/// A resolved query; `since` has already been computed from the period.
#[derive(Debug, Clone)]
pub struct LeaderboardQuery {
  pub category: LeaderboardCategory,
  pub since:    Option<DateTime<Utc>>,
  pub limit:    usize,
}

impl LeaderboardQuery {
  pub fn new(
    category: LeaderboardCategory,
    period: LeaderboardPeriod,
    limit: Option<usize>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      category,
      since: period.since(now),
      limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
  /// 1-based.
  pub rank:      u32,
  pub user_id:   Uuid,
  pub pen_name:  String,
  pub score:     u64,
  pub level:     u64,
  pub tech_tier: TechTier,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn limit_is_clamped() {
    let now = Utc::now();
    let q = |limit| {
      LeaderboardQuery::new(LeaderboardCategory::Xp, LeaderboardPeriod::AllTime, limit, now)
        .limit
    };
    assert_eq!(q(None), DEFAULT_LIMIT);
    assert_eq!(q(Some(0)), 1);
    assert_eq!(q(Some(10_000)), MAX_LIMIT);
  }

  #[test]
  fn periods_are_rolling_windows() {
    let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
    assert_eq!(LeaderboardPeriod::AllTime.since(now), None);
    assert_eq!(
      LeaderboardPeriod::Weekly.since(now),
      Some(Utc.with_ymd_and_hms(2024, 6, 23, 12, 0, 0).unwrap())
    );
  }
}
