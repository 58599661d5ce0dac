//! Activity trackers: one record per (user, content) pair.
//!
//! A pair with no record is "not assigned". Starting creates the record in
//! [`ActivityStatus::InProgress`]; completion moves it to
//! [`ActivityStatus::Completed`], which is terminal. The transition methods
//! here are pure; the store runs them inside a transaction and persists the
//! result.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Minimum score that completes a challenge.
pub const PASSING_SCORE: u32 = 70;
pub const MAX_SCORE: u32 = 100;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentKind {
  Challenge,
  Quest,
  Course,
  Roadmap,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityStatus {
  InProgress,
  Completed,
}

impl ActivityStatus {
  pub fn is_completed(self) -> bool { self == Self::Completed }
}

/// A record after a transition, and whether this call is the one that
/// completed it. Callers award XP only when `newly_completed` is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition<T> {
  pub record:          T,
  pub newly_completed: bool,
}

// ─── Challenges ──────────────────────────────────────────────────────────────

/// Body of `POST /api/challenges/{id}/submit`.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
  pub code:  String,
  pub score: u32,
}

pub fn validate_score(score: u32) -> Result<u32> {
  if score > MAX_SCORE {
    return Err(Error::InvalidScore(score));
  }
  Ok(score)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChallenge {
  pub user_id:      Uuid,
  pub challenge_id: Uuid,
  pub status:       ActivityStatus,
  pub attempts:     u32,
  pub best_score:   Option<u32>,
  pub last_score:   Option<u32>,
  pub last_code:    Option<String>,
  pub started_at:   DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl UserChallenge {
  pub fn start(user_id: Uuid, challenge_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      challenge_id,
      status: ActivityStatus::InProgress,
      attempts: 0,
      best_score: None,
      last_score: None,
      last_code: None,
      started_at: now,
      completed_at: None,
    }
  }

  /// Record an attempt. A passing score completes the challenge; a failing
  /// one leaves it in progress so it can be attempted again.
  pub fn submit(
    &mut self,
    submission: Submission,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    if self.status.is_completed() {
      return Err(Error::AlreadyCompleted {
        kind: ContentKind::Challenge,
        id:   self.challenge_id,
      });
    }
    let score = validate_score(submission.score)?;

    self.attempts += 1;
    self.last_score = Some(score);
    self.best_score = Some(self.best_score.map_or(score, |b| b.max(score)));
    self.last_code = Some(submission.code);

    if score >= PASSING_SCORE {
      self.status = ActivityStatus::Completed;
      self.completed_at = Some(now);
      return Ok(true);
    }
    Ok(false)
  }
}

// ─── Quests ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuest {
  pub user_id:      Uuid,
  pub quest_id:     Uuid,
  pub status:       ActivityStatus,
  pub progress:     u32,
  /// Copied from the quest at assignment.
  pub target:       u32,
  pub assigned_at:  DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl UserQuest {
  pub fn assign(
    user_id: Uuid,
    quest_id: Uuid,
    target: u32,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      user_id,
      quest_id,
      status: ActivityStatus::InProgress,
      progress: 0,
      target,
      assigned_at: now,
      completed_at: None,
    }
  }

  fn ensure_open(&self) -> Result<()> {
    if self.status.is_completed() {
      return Err(Error::AlreadyCompleted {
        kind: ContentKind::Quest,
        id:   self.quest_id,
      });
    }
    Ok(())
  }

  /// Add `delta` towards the target, capped at it. Reaching the target
  /// completes the quest.
  pub fn record_progress(&mut self, delta: u32, now: DateTime<Utc>) -> Result<bool> {
    self.ensure_open()?;
    if delta == 0 {
      return Err(Error::Invalid("progress delta must be positive".into()));
    }
    self.progress = self.progress.saturating_add(delta).min(self.target);
    if self.progress >= self.target {
      self.status = ActivityStatus::Completed;
      self.completed_at = Some(now);
      return Ok(true);
    }
    Ok(false)
  }

  /// Explicit completion; only allowed once the target is met.
  pub fn complete(&mut self, now: DateTime<Utc>) -> Result<bool> {
    self.ensure_open()?;
    if self.progress < self.target {
      return Err(Error::Invalid(format!(
        "quest progress {}/{} has not reached its target",
        self.progress, self.target
      )));
    }
    self.status = ActivityStatus::Completed;
    self.completed_at = Some(now);
    Ok(true)
  }
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCourse {
  pub user_id:      Uuid,
  pub course_id:    Uuid,
  pub status:       ActivityStatus,
  /// Percentage, 0-100. Never decreases.
  pub progress:     u8,
  pub started_at:   DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl UserCourse {
  pub fn start(user_id: Uuid, course_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      course_id,
      status: ActivityStatus::InProgress,
      progress: 0,
      started_at: now,
      completed_at: None,
    }
  }

  pub fn record_progress(&mut self, percent: u8, now: DateTime<Utc>) -> Result<bool> {
    if self.status.is_completed() {
      return Err(Error::AlreadyCompleted {
        kind: ContentKind::Course,
        id:   self.course_id,
      });
    }
    if percent > 100 {
      return Err(Error::Invalid(format!("progress {percent}% exceeds 100%")));
    }
    self.progress = self.progress.max(percent);
    if self.progress == 100 {
      self.status = ActivityStatus::Completed;
      self.completed_at = Some(now);
      return Ok(true);
    }
    Ok(false)
  }
}

// ─── Roadmaps ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoadmap {
  pub user_id:              Uuid,
  pub roadmap_id:           Uuid,
  pub status:               ActivityStatus,
  /// Zero-based milestone indices.
  pub completed_milestones: BTreeSet<u32>,
  pub milestone_count:      u32,
  pub started_at:           DateTime<Utc>,
  pub completed_at:         Option<DateTime<Utc>>,
}

impl UserRoadmap {
  pub fn start(
    user_id: Uuid,
    roadmap_id: Uuid,
    milestone_count: u32,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      user_id,
      roadmap_id,
      status: ActivityStatus::InProgress,
      completed_milestones: BTreeSet::new(),
      milestone_count,
      started_at: now,
      completed_at: None,
    }
  }

  /// Mark one milestone done. Marking every milestone completes the roadmap;
  /// re-marking a done milestone is a no-op.
  pub fn complete_milestone(&mut self, index: u32, now: DateTime<Utc>) -> Result<bool> {
    if self.status.is_completed() {
      return Err(Error::AlreadyCompleted {
        kind: ContentKind::Roadmap,
        id:   self.roadmap_id,
      });
    }
    if index >= self.milestone_count {
      return Err(Error::Invalid(format!(
        "milestone {index} is out of range (roadmap has {})",
        self.milestone_count
      )));
    }
    self.completed_milestones.insert(index);
    if self.completed_milestones.len() as u32 == self.milestone_count {
      self.status = ActivityStatus::Completed;
      self.completed_at = Some(now);
      return Ok(true);
    }
    Ok(false)
  }
}
