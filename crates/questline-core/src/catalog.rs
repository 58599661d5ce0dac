//! Content catalog: shared, read-mostly reference data.
//!
//! Content belongs to no user. Users relate to it only through the activity
//! records in [`crate::activity`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

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
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

// ─── Arenas ──────────────────────────────────────────────────────────────────

/// A thematic category, e.g. "AI & Machine Learning".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arena {
  pub id:          Uuid,
  pub slug:        String,
  pub name:        String,
  pub description: String,
  pub icon:        Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArena {
  pub slug:        String,
  pub name:        String,
  pub description: String,
  pub icon:        Option<String>,
}

// ─── Challenges ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
  pub input:           String,
  pub expected_output: String,
  /// Hidden cases are graded but not shown to the user.
  #[serde(default)]
  pub hidden:          bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
  pub id:           Uuid,
  pub arena_id:     Option<Uuid>,
  pub title:        String,
  pub description:  String,
  pub difficulty:   Difficulty,
  pub xp_reward:    u32,
  pub language:     String,
  pub starter_code: Option<String>,
  pub test_cases:   Vec<TestCase>,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
  #[serde(default)]
  pub arena_id:     Option<Uuid>,
  pub title:        String,
  pub description:  String,
  pub difficulty:   Difficulty,
  pub xp_reward:    u32,
  pub language:     String,
  pub starter_code: Option<String>,
  #[serde(default)]
  pub test_cases:   Vec<TestCase>,
}

impl NewChallenge {
  pub fn validate(&self) -> Result<()> { require_title(&self.title) }
}

/// Filter for listing challenges. Doubles as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeFilter {
  pub arena_id:   Option<Uuid>,
  pub difficulty: Option<Difficulty>,
}

// ─── Quests ──────────────────────────────────────────────────────────────────

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
pub enum QuestPeriod {
  Daily,
  Weekly,
  Monthly,
}

/// A time-boxed objective with a numeric target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
  pub id:          Uuid,
  pub arena_id:    Option<Uuid>,
  pub title:       String,
  pub description: String,
  pub period:      QuestPeriod,
  pub target:      u32,
  pub xp_reward:   u32,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuest {
  #[serde(default)]
  pub arena_id:    Option<Uuid>,
  pub title:       String,
  pub description: String,
  pub period:      QuestPeriod,
  pub target:      u32,
  pub xp_reward:   u32,
}

impl NewQuest {
  pub fn validate(&self) -> Result<()> {
    require_title(&self.title)?;
    if self.target == 0 {
      return Err(Error::Invalid("quest target must be positive".into()));
    }
    Ok(())
  }
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
  pub title:            String,
  pub content:          String,
  pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id:          Uuid,
  pub arena_id:    Option<Uuid>,
  pub title:       String,
  pub description: String,
  pub difficulty:  Difficulty,
  pub xp_reward:   u32,
  pub lessons:     Vec<Lesson>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
  #[serde(default)]
  pub arena_id:    Option<Uuid>,
  pub title:       String,
  pub description: String,
  pub difficulty:  Difficulty,
  pub xp_reward:   u32,
  #[serde(default)]
  pub lessons:     Vec<Lesson>,
}

impl NewCourse {
  pub fn validate(&self) -> Result<()> { require_title(&self.title) }
}

// ─── Roadmaps ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
  pub title:       String,
  pub description: String,
  pub week:        u32,
}

/// An ordered, multi-week learning path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
  pub id:              Uuid,
  pub title:           String,
  pub description:     String,
  pub difficulty:      Difficulty,
  pub xp_reward:       u32,
  pub estimated_weeks: u32,
  pub milestones:      Vec<Milestone>,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoadmap {
  pub title:           String,
  pub description:     String,
  pub difficulty:      Difficulty,
  pub xp_reward:       u32,
  pub estimated_weeks: u32,
  pub milestones:      Vec<Milestone>,
}

impl NewRoadmap {
  pub fn validate(&self) -> Result<()> {
    require_title(&self.title)?;
    if self.milestones.is_empty() {
      return Err(Error::Invalid("a roadmap needs at least one milestone".into()));
    }
    Ok(())
  }
}

// ─── Mentors, feed and news ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mentor {
  pub id:        Uuid,
  pub name:      String,
  pub expertise: Vec<String>,
  pub bio:       String,
  /// 0.0-5.0
  pub rating:    f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMentor {
  pub name:      String,
  pub expertise: Vec<String>,
  pub bio:       String,
  pub rating:    f32,
}

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
pub enum PostKind {
  Feed,
  News,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id:           Uuid,
  pub kind:         PostKind,
  pub title:        String,
  pub body:         String,
  pub author:       String,
  pub tags:         Vec<String>,
  pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
  pub kind:         PostKind,
  pub title:        String,
  pub body:         String,
  pub author:       String,
  #[serde(default)]
  pub tags:         Vec<String>,
  pub published_at: DateTime<Utc>,
}

// ─── Seed bundle ─────────────────────────────────────────────────────────────

/// A challenge in a seed bundle, referring to its arena by slug.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedChallenge {
  pub arena: Option<String>,
  #[serde(flatten)]
  pub challenge: NewChallenge,
}

/// A quest in a seed bundle, referring to its arena by slug.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedQuest {
  pub arena: Option<String>,
  #[serde(flatten)]
  pub quest: NewQuest,
}

/// A course in a seed bundle, referring to its arena by slug.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCourse {
  pub arena: Option<String>,
  #[serde(flatten)]
  pub course: NewCourse,
}

/// Everything needed to populate an empty catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogSeed {
  pub arenas:     Vec<NewArena>,
  pub challenges: Vec<SeedChallenge>,
  pub quests:     Vec<SeedQuest>,
  pub courses:    Vec<SeedCourse>,
  pub roadmaps:   Vec<NewRoadmap>,
  pub mentors:    Vec<NewMentor>,
  pub posts:      Vec<NewPost>,
}

fn require_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::Invalid("title must not be empty".into()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quest_target_must_be_positive() {
    let quest = NewQuest {
      arena_id:    None,
      title:       "Solve things".into(),
      description: String::new(),
      period:      QuestPeriod::Daily,
      target:      0,
      xp_reward:   50,
    };
    assert!(quest.validate().is_err());
  }

  #[test]
  fn roadmap_needs_milestones() {
    let roadmap = NewRoadmap {
      title:           "Rust in 8 weeks".into(),
      description:     String::new(),
      difficulty:      Difficulty::Intermediate,
      xp_reward:       500,
      estimated_weeks: 8,
      milestones:      vec![],
    };
    assert!(roadmap.validate().is_err());
  }

  #[test]
  fn seed_challenge_flattens_arena_slug() {
    let json = serde_json::json!({
      "arena": "systems",
      "title": "Ring buffer",
      "description": "Implement a ring buffer",
      "difficulty": "intermediate",
      "xpReward": 150,
      "language": "rust",
      "starterCode": null,
      "testCases": [{ "input": "1", "expectedOutput": "1" }]
    });
    let seed: SeedChallenge = serde_json::from_value(json).unwrap();
    assert_eq!(seed.arena.as_deref(), Some("systems"));
    assert_eq!(seed.challenge.xp_reward, 150);
    assert!(!seed.challenge.test_cases[0].hidden);
  }
}
