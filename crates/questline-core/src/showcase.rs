//! Showcase content: AI-generated challenges, shadow collaboration sessions,
//! swarm projects, the tech spotlight and learning analytics.
//!
//! There is no real engine behind any of these yet. [`Showcase`] fixes the
//! JSON shapes the client renders, and [`FixtureShowcase`] fills them from
//! static tables. Output depends only on the inputs, so the same user on the
//! same day always sees the same content. A real implementation replaces the
//! fixture behind the same trait.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  catalog::Difficulty,
  profile::UserProfile,
  progression::{TechTier, XP_PER_LEVEL, level_for_xp, xp_to_next_level},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedChallenge {
  pub title:             String,
  pub description:       String,
  pub difficulty:        Difficulty,
  pub xp_reward:         u32,
  pub estimated_minutes: u32,
  pub tags:              Vec<String>,
  /// Why this challenge was picked for the user.
  pub rationale:         String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSuggestion {
  pub step: u32,
  pub hint: String,
}

/// A simulated pair-programming partner that "codes alongside" the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSession {
  pub partner_name:  String,
  pub partner_style: String,
  pub topic:         String,
  pub suggestions:   Vec<ShadowSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmProject {
  pub slug:             String,
  pub name:             String,
  pub description:      String,
  pub languages:        Vec<String>,
  pub participants:     u32,
  pub open_tasks:       u32,
  pub progress_percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechSpotlight {
  pub date:       NaiveDate,
  pub technology: String,
  pub headline:   String,
  pub summary:    String,
  pub resources:  Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningAnalytics {
  pub xp:                     u64,
  pub level:                  u64,
  pub xp_to_next_level:       u64,
  pub level_progress_percent: u8,
  pub daily_streak:           u32,
  pub tech_tier:              TechTier,
  pub next_tier:              Option<TechTier>,
  pub levels_to_next_tier:    Option<u64>,
  pub focus_areas:            Vec<String>,
  pub badge_count:            usize,
}

/// Content-shape contract for the showcase endpoints.
pub trait Showcase: Send + Sync {
  fn ai_challenges(&self, profile: &UserProfile) -> Vec<GeneratedChallenge>;
  fn shadow_session(&self, user_id: Uuid, topic: Option<&str>) -> ShadowSession;
  fn swarm_projects(&self) -> Vec<SwarmProject>;
  fn tech_spotlight(&self, on: NaiveDate) -> TechSpotlight;
  fn learning_analytics(&self, profile: &UserProfile) -> LearningAnalytics;
}

// ─── Fixture ─────────────────────────────────────────────────────────────────

/// Deterministic, table-driven [`Showcase`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureShowcase;

struct ChallengeIdea {
  topic:   &'static str,
  title:   &'static str,
  summary: &'static str,
  minutes: u32,
}

const CHALLENGE_IDEAS: &[ChallengeIdea] = &[
  ChallengeIdea {
    topic:   "rust",
    title:   "Lifetimes in a tokenizer",
    summary: "Write a zero-copy tokenizer that borrows from its input.",
    minutes: 45,
  },
  ChallengeIdea {
    topic:   "ai",
    title:   "Nearest-neighbour recommender",
    summary: "Rank items by cosine similarity over small embedding vectors.",
    minutes: 40,
  },
  ChallengeIdea {
    topic:   "web",
    title:   "Rate-limited endpoint",
    summary: "Add a token-bucket limiter in front of a JSON endpoint.",
    minutes: 35,
  },
  ChallengeIdea {
    topic:   "data",
    title:   "Streaming percentile",
    summary: "Report p50/p95 over an unbounded stream with bounded memory.",
    minutes: 50,
  },
  ChallengeIdea {
    topic:   "security",
    title:   "Constant-time compare",
    summary: "Compare secrets without leaking their length or content through timing.",
    minutes: 25,
  },
  ChallengeIdea {
    topic:   "algorithms",
    title:   "Interval merge",
    summary: "Merge overlapping calendar intervals in O(n log n).",
    minutes: 30,
  },
];

const SHADOW_PARTNERS: &[(&str, &str)] = &[
  ("Ada", "methodical; writes the test first"),
  ("Linus", "terse; refactors aggressively"),
  ("Grace", "explains every step out loud"),
  ("Ken", "prefers the smallest thing that works"),
];

const SHADOW_HINTS: &[&str] = &[
  "Sketch the inputs and outputs before writing any code.",
  "Write one failing test for the simplest case.",
  "Make it pass with the most direct implementation.",
  "Look for a second case that breaks your assumption.",
  "Name the helper you keep wishing you had, then write it.",
  "Delete anything the tests do not need.",
];

const SWARM_PROJECTS: &[(&str, &str, &str, &[&str], u32, u32, u8)] = &[
  (
    "open-grader",
    "Open Grader",
    "A sandboxed runner that grades challenge submissions against hidden tests.",
    &["rust", "typescript"],
    128,
    37,
    64,
  ),
  (
    "lesson-lint",
    "Lesson Lint",
    "Static checks for course content: broken links, missing alt text, stale APIs.",
    &["python"],
    54,
    12,
    81,
  ),
  (
    "quest-forge",
    "Quest Forge",
    "A community editor for designing and balancing quests.",
    &["typescript", "sql"],
    212,
    58,
    29,
  ),
];

const SPOTLIGHTS: &[(&str, &str, &str, &[&str])] = &[
  (
    "WebAssembly",
    "Run the same module in the browser and on the server",
    "Component-model tooling now makes cross-language WASM modules practical.",
    &["https://webassembly.org/", "https://component-model.bytecodealliance.org/"],
  ),
  (
    "Vector databases",
    "Similarity search moves into the mainstream database",
    "Approximate nearest-neighbour indexes trade exactness for orders of magnitude in speed.",
    &["https://github.com/pgvector/pgvector"],
  ),
  (
    "Async Rust",
    "Async functions in traits are stable",
    "Trait methods can now be `async fn` without boxing, simplifying library APIs.",
    &["https://blog.rust-lang.org/2023/12/21/async-fn-rpit-in-traits.html"],
  ),
  (
    "eBPF",
    "Safe programs inside the kernel",
    "Verified bytecode lets observability tools hook the kernel without modules.",
    &["https://ebpf.io/"],
  ),
];

fn difficulty_for(tier: TechTier) -> Difficulty {
  match tier {
    TechTier::Beginner | TechTier::Explorer => Difficulty::Beginner,
    TechTier::Builder => Difficulty::Intermediate,
    TechTier::Expert | TechTier::Master => Difficulty::Advanced,
    TechTier::Legend => Difficulty::Expert,
  }
}

fn reward_for(difficulty: Difficulty) -> u32 {
  match difficulty {
    Difficulty::Beginner => 50,
    Difficulty::Intermediate => 100,
    Difficulty::Advanced => 200,
    Difficulty::Expert => 400,
  }
}

fn pick(seed: u128, len: usize) -> usize { (seed % len as u128) as usize }

impl Showcase for FixtureShowcase {
  fn ai_challenges(&self, profile: &UserProfile) -> Vec<GeneratedChallenge> {
    let difficulty = difficulty_for(profile.tech_tier);

    // Ideas matching an interest come first, then the rest in table order.
    let (mut matching, rest): (Vec<_>, Vec<_>) = CHALLENGE_IDEAS
      .iter()
      .partition(|idea| profile.interests.contains(idea.topic));
    matching.extend(rest);

    matching
      .into_iter()
      .take(3)
      .map(|idea| {
        let rationale = if profile.interests.contains(idea.topic) {
          format!("Matches your interest in {}", idea.topic)
        } else {
          format!("Broadens your skills beyond your interests into {}", idea.topic)
        };
        GeneratedChallenge {
          title: idea.title.to_owned(),
          description: idea.summary.to_owned(),
          difficulty,
          xp_reward: reward_for(difficulty),
          estimated_minutes: idea.minutes,
          tags: vec![idea.topic.to_owned()],
          rationale,
        }
      })
      .collect()
  }

  fn shadow_session(&self, user_id: Uuid, topic: Option<&str>) -> ShadowSession {
    let seed = user_id.as_u128();
    let (name, style) = SHADOW_PARTNERS[pick(seed, SHADOW_PARTNERS.len())];
    let start = pick(seed >> 8, SHADOW_HINTS.len());
    let suggestions = (0..3)
      .map(|step| ShadowSuggestion {
        step: step as u32 + 1,
        hint: SHADOW_HINTS[(start + step) % SHADOW_HINTS.len()].to_owned(),
      })
      .collect();

    ShadowSession {
      partner_name: name.to_owned(),
      partner_style: style.to_owned(),
      topic: topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("open practice")
        .to_owned(),
      suggestions,
    }
  }

  fn swarm_projects(&self) -> Vec<SwarmProject> {
    SWARM_PROJECTS
      .iter()
      .map(
        |&(slug, name, description, languages, participants, open_tasks, progress)| {
          SwarmProject {
            slug: slug.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            languages: languages.iter().map(|l| (*l).to_owned()).collect(),
            participants,
            open_tasks,
            progress_percent: progress,
          }
        },
      )
      .collect()
  }

  fn tech_spotlight(&self, on: NaiveDate) -> TechSpotlight {
    let index = on.num_days_from_ce().unsigned_abs() as usize % SPOTLIGHTS.len();
    let (technology, headline, summary, resources) = SPOTLIGHTS[index];
    TechSpotlight {
      date:       on,
      technology: technology.to_owned(),
      headline:   headline.to_owned(),
      summary:    summary.to_owned(),
      resources:  resources.iter().map(|r| (*r).to_owned()).collect(),
    }
  }

  fn learning_analytics(&self, profile: &UserProfile) -> LearningAnalytics {
    let level = level_for_xp(profile.xp);
    let into_level = profile.xp % XP_PER_LEVEL;
    let next_tier = match profile.tech_tier {
      TechTier::Beginner => Some(TechTier::Explorer),
      TechTier::Explorer => Some(TechTier::Builder),
      TechTier::Builder => Some(TechTier::Expert),
      TechTier::Expert => Some(TechTier::Master),
      TechTier::Master => Some(TechTier::Legend),
      TechTier::Legend => None,
    };

    let mut focus_areas: Vec<String> = profile.interests.iter().take(3).cloned().collect();
    if focus_areas.is_empty() {
      focus_areas.push("fundamentals".to_owned());
    }

    LearningAnalytics {
      xp: profile.xp,
      level,
      xp_to_next_level: xp_to_next_level(profile.xp),
      level_progress_percent: (into_level * 100 / XP_PER_LEVEL) as u8,
      daily_streak: profile.daily_streak,
      tech_tier: profile.tech_tier,
      next_tier,
      levels_to_next_tier: next_tier.map(|t| t.min_level().saturating_sub(level)),
      focus_areas,
      badge_count: profile.badges.len(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn profile_with(interests: &[&str], tier: TechTier) -> UserProfile {
    let mut p = UserProfile::new(Uuid::new_v4(), Utc::now());
    p.interests = interests.iter().map(|i| (*i).to_owned()).collect();
    p.tech_tier = tier;
    p
  }

  #[test]
  fn ai_challenges_prefer_interests_and_scale_with_tier() {
    let p = profile_with(&["security"], TechTier::Expert);
    let picks = FixtureShowcase.ai_challenges(&p);
    assert_eq!(picks.len(), 3);
    assert_eq!(picks[0].tags, vec!["security"]);
    assert!(picks.iter().all(|c| c.difficulty == Difficulty::Advanced));
    assert!(picks.iter().all(|c| c.xp_reward == 200));
  }

  #[test]
  fn shadow_session_is_stable_per_user() {
    let user = Uuid::new_v4();
    let a = FixtureShowcase.shadow_session(user, Some("graphs"));
    let b = FixtureShowcase.shadow_session(user, Some("graphs"));
    assert_eq!(a, b);
    assert_eq!(a.suggestions.len(), 3);
    assert_eq!(FixtureShowcase.shadow_session(user, Some("  ")).topic, "open practice");
  }

  #[test]
  fn spotlight_rotates_daily() {
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let next = day.succ_opt().unwrap();
    assert_eq!(FixtureShowcase.tech_spotlight(day), FixtureShowcase.tech_spotlight(day));
    assert_ne!(
      FixtureShowcase.tech_spotlight(day).technology,
      FixtureShowcase.tech_spotlight(next).technology
    );
  }

  #[test]
  fn analytics_reflect_profile() {
    let mut p = profile_with(&[], TechTier::Beginner);
    p.xp = 1250;
    p.level = level_for_xp(p.xp);
    let a = FixtureShowcase.learning_analytics(&p);
    assert_eq!(a.level, 2);
    assert_eq!(a.xp_to_next_level, 750);
    assert_eq!(a.level_progress_percent, 25);
    assert_eq!(a.next_tier, Some(TechTier::Explorer));
    assert_eq!(a.levels_to_next_tier, Some(1));
    assert_eq!(a.focus_areas, vec!["fundamentals"]);
  }
}
