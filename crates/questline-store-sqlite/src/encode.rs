//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision, so lexical order is chronological order and range filters can
//! compare strings. Dates are `YYYY-MM-DD`. Collections are compact JSON.
//! Enums use their snake_case names. UUIDs are hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use questline_core::{
  activity::{UserChallenge, UserCourse, UserQuest, UserRoadmap},
  catalog::{Arena, Challenge, Course, Mentor, Post, Quest, Roadmap},
  clan::{Clan, ClanMember},
  message::Message,
  profile::UserProfile,
  progression::level_for_xp,
  user::User,
};
use rusqlite::Row;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

/// Parse a snake_case enum name written with its `AsRef<str>` form.
pub fn decode_enum<T: FromStr>(s: &str, what: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

/// Convert an SQLite integer into a narrower unsigned type.
pub fn decode_int<T: TryFrom<i64>>(v: i64, what: &str) -> Result<T> {
  T::try_from(v).map_err(|_| Error::Decode(format!("{what} out of range: {v}")))
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `*_COLUMNS` constant is the SELECT list its `Raw*::from_row` expects,
// in order. Prefix with a table alias where a query joins.

pub const USER_COLUMNS: &str = "user_id, email, pen_name, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub pen_name:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      email:      row.get(1)?,
      pen_name:   row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      email:      self.email,
      pen_name:   self.pen_name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const PROFILE_COLUMNS: &str = "user_id, xp, daily_streak, last_active_on, \
  tech_tier, interests, badges, learning_pace, learning_style, bio, \
  onboarding_complete, created_at, updated_at";

/// Raw values read directly from a `user_profiles` row.
pub struct RawProfile {
  pub user_id:             String,
  pub xp:                  i64,
  pub daily_streak:        i64,
  pub last_active_on:      Option<String>,
  pub tech_tier:           String,
  pub interests:           String,
  pub badges:              String,
  pub learning_pace:       Option<String>,
  pub learning_style:      Option<String>,
  pub bio:                 Option<String>,
  pub onboarding_complete: bool,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:             row.get(0)?,
      xp:                  row.get(1)?,
      daily_streak:        row.get(2)?,
      last_active_on:      row.get(3)?,
      tech_tier:           row.get(4)?,
      interests:           row.get(5)?,
      badges:              row.get(6)?,
      learning_pace:       row.get(7)?,
      learning_style:      row.get(8)?,
      bio:                 row.get(9)?,
      onboarding_complete: row.get(10)?,
      created_at:          row.get(11)?,
      updated_at:          row.get(12)?,
    })
  }

  /// Decode the row, deriving `level` from `xp`.
  pub fn into_profile(self) -> Result<UserProfile> {
    let xp: u64 = decode_int(self.xp, "xp")?;
    Ok(UserProfile {
      user_id: decode_uuid(&self.user_id)?,
      xp,
      level: level_for_xp(xp),
      daily_streak: decode_int(self.daily_streak, "daily_streak")?,
      last_active_on: self.last_active_on.as_deref().map(decode_date).transpose()?,
      tech_tier: decode_enum(&self.tech_tier, "tech tier")?,
      interests: decode_json(&self.interests)?,
      badges: decode_json(&self.badges)?,
      learning_pace: self.learning_pace,
      learning_style: self.learning_style,
      bio: self.bio,
      onboarding_complete: self.onboarding_complete,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Catalog rows ────────────────────────────────────────────────────────────

pub const ARENA_COLUMNS: &str = "arena_id, slug, name, description, icon";

pub fn arena_from_row(row: &Row<'_>) -> rusqlite::Result<(String, Arena)> {
  Ok((row.get(0)?, Arena {
    id:          Uuid::nil(),
    slug:        row.get(1)?,
    name:        row.get(2)?,
    description: row.get(3)?,
    icon:        row.get(4)?,
  }))
}

pub fn into_arena((id, mut arena): (String, Arena)) -> Result<Arena> {
  arena.id = decode_uuid(&id)?;
  Ok(arena)
}

pub const CHALLENGE_COLUMNS: &str = "challenge_id, arena_id, title, description, \
  difficulty, xp_reward, language, starter_code, test_cases, created_at";

pub struct RawChallenge {
  pub challenge_id: String,
  pub arena_id:     Option<String>,
  pub title:        String,
  pub description:  String,
  pub difficulty:   String,
  pub xp_reward:    i64,
  pub language:     String,
  pub starter_code: Option<String>,
  pub test_cases:   String,
  pub created_at:   String,
}

impl RawChallenge {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      challenge_id: row.get(0)?,
      arena_id:     row.get(1)?,
      title:        row.get(2)?,
      description:  row.get(3)?,
      difficulty:   row.get(4)?,
      xp_reward:    row.get(5)?,
      language:     row.get(6)?,
      starter_code: row.get(7)?,
      test_cases:   row.get(8)?,
      created_at:   row.get(9)?,
    })
  }

  pub fn into_challenge(self) -> Result<Challenge> {
    Ok(Challenge {
      id:           decode_uuid(&self.challenge_id)?,
      arena_id:     decode_opt_uuid(self.arena_id)?,
      title:        self.title,
      description:  self.description,
      difficulty:   decode_enum(&self.difficulty, "difficulty")?,
      xp_reward:    decode_int(self.xp_reward, "xp_reward")?,
      language:     self.language,
      starter_code: self.starter_code,
      test_cases:   decode_json(&self.test_cases)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const QUEST_COLUMNS: &str =
  "quest_id, arena_id, title, description, period, target, xp_reward, created_at";

pub struct RawQuest {
  pub quest_id:    String,
  pub arena_id:    Option<String>,
  pub title:       String,
  pub description: String,
  pub period:      String,
  pub target:      i64,
  pub xp_reward:   i64,
  pub created_at:  String,
}

impl RawQuest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      quest_id:    row.get(0)?,
      arena_id:    row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      period:      row.get(4)?,
      target:      row.get(5)?,
      xp_reward:   row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_quest(self) -> Result<Quest> {
    Ok(Quest {
      id:          decode_uuid(&self.quest_id)?,
      arena_id:    decode_opt_uuid(self.arena_id)?,
      title:       self.title,
      description: self.description,
      period:      decode_enum(&self.period, "quest period")?,
      target:      decode_int(self.target, "target")?,
      xp_reward:   decode_int(self.xp_reward, "xp_reward")?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const COURSE_COLUMNS: &str =
  "course_id, arena_id, title, description, difficulty, xp_reward, lessons, created_at";

pub struct RawCourse {
  pub course_id:   String,
  pub arena_id:    Option<String>,
  pub title:       String,
  pub description: String,
  pub difficulty:  String,
  pub xp_reward:   i64,
  pub lessons:     String,
  pub created_at:  String,
}

impl RawCourse {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      arena_id:    row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      difficulty:  row.get(4)?,
      xp_reward:   row.get(5)?,
      lessons:     row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      id:          decode_uuid(&self.course_id)?,
      arena_id:    decode_opt_uuid(self.arena_id)?,
      title:       self.title,
      description: self.description,
      difficulty:  decode_enum(&self.difficulty, "difficulty")?,
      xp_reward:   decode_int(self.xp_reward, "xp_reward")?,
      lessons:     decode_json(&self.lessons)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const ROADMAP_COLUMNS: &str = "roadmap_id, title, description, difficulty, \
  xp_reward, estimated_weeks, milestones, created_at";

pub struct RawRoadmap {
  pub roadmap_id:      String,
  pub title:           String,
  pub description:     String,
  pub difficulty:      String,
  pub xp_reward:       i64,
  pub estimated_weeks: i64,
  pub milestones:      String,
  pub created_at:      String,
}

impl RawRoadmap {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      roadmap_id:      row.get(0)?,
      title:           row.get(1)?,
      description:     row.get(2)?,
      difficulty:      row.get(3)?,
      xp_reward:       row.get(4)?,
      estimated_weeks: row.get(5)?,
      milestones:      row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_roadmap(self) -> Result<Roadmap> {
    Ok(Roadmap {
      id:              decode_uuid(&self.roadmap_id)?,
      title:           self.title,
      description:     self.description,
      difficulty:      decode_enum(&self.difficulty, "difficulty")?,
      xp_reward:       decode_int(self.xp_reward, "xp_reward")?,
      estimated_weeks: decode_int(self.estimated_weeks, "estimated_weeks")?,
      milestones:      decode_json(&self.milestones)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const MENTOR_COLUMNS: &str = "mentor_id, name, expertise, bio, rating";

pub struct RawMentor {
  pub mentor_id: String,
  pub name:      String,
  pub expertise: String,
  pub bio:       String,
  pub rating:    f64,
}

impl RawMentor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      mentor_id: row.get(0)?,
      name:      row.get(1)?,
      expertise: row.get(2)?,
      bio:       row.get(3)?,
      rating:    row.get(4)?,
    })
  }

  pub fn into_mentor(self) -> Result<Mentor> {
    Ok(Mentor {
      id:        decode_uuid(&self.mentor_id)?,
      name:      self.name,
      expertise: decode_json(&self.expertise)?,
      bio:       self.bio,
      rating:    self.rating as f32,
    })
  }
}

pub const POST_COLUMNS: &str = "post_id, kind, title, body, author, tags, published_at";

pub struct RawPost {
  pub post_id:      String,
  pub kind:         String,
  pub title:        String,
  pub body:         String,
  pub author:       String,
  pub tags:         String,
  pub published_at: String,
}

impl RawPost {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:      row.get(0)?,
      kind:         row.get(1)?,
      title:        row.get(2)?,
      body:         row.get(3)?,
      author:       row.get(4)?,
      tags:         row.get(5)?,
      published_at: row.get(6)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:           decode_uuid(&self.post_id)?,
      kind:         decode_enum(&self.kind, "post kind")?,
      title:        self.title,
      body:         self.body,
      author:       self.author,
      tags:         decode_json(&self.tags)?,
      published_at: decode_dt(&self.published_at)?,
    })
  }
}

// ─── Activity rows ───────────────────────────────────────────────────────────

pub const USER_CHALLENGE_COLUMNS: &str = "user_id, challenge_id, status, attempts, \
  best_score, last_score, last_code, started_at, completed_at";

pub struct RawUserChallenge {
  pub user_id:      String,
  pub challenge_id: String,
  pub status:       String,
  pub attempts:     i64,
  pub best_score:   Option<i64>,
  pub last_score:   Option<i64>,
  pub last_code:    Option<String>,
  pub started_at:   String,
  pub completed_at: Option<String>,
}

impl RawUserChallenge {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      challenge_id: row.get(1)?,
      status:       row.get(2)?,
      attempts:     row.get(3)?,
      best_score:   row.get(4)?,
      last_score:   row.get(5)?,
      last_code:    row.get(6)?,
      started_at:   row.get(7)?,
      completed_at: row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<UserChallenge> {
    Ok(UserChallenge {
      user_id:      decode_uuid(&self.user_id)?,
      challenge_id: decode_uuid(&self.challenge_id)?,
      status:       decode_enum(&self.status, "activity status")?,
      attempts:     decode_int(self.attempts, "attempts")?,
      best_score:   self.best_score.map(|s| decode_int(s, "best_score")).transpose()?,
      last_score:   self.last_score.map(|s| decode_int(s, "last_score")).transpose()?,
      last_code:    self.last_code,
      started_at:   decode_dt(&self.started_at)?,
      completed_at: decode_opt_dt(self.completed_at)?,
    })
  }
}

pub const USER_QUEST_COLUMNS: &str =
  "user_id, quest_id, status, progress, target, assigned_at, completed_at";

pub struct RawUserQuest {
  pub user_id:      String,
  pub quest_id:     String,
  pub status:       String,
  pub progress:     i64,
  pub target:       i64,
  pub assigned_at:  String,
  pub completed_at: Option<String>,
}

impl RawUserQuest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      quest_id:     row.get(1)?,
      status:       row.get(2)?,
      progress:     row.get(3)?,
      target:       row.get(4)?,
      assigned_at:  row.get(5)?,
      completed_at: row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<UserQuest> {
    Ok(UserQuest {
      user_id:      decode_uuid(&self.user_id)?,
      quest_id:     decode_uuid(&self.quest_id)?,
      status:       decode_enum(&self.status, "activity status")?,
      progress:     decode_int(self.progress, "progress")?,
      target:       decode_int(self.target, "target")?,
      assigned_at:  decode_dt(&self.assigned_at)?,
      completed_at: decode_opt_dt(self.completed_at)?,
    })
  }
}

pub const USER_COURSE_COLUMNS: &str =
  "user_id, course_id, status, progress, started_at, completed_at";

pub struct RawUserCourse {
  pub user_id:      String,
  pub course_id:    String,
  pub status:       String,
  pub progress:     i64,
  pub started_at:   String,
  pub completed_at: Option<String>,
}

impl RawUserCourse {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      course_id:    row.get(1)?,
      status:       row.get(2)?,
      progress:     row.get(3)?,
      started_at:   row.get(4)?,
      completed_at: row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<UserCourse> {
    Ok(UserCourse {
      user_id:      decode_uuid(&self.user_id)?,
      course_id:    decode_uuid(&self.course_id)?,
      status:       decode_enum(&self.status, "activity status")?,
      progress:     decode_int(self.progress, "progress")?,
      started_at:   decode_dt(&self.started_at)?,
      completed_at: decode_opt_dt(self.completed_at)?,
    })
  }
}

pub const USER_ROADMAP_COLUMNS: &str = "user_id, roadmap_id, status, \
  completed_milestones, milestone_count, started_at, completed_at";

pub struct RawUserRoadmap {
  pub user_id:              String,
  pub roadmap_id:           String,
  pub status:               String,
  pub completed_milestones: String,
  pub milestone_count:      i64,
  pub started_at:           String,
  pub completed_at:         Option<String>,
}

impl RawUserRoadmap {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:              row.get(0)?,
      roadmap_id:           row.get(1)?,
      status:               row.get(2)?,
      completed_milestones: row.get(3)?,
      milestone_count:      row.get(4)?,
      started_at:           row.get(5)?,
      completed_at:         row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<UserRoadmap> {
    Ok(UserRoadmap {
      user_id:              decode_uuid(&self.user_id)?,
      roadmap_id:           decode_uuid(&self.roadmap_id)?,
      status:               decode_enum(&self.status, "activity status")?,
      completed_milestones: decode_json(&self.completed_milestones)?,
      milestone_count:      decode_int(self.milestone_count, "milestone_count")?,
      started_at:           decode_dt(&self.started_at)?,
      completed_at:         decode_opt_dt(self.completed_at)?,
    })
  }
}

// ─── Social rows ─────────────────────────────────────────────────────────────

pub const MESSAGE_COLUMNS: &str =
  "message_id, sender_id, receiver_id, content, is_read, created_at";

pub struct RawMessage {
  pub message_id:  String,
  pub sender_id:   String,
  pub receiver_id: String,
  pub content:     String,
  pub is_read:     bool,
  pub created_at:  String,
}

impl RawMessage {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:  row.get(0)?,
      sender_id:   row.get(1)?,
      receiver_id: row.get(2)?,
      content:     row.get(3)?,
      is_read:     row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      id:          decode_uuid(&self.message_id)?,
      sender_id:   decode_uuid(&self.sender_id)?,
      receiver_id: decode_uuid(&self.receiver_id)?,
      content:     self.content,
      is_read:     self.is_read,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// `clans` columns followed by the live member count.
pub const CLAN_COLUMNS: &str = "c.clan_id, c.name, c.description, c.owner_id, \
  c.max_members, c.created_at, \
  (SELECT COUNT(*) FROM clan_members m WHERE m.clan_id = c.clan_id)";

pub struct RawClan {
  pub clan_id:      String,
  pub name:         String,
  pub description:  String,
  pub owner_id:     String,
  pub max_members:  i64,
  pub created_at:   String,
  pub member_count: i64,
}

impl RawClan {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      clan_id:      row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      owner_id:     row.get(3)?,
      max_members:  row.get(4)?,
      created_at:   row.get(5)?,
      member_count: row.get(6)?,
    })
  }

  pub fn into_clan(self) -> Result<Clan> {
    Ok(Clan {
      id:           decode_uuid(&self.clan_id)?,
      name:         self.name,
      description:  self.description,
      owner_id:     decode_uuid(&self.owner_id)?,
      max_members:  decode_int(self.max_members, "max_members")?,
      member_count: decode_int(self.member_count, "member_count")?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// `clan_members` joined with the member's pen name.
pub const CLAN_MEMBER_COLUMNS: &str = "m.clan_id, m.user_id, u.pen_name, m.role, m.joined_at";

pub struct RawClanMember {
  pub clan_id:   String,
  pub user_id:   String,
  pub pen_name:  String,
  pub role:      String,
  pub joined_at: String,
}

impl RawClanMember {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      clan_id:   row.get(0)?,
      user_id:   row.get(1)?,
      pen_name:  row.get(2)?,
      role:      row.get(3)?,
      joined_at: row.get(4)?,
    })
  }

  pub fn into_member(self) -> Result<ClanMember> {
    Ok(ClanMember {
      clan_id:   decode_uuid(&self.clan_id)?,
      user_id:   decode_uuid(&self.user_id)?,
      pen_name:  self.pen_name,
      role:      decode_enum(&self.role, "clan role")?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}
