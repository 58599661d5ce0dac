//! Store traits implemented by persistence backends (e.g.
//! `questline-store-sqlite`).
//!
//! The traits are split by concern; [`Store`] is the union that the API layer
//! depends on. All methods return `Send` futures so implementations can be
//! shared across a multi-threaded runtime (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  DomainError,
  activity::{Submission, Transition, UserChallenge, UserCourse, UserQuest, UserRoadmap},
  catalog::{
    Arena, Challenge, ChallengeFilter, Course, Mentor, NewArena, NewChallenge, NewCourse,
    NewMentor, NewPost, NewQuest, NewRoadmap, Post, PostKind, Quest, Roadmap,
  },
  clan::{Clan, ClanDetail, ClanMember, NewClan},
  leaderboard::{LeaderboardEntry, LeaderboardQuery},
  message::{ConversationSummary, Message, NewMessage},
  profile::{Onboarding, ProfileUpdate, UserProfile},
  progression::{XpAward, XpSource},
  user::{Credentials, NewUser, Session, User},
};

/// The error type shared by every store trait of one backend.
pub trait Backend: Send + Sync {
  type Error: DomainError;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountStore: Backend {
  /// Fails with `EmailTaken` if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and password hash by (normalised) email.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning an unexpired session with this token digest.
  fn session_user<'a>(
    &'a self,
    token_hash: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Returns `true` if a session was removed.
  fn revoke_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Profiles & rewards ──────────────────────────────────────────────────────

pub trait ProfileStore: Backend {
  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Return the profile, inserting a fresh one on first use. Fails with
  /// `UserNotFound` if the user does not exist.
  fn ensure_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  /// Returns `None` if the user has no profile yet.
  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Apply onboarding answers, inserting the profile if needed.
  fn complete_onboarding(
    &self,
    user_id: Uuid,
    onboarding: Onboarding,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  /// Atomically add `amount` XP (floored at zero), promote the tier if the
  /// new level earns it, and append the award to the XP ledger.
  ///
  /// Not idempotent: each call is a separate award. A missing profile yields
  /// [`XpAward::ProfileMissing`] and writes nothing.
  fn add_xp(
    &self,
    user_id: Uuid,
    amount: i64,
    source: XpSource,
  ) -> impl Future<Output = Result<XpAward, Self::Error>> + Send + '_;

  /// Advance the daily streak for activity on `today`. `None` if the user
  /// has no profile.
  fn record_activity(
    &self,
    user_id: Uuid,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Append `badge` unless already held. `None` if the user has no profile.
  fn award_badge<'a>(
    &'a self,
    user_id: Uuid,
    badge: &'a str,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + 'a;
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

pub trait CatalogStore: Backend {
  /// `true` if no arena, challenge, quest, course or roadmap exists.
  fn catalog_is_empty(
    &self,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_arena(
    &self,
    input: NewArena,
  ) -> impl Future<Output = Result<Arena, Self::Error>> + Send + '_;

  fn list_arenas(
    &self,
  ) -> impl Future<Output = Result<Vec<Arena>, Self::Error>> + Send + '_;

  fn create_challenge(
    &self,
    input: NewChallenge,
  ) -> impl Future<Output = Result<Challenge, Self::Error>> + Send + '_;

  fn get_challenge(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Challenge>, Self::Error>> + Send + '_;

  fn list_challenges<'a>(
    &'a self,
    filter: &'a ChallengeFilter,
  ) -> impl Future<Output = Result<Vec<Challenge>, Self::Error>> + Send + 'a;

  fn create_quest(
    &self,
    input: NewQuest,
  ) -> impl Future<Output = Result<Quest, Self::Error>> + Send + '_;

  fn get_quest(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Quest>, Self::Error>> + Send + '_;

  fn list_quests(
    &self,
  ) -> impl Future<Output = Result<Vec<Quest>, Self::Error>> + Send + '_;

  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses(
    &self,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  fn create_roadmap(
    &self,
    input: NewRoadmap,
  ) -> impl Future<Output = Result<Roadmap, Self::Error>> + Send + '_;

  fn get_roadmap(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Roadmap>, Self::Error>> + Send + '_;

  fn list_roadmaps(
    &self,
  ) -> impl Future<Output = Result<Vec<Roadmap>, Self::Error>> + Send + '_;

  fn create_mentor(
    &self,
    input: NewMentor,
  ) -> impl Future<Output = Result<Mentor, Self::Error>> + Send + '_;

  fn list_mentors(
    &self,
  ) -> impl Future<Output = Result<Vec<Mentor>, Self::Error>> + Send + '_;

  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_posts(
    &self,
    kind: PostKind,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;
}

// ─── Activity trackers ───────────────────────────────────────────────────────

/// Per-user activity records. Every start is idempotent: starting twice
/// returns the existing record. Transitions fail with `NotStarted` when no
/// record exists and `AlreadyCompleted` once the record is completed.
pub trait ActivityStore: Backend {
  fn start_challenge(
    &self,
    user_id: Uuid,
    challenge_id: Uuid,
  ) -> impl Future<Output = Result<UserChallenge, Self::Error>> + Send + '_;

  fn submit_challenge(
    &self,
    user_id: Uuid,
    challenge_id: Uuid,
    submission: Submission,
  ) -> impl Future<Output = Result<Transition<UserChallenge>, Self::Error>> + Send + '_;

  fn list_user_challenges(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserChallenge>, Self::Error>> + Send + '_;

  fn completed_challenge_count(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  fn assign_quest(
    &self,
    user_id: Uuid,
    quest_id: Uuid,
  ) -> impl Future<Output = Result<UserQuest, Self::Error>> + Send + '_;

  fn record_quest_progress(
    &self,
    user_id: Uuid,
    quest_id: Uuid,
    delta: u32,
  ) -> impl Future<Output = Result<Transition<UserQuest>, Self::Error>> + Send + '_;

  fn complete_quest(
    &self,
    user_id: Uuid,
    quest_id: Uuid,
  ) -> impl Future<Output = Result<Transition<UserQuest>, Self::Error>> + Send + '_;

  fn list_user_quests(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserQuest>, Self::Error>> + Send + '_;

  fn start_course(
    &self,
    user_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<UserCourse, Self::Error>> + Send + '_;

  fn record_course_progress(
    &self,
    user_id: Uuid,
    course_id: Uuid,
    percent: u8,
  ) -> impl Future<Output = Result<Transition<UserCourse>, Self::Error>> + Send + '_;

  fn list_user_courses(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserCourse>, Self::Error>> + Send + '_;

  fn start_roadmap(
    &self,
    user_id: Uuid,
    roadmap_id: Uuid,
  ) -> impl Future<Output = Result<UserRoadmap, Self::Error>> + Send + '_;

  fn complete_milestone(
    &self,
    user_id: Uuid,
    roadmap_id: Uuid,
    index: u32,
  ) -> impl Future<Output = Result<Transition<UserRoadmap>, Self::Error>> + Send + '_;

  fn list_user_roadmaps(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserRoadmap>, Self::Error>> + Send + '_;
}

// ─── Social ──────────────────────────────────────────────────────────────────

pub trait SocialStore: Backend {
  /// Content is stored as given. Fails with `UserNotFound` for an unknown
  /// receiver.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages between the two users in either direction, oldest first.
  fn conversation(
    &self,
    user_id: Uuid,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// Mark every message from `partner_id` to `user_id` read; returns how
  /// many changed.
  fn mark_conversation_read(
    &self,
    user_id: Uuid,
    partner_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// One summary per partner, most recent conversation first.
  fn conversations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ConversationSummary>, Self::Error>> + Send + '_;

  /// Create a clan with `owner_id` as its leader and first member.
  fn create_clan(
    &self,
    owner_id: Uuid,
    input: NewClan,
  ) -> impl Future<Output = Result<Clan, Self::Error>> + Send + '_;

  fn list_clans(
    &self,
  ) -> impl Future<Output = Result<Vec<Clan>, Self::Error>> + Send + '_;

  fn get_clan(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ClanDetail>, Self::Error>> + Send + '_;

  /// The capacity check and the insert happen in one transaction. Fails
  /// with `ClanNotFound`, `ClanFull` or `AlreadyMember`.
  fn join_clan(
    &self,
    clan_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<ClanMember, Self::Error>> + Send + '_;
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

pub trait LeaderboardStore: Backend {
  fn leaderboard<'a>(
    &'a self,
    query: &'a LeaderboardQuery,
  ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, Self::Error>> + Send + 'a;
}

/// Everything the API layer needs from a backend.
pub trait Store:
  AccountStore + ProfileStore + CatalogStore + ActivityStore + SocialStore + LeaderboardStore
{
}

impl<T> Store for T where
  T: AccountStore + ProfileStore + CatalogStore + ActivityStore + SocialStore + LeaderboardStore
{
}
