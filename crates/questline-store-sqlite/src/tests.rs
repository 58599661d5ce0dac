//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use questline_core::{
  Error as CoreError,
  activity::{ActivityStatus, ContentKind, Submission},
  catalog::{
    ChallengeFilter, Difficulty, Lesson, Milestone, NewArena, NewChallenge, NewCourse,
    NewPost, NewQuest, NewRoadmap, PostKind, QuestPeriod,
  },
  clan::{ClanRole, NewClan},
  clock::{Clock, ManualClock},
  leaderboard::{LeaderboardCategory, LeaderboardPeriod, LeaderboardQuery},
  message::NewMessage,
  profile::Onboarding,
  progression::{TechTier, XpAward, XpSource},
  store::{
    AccountStore, ActivityStore, CatalogStore, LeaderboardStore, ProfileStore, SocialStore,
  },
  user::{NewUser, Session, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn store_at(clock: &Arc<ManualClock>) -> SqliteStore {
  store().await.with_clock(clock.clone())
}

fn start() -> chrono::DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() }

/// Register a user and give them a profile.
async fn user(s: &SqliteStore, pen_name: &str) -> User {
  let input =
    NewUser::new(&format!("{pen_name}@example.com"), pen_name, "hash".into()).unwrap();
  let user = s.create_user(input).await.unwrap();
  s.ensure_profile(user.id).await.unwrap();
  user
}

async fn challenge(s: &SqliteStore, title: &str, difficulty: Difficulty) -> Uuid {
  s.create_challenge(NewChallenge {
    arena_id: None,
    title: title.into(),
    description: "Write it".into(),
    difficulty,
    xp_reward: 100,
    language: "rust".into(),
    starter_code: None,
    test_cases: vec![],
  })
  .await
  .unwrap()
  .id
}

fn attempt(score: u32) -> Submission {
  Submission { code: "fn main() {}".into(), score }
}

const BONUS: XpSource = XpSource::Bonus;

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "ada").await;

  let again = NewUser::new("ADA@example.com", "ada2", "hash".into()).unwrap();
  let err = s.create_user(again).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::EmailTaken(_))));
}

#[tokio::test]
async fn credentials_are_found_by_normalised_email() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let creds = s.find_credentials("  Ada@Example.com").await.unwrap().unwrap();
  assert_eq!(creds.user, ada);
  assert_eq!(creds.password_hash, "hash");
  assert!(s.find_credentials("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_expire_and_revoke() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let now = start();

  s.create_session(Session {
    token_hash: "abc".into(),
    user_id:    ada.id,
    created_at: now,
    expires_at: now + Duration::hours(1),
  })
  .await
  .unwrap();

  assert_eq!(s.session_user("abc", now).await.unwrap(), Some(ada));
  assert!(s.session_user("abc", now + Duration::hours(2)).await.unwrap().is_none());
  assert!(s.revoke_session("abc").await.unwrap());
  assert!(!s.revoke_session("abc").await.unwrap());
  assert!(s.session_user("abc", now).await.unwrap().is_none());
}

// ─── Profiles and XP ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_profile_is_idempotent_and_needs_a_user() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.add_xp(ada.id, 10, BONUS).await.unwrap();

  let profile = s.ensure_profile(ada.id).await.unwrap();
  assert_eq!(profile.xp, 10);

  let err = s.ensure_profile(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

#[tokio::test]
async fn crossing_a_level_boundary() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.add_xp(ada.id, 950, BONUS).await.unwrap();

  let outcome = s.add_xp(ada.id, 100, BONUS).await.unwrap().applied().unwrap();
  assert_eq!(outcome.profile.xp, 1050);
  assert_eq!(outcome.profile.level, 2);
  assert_eq!(outcome.previous_level, 1);
  assert!(outcome.leveled_up());

  let stored = s.get_profile(ada.id).await.unwrap().unwrap();
  assert_eq!((stored.xp, stored.level), (1050, 2));
}

#[tokio::test]
async fn award_without_profile_creates_nothing() {
  let s = store().await;
  let input = NewUser::new("bob@example.com", "bob", "hash".into()).unwrap();
  let bob = s.create_user(input).await.unwrap();

  let award = s.add_xp(bob.id, 100, BONUS).await.unwrap();
  assert!(matches!(award, XpAward::ProfileMissing));
  assert!(s.get_profile(bob.id).await.unwrap().is_none());
}

#[tokio::test]
async fn negative_awards_floor_at_zero() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.add_xp(ada.id, 100, BONUS).await.unwrap();

  let outcome = s.add_xp(ada.id, -500, BONUS).await.unwrap().applied().unwrap();
  assert_eq!(outcome.profile.xp, 0);
  assert_eq!(outcome.applied, -100);
}

#[tokio::test]
async fn concurrent_awards_are_not_lost() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let (a, b) = (s.clone(), s.clone());

  let (r1, r2) = tokio::join!(a.add_xp(ada.id, 100, BONUS), b.add_xp(ada.id, 100, BONUS));
  r1.unwrap();
  r2.unwrap();

  assert_eq!(s.get_profile(ada.id).await.unwrap().unwrap().xp, 200);
}

#[tokio::test]
async fn reaching_a_tier_promotes_once_with_a_badge() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let outcome = s.add_xp(ada.id, 2000, BONUS).await.unwrap().applied().unwrap();
  assert_eq!(outcome.profile.level, 3);
  assert_eq!(outcome.promoted_to, Some(TechTier::Explorer));
  assert_eq!(outcome.profile.tech_tier, TechTier::Explorer);

  let outcome = s.add_xp(ada.id, 10, BONUS).await.unwrap().applied().unwrap();
  assert_eq!(outcome.promoted_to, None);
  assert_eq!(outcome.profile.badges, vec!["tier:explorer".to_string()]);
}

#[tokio::test]
async fn onboarding_after_earning_a_tier_keeps_it() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let outcome = s.add_xp(ada.id, 5000, BONUS).await.unwrap().applied().unwrap();
  assert_eq!(outcome.profile.tech_tier, TechTier::Builder);

  let onboarding: Onboarding = serde_json::from_value(serde_json::json!({
    "interests": ["rust"],
    "learningPace": "steady",
    "learningStyle": "reading"
  }))
  .unwrap();
  let p = s.complete_onboarding(ada.id, onboarding).await.unwrap();
  assert!(p.onboarding_complete);
  assert_eq!(p.tech_tier, TechTier::Builder);
  assert_eq!(s.get_profile(ada.id).await.unwrap().unwrap().tech_tier, TechTier::Builder);
}

#[tokio::test]
async fn streak_extends_on_consecutive_days() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

  for d in [1, 2, 2, 3] {
    s.record_activity(ada.id, day(d)).await.unwrap();
  }
  let p = s.get_profile(ada.id).await.unwrap().unwrap();
  assert_eq!(p.daily_streak, 3);
  assert_eq!(p.last_active_on, Some(day(3)));

  let p = s.record_activity(ada.id, day(6)).await.unwrap().unwrap();
  assert_eq!(p.daily_streak, 1);
}

#[tokio::test]
async fn badges_are_not_duplicated() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  s.award_badge(ada.id, "first-challenge").await.unwrap();
  let p = s.award_badge(ada.id, "first-challenge").await.unwrap().unwrap();
  assert_eq!(p.badges, vec!["first-challenge".to_string()]);
  assert!(s.award_badge(Uuid::new_v4(), "x").await.unwrap().is_none());
}

// ─── Activity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn starting_a_challenge_twice_keeps_one_record() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let c = challenge(&s, "Two sum", Difficulty::Beginner).await;

  s.start_challenge(ada.id, c).await.unwrap();
  s.submit_challenge(ada.id, c, attempt(10)).await.unwrap();
  let again = s.start_challenge(ada.id, c).await.unwrap();

  assert_eq!(again.attempts, 1);
  assert_eq!(s.list_user_challenges(ada.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn challenge_completes_at_the_passing_score_and_locks() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let c = challenge(&s, "Two sum", Difficulty::Beginner).await;
  s.start_challenge(ada.id, c).await.unwrap();

  let t = s.submit_challenge(ada.id, c, attempt(69)).await.unwrap();
  assert!(!t.newly_completed);
  assert_eq!(t.record.status, ActivityStatus::InProgress);

  let t = s.submit_challenge(ada.id, c, attempt(70)).await.unwrap();
  assert!(t.newly_completed);
  assert_eq!(t.record.best_score, Some(70));
  assert_eq!(s.completed_challenge_count(ada.id).await.unwrap(), 1);

  let err = s.submit_challenge(ada.id, c, attempt(100)).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyCompleted { .. })));
  let stored = &s.list_user_challenges(ada.id).await.unwrap()[0];
  assert_eq!(stored.attempts, 2);
}

#[tokio::test]
async fn submitting_requires_a_started_known_challenge() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let c = challenge(&s, "Two sum", Difficulty::Beginner).await;

  let err = s.submit_challenge(ada.id, c, attempt(80)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::NotStarted { kind: ContentKind::Challenge, .. })
  ));

  let err = s.start_challenge(ada.id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ContentNotFound { .. })));
}

#[tokio::test]
async fn quest_progress_completes_at_target() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let quest = s
    .create_quest(NewQuest {
      arena_id:    None,
      title:       "Solve three".into(),
      description: String::new(),
      period:      QuestPeriod::Daily,
      target:      3,
      xp_reward:   50,
    })
    .await
    .unwrap();

  let err = s.record_quest_progress(ada.id, quest.id, 1).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NotStarted { .. })));

  s.assign_quest(ada.id, quest.id).await.unwrap();
  assert!(!s.record_quest_progress(ada.id, quest.id, 2).await.unwrap().newly_completed);
  assert!(s.complete_quest(ada.id, quest.id).await.is_err());
  let t = s.record_quest_progress(ada.id, quest.id, 5).await.unwrap();
  assert!(t.newly_completed);
  assert_eq!(t.record.progress, 3);

  let quests = s.list_user_quests(ada.id).await.unwrap();
  assert_eq!(quests[0].status, ActivityStatus::Completed);
}

#[tokio::test]
async fn course_progress_never_decreases_and_locks_at_full() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let course = s
    .create_course(NewCourse {
      arena_id:    None,
      title:       "Ownership".into(),
      description: String::new(),
      difficulty:  Difficulty::Beginner,
      xp_reward:   200,
      lessons:     vec![Lesson {
        title:            "Moves".into(),
        content:          "Values move.".into(),
        duration_minutes: 10,
      }],
    })
    .await
    .unwrap();

  let err = s.record_course_progress(ada.id, course.id, 10).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::NotStarted { kind: ContentKind::Course, .. })
  ));

  let started = s.start_course(ada.id, course.id).await.unwrap();
  assert_eq!(started.progress, 0);
  assert_eq!(started.status, ActivityStatus::InProgress);

  assert!(!s.record_course_progress(ada.id, course.id, 60).await.unwrap().newly_completed);
  let t = s.record_course_progress(ada.id, course.id, 30).await.unwrap();
  assert!(!t.newly_completed);
  assert_eq!(t.record.progress, 60);
  assert_eq!(s.list_user_courses(ada.id).await.unwrap()[0].progress, 60);

  let err = s.record_course_progress(ada.id, course.id, 101).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Invalid(_))));

  let t = s.record_course_progress(ada.id, course.id, 100).await.unwrap();
  assert!(t.newly_completed);
  assert_eq!(t.record.status, ActivityStatus::Completed);

  let err = s.record_course_progress(ada.id, course.id, 100).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyCompleted { .. })));

  let again = s.start_course(ada.id, course.id).await.unwrap();
  assert_eq!(again.progress, 100);
  let stored = &s.list_user_courses(ada.id).await.unwrap()[0];
  assert_eq!(stored.status, ActivityStatus::Completed);
  assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn roadmap_completes_when_all_milestones_are_done() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let milestone = |week| Milestone { title: format!("Week {week}"), description: String::new(), week };
  let roadmap = s
    .create_roadmap(NewRoadmap {
      title:           "Rust".into(),
      description:     String::new(),
      difficulty:      Difficulty::Intermediate,
      xp_reward:       500,
      estimated_weeks: 2,
      milestones:      vec![milestone(1), milestone(2)],
    })
    .await
    .unwrap();

  let started = s.start_roadmap(ada.id, roadmap.id).await.unwrap();
  assert_eq!(started.milestone_count, 2);
  assert!(!s.complete_milestone(ada.id, roadmap.id, 1).await.unwrap().newly_completed);
  assert!(s.complete_milestone(ada.id, roadmap.id, 2).await.is_err());
  assert!(s.complete_milestone(ada.id, roadmap.id, 0).await.unwrap().newly_completed);

  let stored = &s.list_user_roadmaps(ada.id).await.unwrap()[0];
  assert_eq!(stored.completed_milestones.len(), 2);
  assert!(stored.completed_at.is_some());
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_listing_and_filters() {
  let s = store().await;
  assert!(s.catalog_is_empty().await.unwrap());

  let arena = s
    .create_arena(NewArena {
      slug:        "Systems".into(),
      name:        "Systems".into(),
      description: "Low level".into(),
      icon:        None,
    })
    .await
    .unwrap();
  assert_eq!(arena.slug, "systems");
  assert!(!s.catalog_is_empty().await.unwrap());

  challenge(&s, "Easy", Difficulty::Beginner).await;
  challenge(&s, "Hard", Difficulty::Expert).await;

  let all = s.list_challenges(&ChallengeFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  let hard = ChallengeFilter { arena_id: None, difficulty: Some(Difficulty::Expert) };
  let hard = s.list_challenges(&hard).await.unwrap();
  assert_eq!(hard.len(), 1);
  assert_eq!(hard[0].title, "Hard");
}

#[tokio::test]
async fn posts_are_newest_first_and_limited() {
  let s = store().await;
  for day in 1..=3 {
    s.create_post(NewPost {
      kind:         PostKind::News,
      title:        format!("Day {day}"),
      body:         String::new(),
      author:       "Editor".into(),
      tags:         vec![],
      published_at: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
    })
    .await
    .unwrap();
  }

  let news = s.list_posts(PostKind::News, 2).await.unwrap();
  assert_eq!(
    news.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
    vec!["Day 3", "Day 2"]
  );
  assert!(s.list_posts(PostKind::Feed, 10).await.unwrap().is_empty());
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn conversations_summarise_latest_message_and_unread() {
  let clock = Arc::new(ManualClock::new(start()));
  let s = store_at(&clock).await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;

  let send = |from: Uuid, to: Uuid, content: &str| NewMessage {
    sender_id:   from,
    receiver_id: to,
    content:     content.into(),
  };

  s.send_message(send(bob.id, ada.id, "hi")).await.unwrap();
  clock.advance(Duration::seconds(1));
  // The store accepts empty content; the composer rule lives elsewhere.
  s.send_message(send(bob.id, ada.id, "")).await.unwrap();
  clock.advance(Duration::seconds(1));
  s.send_message(send(ada.id, bob.id, "hello")).await.unwrap();

  let thread = s.conversation(ada.id, bob.id).await.unwrap();
  assert_eq!(
    thread.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
    vec!["hi", "", "hello"]
  );

  let summaries = s.conversations(ada.id).await.unwrap();
  assert_eq!(summaries.len(), 1);
  assert_eq!(summaries[0].partner_id, bob.id);
  assert_eq!(summaries[0].partner_pen_name, "bob");
  assert_eq!(summaries[0].last_message.content, "hello");
  assert_eq!(summaries[0].unread_count, 2);

  assert_eq!(s.mark_conversation_read(ada.id, bob.id).await.unwrap(), 2);
  assert_eq!(s.conversations(ada.id).await.unwrap()[0].unread_count, 0);
  // Bob's copy of ada's message is still unread on his side.
  assert_eq!(s.conversations(bob.id).await.unwrap()[0].unread_count, 1);
}

#[tokio::test]
async fn messages_to_unknown_users_are_rejected() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let err = s
    .send_message(NewMessage { sender_id: ada.id, receiver_id: Uuid::new_v4(), content: "?".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

// ─── Clans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn clan_capacity_includes_the_owner() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let cy = user(&s, "cy").await;

  let clan = s
    .create_clan(ada.id, NewClan {
      name:        "Borrow Checkers".into(),
      description: String::new(),
      max_members: 2,
    })
    .await
    .unwrap();
  assert_eq!(clan.member_count, 1);

  let member = s.join_clan(clan.id, bob.id).await.unwrap();
  assert_eq!(member.role, ClanRole::Member);
  assert_eq!(member.pen_name, "bob");

  let err = s.join_clan(clan.id, cy.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ClanFull { max_members: 2, .. })));
  let err = s.join_clan(clan.id, bob.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyMember { .. })));

  let detail = s.get_clan(clan.id).await.unwrap().unwrap();
  assert_eq!(detail.clan.member_count, 2);
  assert_eq!(detail.members[0].role, ClanRole::Leader);
  assert_eq!(detail.members[0].user_id, ada.id);
}

#[tokio::test]
async fn concurrent_joins_never_exceed_capacity() {
  let s = store().await;
  let owner = user(&s, "owner").await;
  let clan = s
    .create_clan(owner.id, NewClan { name: "Tiny".into(), description: String::new(), max_members: 2 })
    .await
    .unwrap();
  let a = user(&s, "a").await;
  let b = user(&s, "b").await;

  let (s1, s2) = (s.clone(), s.clone());
  let (r1, r2) = tokio::join!(s1.join_clan(clan.id, a.id), s2.join_clan(clan.id, b.id));
  assert_eq!([r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count(), 1);
  assert_eq!(s.get_clan(clan.id).await.unwrap().unwrap().members.len(), 2);
}

#[tokio::test]
async fn clan_names_are_unique_ignoring_case() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let new = |name: &str| NewClan { name: name.into(), description: String::new(), max_members: 5 };

  s.create_clan(ada.id, new("Rustaceans")).await.unwrap();
  let err = s.create_clan(ada.id, new("rustaceans")).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ClanNameTaken(_))));
  assert!(matches!(
    s.join_clan(Uuid::new_v4(), ada.id).await.unwrap_err(),
    Error::Core(CoreError::ClanNotFound(_))
  ));
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_time_xp_ranks_with_pen_name_tiebreak() {
  let s = store().await;
  let zed = user(&s, "zed").await;
  let amy = user(&s, "amy").await;
  let top = user(&s, "top").await;
  for (u, xp) in [(zed.id, 500), (amy.id, 500), (top.id, 2500)] {
    s.add_xp(u, xp, BONUS).await.unwrap();
  }

  let q = LeaderboardQuery::new(LeaderboardCategory::Xp, LeaderboardPeriod::AllTime, None, start());
  let board = s.leaderboard(&q).await.unwrap();
  let names: Vec<_> = board.iter().map(|e| e.pen_name.as_str()).collect();
  assert_eq!(names, vec!["top", "amy", "zed"]);
  assert_eq!(board[0].rank, 1);
  assert_eq!(board[0].score, 2500);
  assert_eq!(board[0].level, 3);
  assert_eq!(board[0].tech_tier, TechTier::Explorer);
}

#[tokio::test]
async fn weekly_xp_only_counts_the_window() {
  let clock = Arc::new(ManualClock::new(start()));
  let s = store_at(&clock).await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;

  s.add_xp(ada.id, 1000, BONUS).await.unwrap();
  clock.advance(Duration::days(10));
  s.add_xp(bob.id, 300, BONUS).await.unwrap();
  s.add_xp(ada.id, 100, BONUS).await.unwrap();

  let q = LeaderboardQuery::new(LeaderboardCategory::Xp, LeaderboardPeriod::Weekly, None, clock.now());
  let board = s.leaderboard(&q).await.unwrap();
  assert_eq!(board[0].pen_name, "bob");
  assert_eq!(board[0].score, 300);
  assert_eq!(board[1].score, 100);
}

#[tokio::test]
async fn challenge_board_counts_completions() {
  let s = store().await;
  let ada = user(&s, "ada").await;
  let bob = user(&s, "bob").await;
  let c = challenge(&s, "Two sum", Difficulty::Beginner).await;
  s.start_challenge(ada.id, c).await.unwrap();
  s.submit_challenge(ada.id, c, attempt(90)).await.unwrap();
  s.start_challenge(bob.id, c).await.unwrap();

  let q = LeaderboardQuery::new(
    LeaderboardCategory::Challenges,
    LeaderboardPeriod::Monthly,
    Some(1),
    Utc::now(),
  );
  let board = s.leaderboard(&q).await.unwrap();
  assert_eq!(board.len(), 1);
  assert_eq!(board[0].user_id, ada.id);
  assert_eq!(board[0].score, 1);
}
