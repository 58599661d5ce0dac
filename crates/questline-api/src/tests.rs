//! Router tests: requests go through the full axum stack against an
//! in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Duration, TimeZone, Utc};
use questline_core::{
  activity::Submission,
  catalog::{Difficulty, NewChallenge},
  clock::ManualClock,
  progression::XpSource,
  store::{AccountStore, ActivityStore, CatalogStore, ProfileStore},
  user::NewUser,
};
use questline_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  AppState, api_router,
  auth::issue_session,
  provider::{BoxFuture, Prompt, ProviderError, TextGenerator},
};

const CACHE_TTL_MINUTES: i64 = 5;

struct Harness {
  state: AppState<SqliteStore>,
  clock: Arc<ManualClock>,
}

async fn harness() -> Harness {
  let clock = Arc::new(ManualClock::new(
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
  ));
  let store = SqliteStore::open_in_memory()
    .await
    .unwrap()
    .with_clock(clock.clone());
  let state = AppState::new(
    Arc::new(store),
    clock.clone(),
    Duration::minutes(CACHE_TTL_MINUTES),
  );
  Harness { state, clock }
}

async fn call(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Register through the API; returns the new user's id and token.
async fn register(state: &AppState<SqliteStore>, pen_name: &str) -> (Uuid, String) {
  let body = json!({
    "email": format!("{pen_name}@example.com"),
    "penName": pen_name,
    "password": "correct horse",
  });
  let (status, value) = call(state, "POST", "/auth/register", None, Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{value}");
  let id = value["user"]["id"].as_str().unwrap().parse().unwrap();
  let token = value["token"].as_str().unwrap().to_owned();
  (id, token)
}

async fn challenge(state: &AppState<SqliteStore>, title: &str, xp_reward: u32) -> Uuid {
  state
    .store
    .create_challenge(NewChallenge {
      arena_id: None,
      title: title.into(),
      description: "Reverse a string".into(),
      difficulty: Difficulty::Beginner,
      xp_reward,
      language: "rust".into(),
      starter_code: None,
      test_cases: vec![],
    })
    .await
    .unwrap()
    .id
}

fn attempt(score: u32) -> Option<Value> {
  Some(json!({ "code": "fn main() {}", "score": score }))
}

struct Canned(&'static str);

impl TextGenerator for Canned {
  fn generate<'a>(&'a self, _prompt: Prompt) -> BoxFuture<'a, Result<String, ProviderError>> {
    Box::pin(async move { Ok(self.0.to_owned()) })
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_and_current_user() {
  let h = harness().await;
  let (id, token) = register(&h.state, "ada").await;

  let (status, me) = call(&h.state, "GET", "/auth/user", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["id"], id.to_string());
  assert_eq!(me["penName"], "ada");

  let login = json!({ "email": "ADA@example.com", "password": "correct horse" });
  let (status, value) = call(&h.state, "POST", "/auth/login", None, Some(login)).await;
  assert_eq!(status, StatusCode::OK);
  assert_ne!(value["token"].as_str().unwrap(), token);

  let wrong = json!({ "email": "ada@example.com", "password": "battery staple" });
  let (status, value) = call(&h.state, "POST", "/auth/login", None, Some(wrong)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(value["code"], "auth");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
  let h = harness().await;
  register(&h.state, "ada").await;
  let body = json!({ "email": "ada@example.com", "penName": "ada2", "password": "12345678" });
  let (status, value) = call(&h.state, "POST", "/auth/register", None, Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(value["code"], "conflict");
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
  let h = harness().await;
  let (status, value) = call(&h.state, "GET", "/profile", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(value["error"], "Not authenticated");
  assert_eq!(value["code"], "auth");

  let (status, _) = call(&h.state, "GET", "/profile", Some("not-a-token"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_session() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let (status, _) = call(&h.state, "POST", "/auth/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&h.state, "GET", "/auth/user", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_expire() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;
  h.clock.advance(h.state.session_ttl + Duration::seconds(1));
  let (status, _) = call(&h.state, "GET", "/auth/user", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unrepresentable_session_lifetime_is_a_server_error() {
  let h = harness().await;
  let state = h.state.clone().with_session_ttl(chrono::TimeDelta::MAX);
  let body = json!({
    "email": "ada@example.com",
    "penName": "ada",
    "password": "correct horse",
  });
  let (status, value) = call(&state, "POST", "/auth/register", None, Some(body)).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(value["error"], "Internal server error");
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn onboarding_and_profile_update() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let (status, profile) = call(&h.state, "GET", "/profile", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["xp"], 0);
  assert_eq!(profile["level"], 1);
  assert_eq!(profile["xpToNextLevel"], 1000);
  assert_eq!(profile["onboardingComplete"], false);

  let onboarding = json!({
    "interests": ["rust", "ai"],
    "learningPace": "steady",
    "learningStyle": "hands-on",
    "techTier": "builder",
  });
  let (status, profile) =
    call(&h.state, "POST", "/profile/onboarding", Some(&token), Some(onboarding)).await;
  assert_eq!(status, StatusCode::OK, "{profile}");
  assert_eq!(profile["onboardingComplete"], true);
  assert_eq!(profile["techTier"], "builder");

  let update = json!({ "bio": "Learning Rust" });
  let (status, profile) = call(&h.state, "PATCH", "/profile", Some(&token), Some(update)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["bio"], "Learning Rust");
  assert_eq!(profile["learningPace"], "steady");
}

// ─── Challenges & rewards ────────────────────────────────────────────────────

#[tokio::test]
async fn completing_a_challenge_awards_xp_once() {
  let h = harness().await;
  let (user_id, token) = register(&h.state, "ada").await;
  let id = challenge(&h.state, "Reverse", 100).await;
  h.state.store.add_xp(user_id, 950, XpSource::Bonus).await.unwrap();

  let start = format!("/challenges/{id}/start");
  let submit = format!("/challenges/{id}/submit");
  let (status, record) = call(&h.state, "POST", &start, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(record["status"], "in_progress");

  let (status, value) = call(&h.state, "POST", &submit, Some(&token), attempt(40)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(value["newlyCompleted"], false);
  assert!(value.get("achievement").is_none());

  let (status, value) = call(&h.state, "POST", &submit, Some(&token), attempt(100)).await;
  assert_eq!(status, StatusCode::OK, "{value}");
  assert_eq!(value["record"]["status"], "completed");
  assert_eq!(value["record"]["attempts"], 2);
  let reward = &value["achievement"]["reward"];
  assert_eq!(value["achievement"]["xpReward"], 100);
  assert_eq!(reward["xpAwarded"], 100);
  assert_eq!(reward["totalXp"], 1050);
  assert_eq!(reward["level"], 2);
  assert_eq!(reward["leveledUp"], true);
  assert_eq!(reward["dailyStreak"], 1);
  assert!(reward["badges"].as_array().unwrap().contains(&json!("first-challenge")));

  let (status, value) = call(&h.state, "POST", &submit, Some(&token), attempt(100)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(value["code"], "conflict");

  let (_, profile) = call(&h.state, "GET", "/profile", Some(&token), None).await;
  assert_eq!(profile["xp"], 1050);
}

#[tokio::test]
async fn first_challenge_badge_survives_an_earlier_completion() {
  let h = harness().await;
  let (user_id, token) = register(&h.state, "ada").await;
  let earlier = challenge(&h.state, "Earlier", 10).await;
  let later = challenge(&h.state, "Later", 10).await;

  // Completed behind the handlers' back, as a concurrent request would.
  h.state.store.start_challenge(user_id, earlier).await.unwrap();
  let passing = Submission { code: "fn main() {}".into(), score: 90 };
  h.state.store.submit_challenge(user_id, earlier, passing).await.unwrap();

  call(&h.state, "POST", &format!("/challenges/{later}/start"), Some(&token), None).await;
  let (status, value) = call(
    &h.state,
    "POST",
    &format!("/challenges/{later}/submit"),
    Some(&token),
    attempt(90),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{value}");
  let badges = value["achievement"]["reward"]["badges"].as_array().unwrap();
  assert_eq!(
    badges.iter().filter(|b| *b == "first-challenge").count(),
    1,
    "{badges:?}"
  );
}

#[tokio::test]
async fn completion_without_profile_reports_null_reward() {
  let h = harness().await;
  let input = NewUser::new("ghost@example.com", "ghost", "unused".into()).unwrap();
  let user = h.state.store.create_user(input).await.unwrap();
  let token = issue_session(&h.state, user.id).await.unwrap();
  let id = challenge(&h.state, "Reverse", 100).await;

  call(&h.state, "POST", &format!("/challenges/{id}/start"), Some(&token), None).await;
  let (status, value) = call(
    &h.state,
    "POST",
    &format!("/challenges/{id}/submit"),
    Some(&token),
    attempt(90),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{value}");
  assert_eq!(value["newlyCompleted"], true);
  assert!(value["achievement"]["reward"].is_null());
  assert!(h.state.store.get_profile(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn submission_validation_and_missing_records() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;
  let id = challenge(&h.state, "Reverse", 100).await;
  let submit = format!("/challenges/{id}/submit");

  let (status, _) = call(&h.state, "POST", &submit, Some(&token), attempt(80)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  call(&h.state, "POST", &format!("/challenges/{id}/start"), Some(&token), None).await;
  let (status, value) = call(&h.state, "POST", &submit, Some(&token), attempt(101)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(value["code"], "validation");

  let unknown = Uuid::new_v4();
  let (status, _) =
    call(&h.state, "POST", &format!("/challenges/{unknown}/start"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Catalog cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_listings_are_cached_until_the_ttl_elapses() {
  let h = harness().await;
  let first = challenge(&h.state, "First", 50).await;

  let (_, listed) = call(&h.state, "GET", "/challenges", None, None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  challenge(&h.state, "Second", 50).await;
  let (_, listed) = call(&h.state, "GET", "/challenges", None, None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  let (status, one) = call(&h.state, "GET", &format!("/challenges/{first}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(one["title"], "First");

  h.clock.advance(Duration::minutes(CACHE_TTL_MINUTES));
  let (_, listed) = call(&h.state, "GET", "/challenges", None, None).await;
  assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn creating_a_quest_invalidates_the_cached_list() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let (_, listed) = call(&h.state, "GET", "/quests", None, None).await;
  assert!(listed.as_array().unwrap().is_empty());

  let quest = json!({
    "title": "Solve three puzzles",
    "description": "Any arena",
    "period": "daily",
    "target": 3,
    "xpReward": 30,
  });
  let (status, created) = call(&h.state, "POST", "/quests", Some(&token), Some(quest)).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");

  let (_, listed) = call(&h.state, "GET", "/quests", None, None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);

  let id = created["id"].as_str().unwrap();
  call(&h.state, "POST", &format!("/quests/{id}/start"), Some(&token), None).await;
  let progress = format!("/quests/{id}/progress");
  let (_, value) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "delta": 2 }))).await;
  assert_eq!(value["record"]["progress"], 2);
  let (_, value) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "delta": 5 }))).await;
  assert_eq!(value["record"]["progress"], 3);
  assert_eq!(value["achievement"]["reward"]["totalXp"], 30);
}

#[tokio::test]
async fn course_progress_rewards_at_full_completion() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let course = json!({
    "title": "Ownership",
    "description": "Moves and borrows",
    "difficulty": "beginner",
    "xpReward": 200,
  });
  let (status, created) = call(&h.state, "POST", "/courses", Some(&token), Some(course)).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  let id = created["id"].as_str().unwrap();
  let progress = format!("/courses/{id}/progress");

  let (status, _) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "percent": 10 }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  call(&h.state, "POST", &format!("/courses/{id}/start"), Some(&token), None).await;
  let (_, value) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "percent": 70 }))).await;
  assert_eq!(value["newlyCompleted"], false);
  let (_, value) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "percent": 40 }))).await;
  assert_eq!(value["record"]["progress"], 70);
  assert!(value.get("achievement").is_none());

  let (status, value) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "percent": 100 }))).await;
  assert_eq!(status, StatusCode::OK, "{value}");
  assert_eq!(value["record"]["status"], "completed");
  assert_eq!(value["achievement"]["kind"], "course");
  assert_eq!(value["achievement"]["reward"]["totalXp"], 200);
  assert_eq!(value["achievement"]["reward"]["dailyStreak"], 1);

  let (status, _) =
    call(&h.state, "POST", &progress, Some(&token), Some(json!({ "percent": 100 }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, mine) = call(&h.state, "GET", "/courses/mine", Some(&token), None).await;
  assert_eq!(mine[0]["progress"], 100);
}

#[tokio::test]
async fn finishing_every_milestone_completes_the_roadmap() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let roadmap = json!({
    "title": "Rust in a month",
    "description": "From zero to traits",
    "difficulty": "intermediate",
    "xpReward": 500,
    "estimatedWeeks": 2,
    "milestones": [
      { "title": "Basics", "description": "", "week": 1 },
      { "title": "Traits", "description": "", "week": 2 },
    ],
  });
  let (status, created) = call(&h.state, "POST", "/roadmaps", Some(&token), Some(roadmap)).await;
  assert_eq!(status, StatusCode::CREATED, "{created}");
  let id = created["id"].as_str().unwrap();
  let milestone = |index: u32| format!("/roadmaps/{id}/milestones/{index}/complete");

  let (status, record) =
    call(&h.state, "POST", &format!("/roadmaps/{id}/start"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(record["milestoneCount"], 2);

  let (status, value) = call(&h.state, "POST", &milestone(1), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK, "{value}");
  assert_eq!(value["newlyCompleted"], false);
  assert!(value.get("achievement").is_none());

  let (status, value) = call(&h.state, "POST", &milestone(2), Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(value["code"], "validation");

  let (status, value) = call(&h.state, "POST", &milestone(0), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK, "{value}");
  assert_eq!(value["record"]["status"], "completed");
  assert_eq!(value["achievement"]["kind"], "roadmap");
  assert_eq!(value["achievement"]["reward"]["totalXp"], 500);
  assert_eq!(value["achievement"]["reward"]["dailyStreak"], 1);

  let (status, _) = call(&h.state, "POST", &milestone(1), Some(&token), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Clans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn joining_a_full_clan_conflicts() {
  let h = harness().await;
  let (_, owner) = register(&h.state, "ada").await;
  let (_, second) = register(&h.state, "grace").await;
  let (_, third) = register(&h.state, "linus").await;

  let body = json!({ "name": "Rustaceans", "maxMembers": 2 });
  let (status, clan) = call(&h.state, "POST", "/clans", Some(&owner), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{clan}");
  assert_eq!(clan["memberCount"], 1);

  let join = format!("/clans/{}/join", clan["id"].as_str().unwrap());
  let (status, member) = call(&h.state, "POST", &join, Some(&second), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(member["role"], "member");

  let (status, value) = call(&h.state, "POST", &join, Some(&third), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(value["code"], "conflict");

  let (_, detail) = call(
    &h.state,
    "GET",
    &format!("/clans/{}", clan["id"].as_str().unwrap()),
    None,
    None,
  )
  .await;
  assert_eq!(detail["memberCount"], 2);
  assert_eq!(detail["members"].as_array().unwrap().len(), 2);
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_messages_are_accepted_and_reading_clears_unread() {
  let h = harness().await;
  let (ada_id, ada) = register(&h.state, "ada").await;
  let (grace_id, grace) = register(&h.state, "grace").await;

  let body = json!({ "receiverId": grace_id, "content": "" });
  let (status, message) = call(&h.state, "POST", "/messages", Some(&ada), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{message}");
  assert_eq!(message["content"], "");
  assert_eq!(message["isRead"], false);

  let (_, summaries) = call(&h.state, "GET", "/messages/conversations", Some(&grace), None).await;
  assert_eq!(summaries[0]["partnerId"], ada_id.to_string());
  assert_eq!(summaries[0]["partnerPenName"], "ada");
  assert_eq!(summaries[0]["unreadCount"], 1);

  let (status, thread) =
    call(&h.state, "GET", &format!("/messages/{ada_id}"), Some(&grace), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(thread.as_array().unwrap().len(), 1);

  let (_, summaries) = call(&h.state, "GET", "/messages/conversations", Some(&grace), None).await;
  assert_eq!(summaries[0]["unreadCount"], 0);

  let body = json!({ "receiverId": Uuid::new_v4(), "content": "hello?" });
  let (status, _) = call(&h.state, "POST", "/messages", Some(&ada), Some(body)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Leaderboard ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn leaderboard_ranks_by_xp() {
  let h = harness().await;
  let (ada, _) = register(&h.state, "ada").await;
  let (grace, _) = register(&h.state, "grace").await;
  h.state.store.add_xp(ada, 300, XpSource::Bonus).await.unwrap();
  h.state.store.add_xp(grace, 1200, XpSource::Bonus).await.unwrap();

  let (status, board) = call(&h.state, "GET", "/leaderboard?limit=1", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let board = board.as_array().unwrap();
  assert_eq!(board.len(), 1);
  assert_eq!(board[0]["penName"], "grace");
  assert_eq!(board[0]["rank"], 1);
  assert_eq!(board[0]["level"], 2);

  let (status, _) =
    call(&h.state, "GET", "/leaderboard?category=streak&period=weekly", None, None).await;
  assert_eq!(status, StatusCode::OK);
}

// ─── AI & showcase ───────────────────────────────────────────────────────────

#[tokio::test]
async fn ai_routes_are_unavailable_without_a_provider() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;
  let body = json!({ "message": "What is a lifetime?" });
  let (status, value) = call(&h.state, "POST", "/ai/chat", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(value["code"], "server");
}

#[tokio::test]
async fn quiz_is_parsed_from_the_provider_reply() {
  let h = harness().await;
  let reply = "```json\n{\"question\":\"Which keyword moves a closure's captures?\",\
               \"options\":[\"ref\",\"move\",\"static\"],\"correctAnswer\":1,\
               \"explanation\":\"`move` takes ownership.\"}\n```";
  let state = h.state.clone().with_ai(Arc::new(Canned(reply)));
  let (_, token) = register(&state, "ada").await;

  let body = json!({ "topic": "closures", "difficulty": "intermediate" });
  let (status, quiz) = call(&state, "POST", "/ai/quiz", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::OK, "{quiz}");
  assert_eq!(quiz["correctAnswer"], 1);
  assert_eq!(quiz["options"][1], "move");

  let (status, value) = call(
    &state,
    "POST",
    "/ai/explain",
    Some(&token),
    Some(json!({ "code": "let x = 1;", "language": "rust" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(value["explanation"].as_str().unwrap().contains("move"));
}

#[tokio::test]
async fn unusable_quiz_is_a_bad_gateway() {
  let h = harness().await;
  let state = h.state.clone().with_ai(Arc::new(Canned("I'd rather not.")));
  let (_, token) = register(&state, "ada").await;
  let body = json!({ "topic": "closures" });
  let (status, value) = call(&state, "POST", "/ai/quiz", Some(&token), Some(body)).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(value["code"], "network");
}

#[tokio::test]
async fn showcase_requires_a_session_and_is_deterministic() {
  let h = harness().await;
  let (_, token) = register(&h.state, "ada").await;

  let (status, _) = call(&h.state, "GET", "/showcase/swarm-projects", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let uri = "/showcase/shadow-session?topic=rust";
  let (status, first) = call(&h.state, "GET", uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  let (_, second) = call(&h.state, "GET", uri, Some(&token), None).await;
  assert_eq!(first, second);

  let (status, analytics) = call(&h.state, "GET", "/showcase/analytics", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(analytics["xpToNextLevel"], 1000);
}
