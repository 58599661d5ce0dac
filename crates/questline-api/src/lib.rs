//! JSON REST API for Questline.
//!
//! Exposes an axum [`Router`] backed by any [`questline_core::store::Store`].
//! TLS and process concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", questline_api::api_router(state))
//! ```

pub mod accounts;
pub mod ai;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod challenges;
pub mod clans;
pub mod courses;
pub mod error;
pub mod leaderboard;
pub mod messages;
pub mod profile;
pub mod provider;
pub mod quests;
pub mod rewards;
pub mod roadmaps;
pub mod showcase;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use questline_core::{
  clock::Clock,
  showcase::{FixtureShowcase, Showcase},
  store::Store,
};

pub use cache::CatalogCache;
pub use error::ApiError;
pub use provider::TextGenerator;

/// Default lifetime of a login session.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub cache:       Arc<CatalogCache>,
  pub clock:       Arc<dyn Clock>,
  /// `None` when no provider is configured; AI routes then answer 503.
  pub ai:          Option<Arc<dyn TextGenerator>>,
  pub showcase:    Arc<dyn Showcase>,
  pub session_ttl: chrono::Duration,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      cache:       self.cache.clone(),
      clock:       self.clock.clone(),
      ai:          self.ai.clone(),
      showcase:    self.showcase.clone(),
      session_ttl: self.session_ttl,
    }
  }
}

impl<S> AppState<S> {
  /// State with the fixture showcase, no AI provider and default session TTL.
  pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, cache_ttl: chrono::Duration) -> Self {
    Self {
      store,
      cache: Arc::new(CatalogCache::new(clock.clone(), cache_ttl)),
      clock,
      ai: None,
      showcase: Arc::new(FixtureShowcase),
      session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
    }
  }

  pub fn with_ai(mut self, ai: Arc<dyn TextGenerator>) -> Self {
    self.ai = Some(ai);
    self
  }

  pub fn with_showcase(mut self, showcase: Arc<dyn Showcase>) -> Self {
    self.showcase = showcase;
    self
  }

  pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
    self.session_ttl = ttl;
    self
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/logout", post(accounts::logout::<S>))
    .route("/auth/user", get(accounts::current::<S>))
    // Profile
    .route("/profile", get(profile::get_own::<S>).patch(profile::update::<S>))
    .route("/profile/onboarding", post(profile::onboarding::<S>))
    // Catalog
    .route("/arenas", get(catalog::arenas::<S>))
    .route("/mentors", get(catalog::mentors::<S>))
    .route("/feed", get(catalog::feed::<S>))
    .route("/news", get(catalog::news::<S>))
    // Challenges
    .route("/challenges", get(challenges::list::<S>))
    .route("/challenges/mine", get(challenges::mine::<S>))
    .route("/challenges/{id}", get(challenges::get_one::<S>))
    .route("/challenges/{id}/start", post(challenges::start::<S>))
    .route("/challenges/{id}/submit", post(challenges::submit::<S>))
    // Quests
    .route("/quests", get(quests::list::<S>).post(quests::create::<S>))
    .route("/quests/mine", get(quests::mine::<S>))
    .route("/quests/{id}/start", post(quests::start::<S>))
    .route("/quests/{id}/progress", post(quests::progress::<S>))
    .route("/quests/{id}/complete", post(quests::complete::<S>))
    // Courses
    .route("/courses", get(courses::list::<S>).post(courses::create::<S>))
    .route("/courses/mine", get(courses::mine::<S>))
    .route("/courses/{id}/start", post(courses::start::<S>))
    .route("/courses/{id}/progress", post(courses::progress::<S>))
    // Roadmaps
    .route("/roadmaps", get(roadmaps::list::<S>).post(roadmaps::create::<S>))
    .route("/roadmaps/mine", get(roadmaps::mine::<S>))
    .route("/roadmaps/{id}/start", post(roadmaps::start::<S>))
    .route(
      "/roadmaps/{id}/milestones/{index}/complete",
      post(roadmaps::complete_milestone::<S>),
    )
    // Clans
    .route("/clans", get(clans::list::<S>).post(clans::create::<S>))
    .route("/clans/{id}", get(clans::get_one::<S>))
    .route("/clans/{id}/join", post(clans::join::<S>))
    // Messages
    .route("/messages", post(messages::send::<S>))
    .route("/messages/conversations", get(messages::conversations::<S>))
    .route("/messages/{user_id}", get(messages::thread::<S>))
    // Leaderboard
    .route("/leaderboard", get(leaderboard::handler::<S>))
    // AI mentor
    .route("/ai/chat", post(ai::chat::<S>))
    .route("/ai/explain", post(ai::explain::<S>))
    .route("/ai/debug", post(ai::debug::<S>))
    .route("/ai/quiz", post(ai::quiz::<S>))
    // Showcase fixtures
    .route("/showcase/ai-challenges", get(showcase::ai_challenges::<S>))
    .route("/showcase/shadow-session", get(showcase::shadow_session::<S>))
    .route("/showcase/swarm-projects", get(showcase::swarm_projects::<S>))
    .route("/showcase/tech-spotlight", get(showcase::tech_spotlight::<S>))
    .route("/showcase/analytics", get(showcase::analytics::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
