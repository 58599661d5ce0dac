//! Questline server: configuration, start-up wiring and catalog seeding.
//!
//! The binary in `main.rs` is a thin shell over [`ServerConfig::load`],
//! [`build_state`] and [`app`].

pub mod seed;

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, bail};
use axum::Router;
use chrono::TimeDelta;
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use questline_api::{AppState, api_router, provider::{AiConfig, OpenAiCompatible}};
use questline_core::clock::{Clock, SystemClock};
use questline_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `questline.toml` and
/// `QUESTLINE_*` environment variables (nested keys use `__`, e.g.
/// `QUESTLINE_AI__API_KEY`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  pub database_path:          String,
  pub catalog_cache_ttl_secs: i64,
  pub session_ttl_hours:      i64,
  /// Load the bundled catalog into an empty database at start-up.
  pub seed_catalog:           bool,
  /// Leave unset to disable the AI routes.
  pub ai:                     Option<AiConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                   "127.0.0.1".to_string(),
      port:                   5000,
      database_path:          "questline.db".to_string(),
      catalog_cache_ttl_secs: 300,
      session_ttl_hours:      questline_api::DEFAULT_SESSION_TTL_HOURS,
      seed_catalog:           true,
      ai:                     None,
    }
  }
}

impl ServerConfig {
  /// Read `path` if it exists, then apply environment overrides.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  fn from_builder(builder: config::ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(
        Environment::with_prefix("QUESTLINE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn catalog_cache_ttl(&self) -> anyhow::Result<TimeDelta> {
    positive(
      "catalog_cache_ttl_secs",
      self.catalog_cache_ttl_secs,
      TimeDelta::try_seconds(self.catalog_cache_ttl_secs),
    )
  }

  /// The session lifetime; it must also be addable to the current time.
  pub fn session_ttl(&self) -> anyhow::Result<TimeDelta> {
    let ttl = positive(
      "session_ttl_hours",
      self.session_ttl_hours,
      TimeDelta::try_hours(self.session_ttl_hours),
    )?;
    SystemClock
      .now()
      .checked_add_signed(ttl)
      .with_context(|| format!("session_ttl_hours = {} is out of range", self.session_ttl_hours))?;
    Ok(ttl)
  }
}

fn positive(key: &str, raw: i64, delta: Option<TimeDelta>) -> anyhow::Result<TimeDelta> {
  match delta {
    Some(delta) if delta > TimeDelta::zero() => Ok(delta),
    _ => bail!("{key} = {raw} is out of range"),
  }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Open the store, seed it if configured, and assemble the handler state.
pub async fn build_state(cfg: &ServerConfig) -> anyhow::Result<AppState<SqliteStore>> {
  let cache_ttl = cfg.catalog_cache_ttl()?;
  let session_ttl = cfg.session_ttl()?;

  let store = SqliteStore::open(&cfg.database_path)
    .await
    .with_context(|| format!("failed to open database at {:?}", cfg.database_path))?;

  if cfg.seed_catalog {
    let bundle = seed::bundled().context("bundled catalog is malformed")?;
    match seed::seed_catalog(&store, bundle).await? {
      Some(report) => tracing::info!(?report, "seeded empty catalog"),
      None => tracing::debug!("catalog already populated; skipping seed"),
    }
  }

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let mut state =
    AppState::new(Arc::new(store), clock, cache_ttl).with_session_ttl(session_ttl);

  match &cfg.ai {
    Some(ai) => {
      let provider = OpenAiCompatible::new(ai.clone()).context("failed to build AI client")?;
      tracing::info!(base_url = %ai.base_url, model = %ai.model, "AI provider configured");
      state = state.with_ai(Arc::new(provider));
    }
    None => tracing::warn!("no AI provider configured; /api/ai routes will answer 503"),
  }

  Ok(state)
}

/// The full HTTP application: the API under `/api` with request tracing.
pub fn app(state: AppState<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::FileFormat;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/questline.toml")).unwrap();
    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.catalog_cache_ttl_secs, 300);
    assert!(cfg.seed_catalog);
    assert!(cfg.ai.is_none());
  }

  #[test]
  fn toml_overrides_and_nested_ai_section() {
    let toml = r#"
      port = 8080
      seed_catalog = false

      [ai]
      base_url = "http://localhost:11434/v1"
      api_key = "local"
      model = "llama3"
    "#;
    let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
    let cfg = ServerConfig::from_builder(builder).unwrap();
    assert_eq!(cfg.port, 8080);
    assert!(!cfg.seed_catalog);
    assert_eq!(cfg.host, "127.0.0.1");
    let ai = cfg.ai.unwrap();
    assert_eq!(ai.model, "llama3");
    assert_eq!(ai.timeout_secs, 30);
  }

  #[test]
  fn out_of_range_durations_are_config_errors() {
    let cfg = ServerConfig { catalog_cache_ttl_secs: i64::MAX, ..ServerConfig::default() };
    let err = cfg.catalog_cache_ttl().unwrap_err();
    assert!(err.to_string().contains("catalog_cache_ttl_secs"), "{err:#}");

    let cfg = ServerConfig { session_ttl_hours: i64::MAX / 2, ..ServerConfig::default() };
    assert!(cfg.session_ttl().is_err());

    // Representable as a duration, but not once added to the current time.
    let cfg = ServerConfig { session_ttl_hours: 3_000_000_000, ..ServerConfig::default() };
    assert!(cfg.session_ttl().is_err());

    let cfg = ServerConfig { session_ttl_hours: 0, ..ServerConfig::default() };
    assert!(cfg.session_ttl().is_err());

    let cfg = ServerConfig::default();
    assert_eq!(cfg.catalog_cache_ttl().unwrap(), TimeDelta::seconds(300));
  }

  #[tokio::test]
  async fn build_state_rejects_an_unusable_ttl() {
    let cfg = ServerConfig {
      database_path: ":memory:".into(),
      session_ttl_hours: i64::MAX,
      ..ServerConfig::default()
    };
    let err = build_state(&cfg).await.err().unwrap();
    assert!(err.to_string().contains("session_ttl_hours"), "{err:#}");
  }

  #[tokio::test]
  async fn app_serves_the_seeded_catalog_under_api() {
    let cfg = ServerConfig { database_path: ":memory:".into(), ..ServerConfig::default() };
    let state = build_state(&cfg).await.unwrap();

    let req = Request::builder().uri("/api/arenas").body(Body::empty()).unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let arenas: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(!arenas.as_array().unwrap().is_empty());
  }
}
