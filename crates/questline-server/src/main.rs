//! Questline server binary.
//!
//! Reads `questline.toml` (or the path given with `--config`) layered under
//! `QUESTLINE_*` environment variables, opens the SQLite store, seeds an
//! empty catalog and serves the JSON API under `/api`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use questline_server::{ServerConfig, app, build_state};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Questline learning platform server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "questline.toml")]
  config: PathBuf,

  /// Open the database, seed the catalog if it is empty, and exit.
  #[arg(long)]
  seed_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.seed_only {
    cfg.seed_catalog = true;
    build_state(&cfg).await?;
    tracing::info!(database = %cfg.database_path, "seeding finished");
    return Ok(());
  }

  let state = build_state(&cfg).await?;
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(state)).await.context("server error")?;

  Ok(())
}
