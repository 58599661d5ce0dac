//! `GET /leaderboard?category&period&limit`

use axum::{
  Json,
  extract::{Query, State},
};
use questline_core::{
  leaderboard::{LeaderboardCategory, LeaderboardEntry, LeaderboardPeriod, LeaderboardQuery},
  store::Store,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
  #[serde(default)]
  pub category: LeaderboardCategory,
  #[serde(default)]
  pub period:   LeaderboardPeriod,
  pub limit:    Option<usize>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError>
where
  S: Store + 'static,
{
  let query =
    LeaderboardQuery::new(params.category, params.period, params.limit, state.clock.now());
  let entries = state.store.leaderboard(&query).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}
