//! Cached read-only catalog listings: arenas, mentors, feed and news.

use axum::{Json, extract::State};
use questline_core::{
  catalog::{Arena, Mentor, Post, PostKind},
  store::Store,
};

use crate::{AppState, error::ApiError};

/// Most recent posts returned by `/feed` and `/news`.
pub const POST_LIMIT: usize = 50;

/// `GET /arenas`
pub async fn arenas<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Arena>>, ApiError>
where
  S: Store + 'static,
{
  let arenas = state
    .cache
    .arenas
    .get_or_try_insert_with((), || state.store.list_arenas())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(arenas))
}

/// `GET /mentors`
pub async fn mentors<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Mentor>>, ApiError>
where
  S: Store + 'static,
{
  let mentors = state
    .cache
    .mentors
    .get_or_try_insert_with((), || state.store.list_mentors())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(mentors))
}

async fn posts<S>(state: &AppState<S>, kind: PostKind) -> Result<Json<Vec<Post>>, ApiError>
where
  S: Store + 'static,
{
  let posts = state
    .cache
    .posts
    .get_or_try_insert_with(kind, || state.store.list_posts(kind, POST_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `GET /feed`
pub async fn feed<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Post>>, ApiError>
where
  S: Store + 'static,
{
  posts(&state, PostKind::Feed).await
}

/// `GET /news`
pub async fn news<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Post>>, ApiError>
where
  S: Store + 'static,
{
  posts(&state, PostKind::News).await
}
