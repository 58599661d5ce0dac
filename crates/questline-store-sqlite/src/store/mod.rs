//! [`SqliteStore`], the SQLite implementation of the Questline store traits.
//!
//! One submodule per trait. All of them share the two helpers here:
//! [`SqliteStore::read`] for plain queries and [`SqliteStore::write`] for
//! anything that mutates, which always runs inside one transaction.

mod accounts;
mod activity;
mod catalog;
mod leaderboard;
mod profiles;
mod social;

use std::{path::Path, sync::Arc};

use questline_core::{
  clock::{Clock, SystemClock},
  store::Backend,
};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Questline store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, clock: Arc::new(SystemClock) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the clock used to timestamp new rows.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the database thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` inside a transaction on the database thread. The transaction
  /// commits only if `f` returns `Ok`; any error rolls everything back.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match f(&tx) {
          Ok(out) => {
            tx.commit()?;
            Ok(Ok(out))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await?
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

/// Collect every row of `stmt` through `map`, decoding with `decode`.
fn collect_rows<R, T>(
  stmt: &mut rusqlite::Statement<'_>,
  params: impl rusqlite::Params,
  map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Vec<T>> {
  let raws = stmt
    .query_map(params, map)?
    .collect::<rusqlite::Result<Vec<R>>>()?;
  raws.into_iter().map(decode).collect()
}
