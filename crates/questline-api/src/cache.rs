//! Time-bounded in-memory cache for catalog listings.
//!
//! Catalog content is read on almost every page and changes rarely, so list
//! endpoints go through a [`CatalogCache`]. Expiry is driven by an injected
//! [`Clock`]; nothing runs in the background.

use std::{
  collections::HashMap,
  future::Future,
  hash::Hash,
  sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, Utc};
use questline_core::{
  catalog::{Arena, Challenge, ChallengeFilter, Course, Mentor, Post, PostKind, Quest, Roadmap},
  clock::Clock,
};

struct Entry<V> {
  value:       V,
  inserted_at: DateTime<Utc>,
}

/// A map whose entries stop being served once `now - inserted_at >= ttl`.
pub struct TtlCache<K, V> {
  entries: Mutex<HashMap<K, Entry<V>>>,
  clock:   Arc<dyn Clock>,
  ttl:     Duration,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash,
  V: Clone,
{
  pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
    Self { entries: Mutex::new(HashMap::new()), clock, ttl }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn is_fresh(&self, entry: &Entry<V>, now: DateTime<Utc>) -> bool {
    now - entry.inserted_at < self.ttl
  }

  /// The cached value for `key`, if present and not expired.
  pub fn get(&self, key: &K) -> Option<V> {
    let now = self.clock.now();
    let entries = self.lock();
    entries
      .get(key)
      .filter(|entry| self.is_fresh(entry, now))
      .map(|entry| entry.value.clone())
  }

  pub fn insert(&self, key: K, value: V) {
    let inserted_at = self.clock.now();
    self.lock().insert(key, Entry { value, inserted_at });
  }

  pub fn invalidate(&self, key: &K) { self.lock().remove(key); }

  pub fn clear(&self) { self.lock().clear(); }

  /// Drop every expired entry; returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now = self.clock.now();
    let mut entries = self.lock();
    let before = entries.len();
    entries.retain(|_, entry| now - entry.inserted_at < self.ttl);
    before - entries.len()
  }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  /// Return the cached value or load, cache and return a fresh one.
  ///
  /// The lock is never held across the load, so two concurrent misses may
  /// both load; the later insert wins.
  pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    if let Some(value) = self.get(&key) {
      return Ok(value);
    }
    let value = load().await?;
    self.insert(key, value.clone());
    Ok(value)
  }
}

// ─── Catalog sections ────────────────────────────────────────────────────────

/// One [`TtlCache`] per catalog listing.
pub struct CatalogCache {
  pub arenas:     TtlCache<(), Vec<Arena>>,
  pub challenges: TtlCache<ChallengeFilter, Vec<Challenge>>,
  pub quests:     TtlCache<(), Vec<Quest>>,
  pub courses:    TtlCache<(), Vec<Course>>,
  pub roadmaps:   TtlCache<(), Vec<Roadmap>>,
  pub mentors:    TtlCache<(), Vec<Mentor>>,
  pub posts:      TtlCache<PostKind, Vec<Post>>,
}

impl CatalogCache {
  pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
    Self {
      arenas:     TtlCache::new(clock.clone(), ttl),
      challenges: TtlCache::new(clock.clone(), ttl),
      quests:     TtlCache::new(clock.clone(), ttl),
      courses:    TtlCache::new(clock.clone(), ttl),
      roadmaps:   TtlCache::new(clock.clone(), ttl),
      mentors:    TtlCache::new(clock.clone(), ttl),
      posts:      TtlCache::new(clock, ttl),
    }
  }

  /// Forget everything, e.g. after seeding.
  pub fn clear(&self) {
    self.arenas.clear();
    self.challenges.clear();
    self.quests.clear();
    self.courses.clear();
    self.roadmaps.clear();
    self.mentors.clear();
    self.posts.clear();
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use questline_core::clock::ManualClock;

  use super::*;

  fn setup(ttl_secs: i64) -> (Arc<ManualClock>, TtlCache<&'static str, u32>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let cache = TtlCache::new(clock.clone(), Duration::seconds(ttl_secs));
    (clock, cache)
  }

  #[test]
  fn entries_expire_exactly_at_ttl() {
    let (clock, cache) = setup(60);
    cache.insert("k", 1);

    clock.advance(Duration::seconds(59));
    assert_eq!(cache.get(&"k"), Some(1));
    clock.advance(Duration::seconds(1));
    assert_eq!(cache.get(&"k"), None);
  }

  #[test]
  fn purge_removes_only_expired() {
    let (clock, cache) = setup(10);
    cache.insert("old", 1);
    clock.advance(Duration::seconds(5));
    cache.insert("new", 2);
    clock.advance(Duration::seconds(5));

    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&"new"), Some(2));
  }

  #[test]
  fn invalidate_forces_a_reload() {
    let (_clock, cache) = setup(60);
    cache.insert("k", 1);
    cache.invalidate(&"k");
    assert!(cache.is_empty());
  }

  #[tokio::test]
  async fn loader_runs_only_on_miss() {
    let (clock, cache) = setup(60);
    let mut calls = 0;

    for _ in 0..3 {
      let v: Result<u32, ()> = cache
        .get_or_try_insert_with("k", || {
          calls += 1;
          async { Ok(7) }
        })
        .await;
      assert_eq!(v, Ok(7));
    }
    assert_eq!(calls, 1);

    clock.advance(Duration::minutes(2));
    let _ = cache.get_or_try_insert_with("k", || async { Ok::<_, ()>(8) }).await;
    assert_eq!(cache.get(&"k"), Some(8));
  }

  #[tokio::test]
  async fn failed_loads_are_not_cached() {
    let (_clock, cache) = setup(60);
    let err: Result<u32, &str> = cache.get_or_try_insert_with("k", || async { Err("down") }).await;
    assert_eq!(err, Err("down"));
    assert!(cache.is_empty());
  }
}
