//! Loading the bundled catalog into an empty database.

use std::collections::HashMap;

use anyhow::{Context as _, bail};
use questline_core::{catalog::CatalogSeed, store::CatalogStore};
use uuid::Uuid;

/// The catalog shipped with the server.
pub const CATALOG_JSON: &str = include_str!("../seed/catalog.json");

pub fn bundled() -> serde_json::Result<CatalogSeed> { serde_json::from_str(CATALOG_JSON) }

/// How many rows of each kind were inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub arenas:     usize,
  pub challenges: usize,
  pub quests:     usize,
  pub courses:    usize,
  pub roadmaps:   usize,
  pub mentors:    usize,
  pub posts:      usize,
}

fn resolve(arenas: &HashMap<String, Uuid>, slug: Option<&str>) -> anyhow::Result<Option<Uuid>> {
  let Some(slug) = slug else { return Ok(None) };
  match arenas.get(&slug.to_lowercase()) {
    Some(id) => Ok(Some(*id)),
    None => bail!("seed refers to unknown arena {slug:?}"),
  }
}

/// Insert `seed` if the catalog is empty. Returns `None` without touching
/// anything when content already exists.
pub async fn seed_catalog<S>(store: &S, seed: CatalogSeed) -> anyhow::Result<Option<SeedReport>>
where
  S: CatalogStore,
{
  if !store
    .catalog_is_empty()
    .await
    .context("failed to inspect catalog")?
  {
    return Ok(None);
  }

  let mut report = SeedReport::default();
  let mut arena_ids = HashMap::new();

  for input in seed.arenas {
    let slug = input.slug.clone();
    let arena = store
      .create_arena(input)
      .await
      .with_context(|| format!("failed to seed arena {slug:?}"))?;
    arena_ids.insert(arena.slug.clone(), arena.id);
    report.arenas += 1;
  }

  for entry in seed.challenges {
    let mut input = entry.challenge;
    input.arena_id = resolve(&arena_ids, entry.arena.as_deref())?;
    let title = input.title.clone();
    store
      .create_challenge(input)
      .await
      .with_context(|| format!("failed to seed challenge {title:?}"))?;
    report.challenges += 1;
  }

  for entry in seed.quests {
    let mut input = entry.quest;
    input.arena_id = resolve(&arena_ids, entry.arena.as_deref())?;
    let title = input.title.clone();
    store
      .create_quest(input)
      .await
      .with_context(|| format!("failed to seed quest {title:?}"))?;
    report.quests += 1;
  }

  for entry in seed.courses {
    let mut input = entry.course;
    input.arena_id = resolve(&arena_ids, entry.arena.as_deref())?;
    let title = input.title.clone();
    store
      .create_course(input)
      .await
      .with_context(|| format!("failed to seed course {title:?}"))?;
    report.courses += 1;
  }

  for input in seed.roadmaps {
    let title = input.title.clone();
    store
      .create_roadmap(input)
      .await
      .with_context(|| format!("failed to seed roadmap {title:?}"))?;
    report.roadmaps += 1;
  }

  for input in seed.mentors {
    let name = input.name.clone();
    store
      .create_mentor(input)
      .await
      .with_context(|| format!("failed to seed mentor {name:?}"))?;
    report.mentors += 1;
  }

  for input in seed.posts {
    let title = input.title.clone();
    store
      .create_post(input)
      .await
      .with_context(|| format!("failed to seed post {title:?}"))?;
    report.posts += 1;
  }

  Ok(Some(report))
}

#[cfg(test)]
mod tests {
  use questline_core::catalog::{ChallengeFilter, PostKind};
  use questline_store_sqlite::SqliteStore;

  use super::*;

  #[test]
  fn bundled_catalog_parses() {
    let seed = bundled().unwrap();
    assert!(!seed.arenas.is_empty());
    assert!(!seed.challenges.is_empty());
    assert!(seed.roadmaps.iter().all(|r| !r.milestones.is_empty()));
  }

  #[tokio::test]
  async fn seeding_fills_an_empty_catalog_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let seed = bundled().unwrap();
    let expected = seed.challenges.len();

    let report = seed_catalog(&store, seed).await.unwrap().unwrap();
    assert_eq!(report.challenges, expected);
    assert!(report.posts > 0);

    let again = seed_catalog(&store, bundled().unwrap()).await.unwrap();
    assert!(again.is_none());

    let challenges = store.list_challenges(&ChallengeFilter::default()).await.unwrap();
    assert_eq!(challenges.len(), expected);
    assert!(challenges.iter().any(|c| c.arena_id.is_some()));
    assert!(!store.list_posts(PostKind::News, 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn unknown_arena_slug_is_an_error() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let seed: CatalogSeed = serde_json::from_value(serde_json::json!({
      "challenges": [{
        "arena": "nowhere",
        "title": "Lost",
        "description": "No arena",
        "difficulty": "beginner",
        "xpReward": 10,
        "language": "rust"
      }]
    }))
    .unwrap();
    let err = seed_catalog(&store, seed).await.unwrap_err();
    assert!(err.to_string().contains("nowhere"), "{err:#}");
  }
}
