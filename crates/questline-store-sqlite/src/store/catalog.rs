//! Read-mostly catalog content.

use questline_core::{
  Error as CoreError,
  catalog::{
    Arena, Challenge, ChallengeFilter, Course, Mentor, NewArena, NewChallenge, NewCourse,
    NewMentor, NewPost, NewQuest, NewRoadmap, Post, PostKind, Quest, Roadmap,
  },
  store::CatalogStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use super::{SqliteStore, collect_rows};
use crate::{
  Result,
  encode::{
    ARENA_COLUMNS, CHALLENGE_COLUMNS, COURSE_COLUMNS, MENTOR_COLUMNS, POST_COLUMNS,
    QUEST_COLUMNS, ROADMAP_COLUMNS, RawChallenge, RawCourse, RawMentor, RawPost, RawQuest,
    RawRoadmap, arena_from_row, encode_dt, encode_json, encode_uuid, into_arena,
  },
};

fn check_arena(conn: &Connection, arena_id: Option<Uuid>) -> Result<()> {
  let Some(arena_id) = arena_id else { return Ok(()) };
  let exists = conn
    .query_row("SELECT 1 FROM arenas WHERE arena_id = ?1", params![encode_uuid(arena_id)], |_| {
      Ok(true)
    })
    .optional()?
    .unwrap_or(false);
  if !exists {
    return Err(CoreError::Invalid(format!("unknown arena: {arena_id}")).into());
  }
  Ok(())
}

pub(super) fn load_challenge(conn: &Connection, id: Uuid) -> Result<Option<Challenge>> {
  conn
    .query_row(
      &format!("SELECT {CHALLENGE_COLUMNS} FROM challenges WHERE challenge_id = ?1"),
      params![encode_uuid(id)],
      RawChallenge::from_row,
    )
    .optional()?
    .map(RawChallenge::into_challenge)
    .transpose()
}

pub(super) fn load_quest(conn: &Connection, id: Uuid) -> Result<Option<Quest>> {
  conn
    .query_row(
      &format!("SELECT {QUEST_COLUMNS} FROM quests WHERE quest_id = ?1"),
      params![encode_uuid(id)],
      RawQuest::from_row,
    )
    .optional()?
    .map(RawQuest::into_quest)
    .transpose()
}

pub(super) fn load_course(conn: &Connection, id: Uuid) -> Result<Option<Course>> {
  conn
    .query_row(
      &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = ?1"),
      params![encode_uuid(id)],
      RawCourse::from_row,
    )
    .optional()?
    .map(RawCourse::into_course)
    .transpose()
}

pub(super) fn load_roadmap(conn: &Connection, id: Uuid) -> Result<Option<Roadmap>> {
  conn
    .query_row(
      &format!("SELECT {ROADMAP_COLUMNS} FROM roadmaps WHERE roadmap_id = ?1"),
      params![encode_uuid(id)],
      RawRoadmap::from_row,
    )
    .optional()?
    .map(RawRoadmap::into_roadmap)
    .transpose()
}

impl CatalogStore for SqliteStore {
  async fn catalog_is_empty(&self) -> Result<bool> {
    self
      .read(|conn| {
        let total: i64 = conn.query_row(
          "SELECT (SELECT COUNT(*) FROM arenas)
                + (SELECT COUNT(*) FROM challenges)
                + (SELECT COUNT(*) FROM quests)
                + (SELECT COUNT(*) FROM courses)
                + (SELECT COUNT(*) FROM roadmaps)
                + (SELECT COUNT(*) FROM mentors)
                + (SELECT COUNT(*) FROM posts)",
          [],
          |r| r.get(0),
        )?;
        Ok(total == 0)
      })
      .await
  }

  // ─── Arenas ────────────────────────────────────────────────────────────────

  async fn create_arena(&self, input: NewArena) -> Result<Arena> {
    let arena = Arena {
      id:          Uuid::new_v4(),
      slug:        input.slug.trim().to_lowercase(),
      name:        input.name,
      description: input.description,
      icon:        input.icon,
    };
    if arena.slug.is_empty() {
      return Err(CoreError::Invalid("arena slug must not be empty".into()).into());
    }
    let row = arena.clone();

    self
      .write(move |conn| {
        let taken = conn
          .query_row("SELECT 1 FROM arenas WHERE slug = ?1", params![row.slug], |_| Ok(true))
          .optional()?
          .unwrap_or(false);
        if taken {
          return Err(CoreError::Invalid(format!("arena slug already exists: {}", row.slug)).into());
        }
        conn.execute(
          "INSERT INTO arenas (arena_id, slug, name, description, icon)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![encode_uuid(row.id), row.slug, row.name, row.description, row.icon],
        )?;
        Ok(())
      })
      .await?;
    Ok(arena)
  }

  async fn list_arenas(&self) -> Result<Vec<Arena>> {
    self
      .read(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ARENA_COLUMNS} FROM arenas ORDER BY name"))?;
        collect_rows(&mut stmt, [], arena_from_row, into_arena)
      })
      .await
  }

  // ─── Challenges ────────────────────────────────────────────────────────────

  async fn create_challenge(&self, input: NewChallenge) -> Result<Challenge> {
    input.validate()?;
    let challenge = Challenge {
      id:           Uuid::new_v4(),
      arena_id:     input.arena_id,
      title:        input.title,
      description:  input.description,
      difficulty:   input.difficulty,
      xp_reward:    input.xp_reward,
      language:     input.language,
      starter_code: input.starter_code,
      test_cases:   input.test_cases,
      created_at:   self.clock.now(),
    };
    let row = challenge.clone();

    self
      .write(move |conn| {
        check_arena(conn, row.arena_id)?;
        conn.execute(
          "INSERT INTO challenges
             (challenge_id, arena_id, title, description, difficulty, xp_reward,
              language, starter_code, test_cases, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          params![
            encode_uuid(row.id),
            row.arena_id.map(encode_uuid),
            row.title,
            row.description,
            row.difficulty.as_ref(),
            row.xp_reward,
            row.language,
            row.starter_code,
            encode_json(&row.test_cases)?,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(challenge)
  }

  async fn get_challenge(&self, id: Uuid) -> Result<Option<Challenge>> {
    self.read(move |conn| load_challenge(conn, id)).await
  }

  async fn list_challenges<'a>(&'a self, filter: &'a ChallengeFilter) -> Result<Vec<Challenge>> {
    let arena = filter.arena_id.map(encode_uuid);
    let difficulty = filter.difficulty.map(|d| d.as_ref().to_owned());
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHALLENGE_COLUMNS} FROM challenges
           WHERE (?1 IS NULL OR arena_id = ?1)
             AND (?2 IS NULL OR difficulty = ?2)
           ORDER BY created_at, title"
        ))?;
        collect_rows(
          &mut stmt,
          params![arena, difficulty],
          RawChallenge::from_row,
          RawChallenge::into_challenge,
        )
      })
      .await
  }

  // ─── Quests ────────────────────────────────────────────────────────────────

  async fn create_quest(&self, input: NewQuest) -> Result<Quest> {
    input.validate()?;
    let quest = Quest {
      id:          Uuid::new_v4(),
      arena_id:    input.arena_id,
      title:       input.title,
      description: input.description,
      period:      input.period,
      target:      input.target,
      xp_reward:   input.xp_reward,
      created_at:  self.clock.now(),
    };
    let row = quest.clone();

    self
      .write(move |conn| {
        check_arena(conn, row.arena_id)?;
        conn.execute(
          "INSERT INTO quests
             (quest_id, arena_id, title, description, period, target, xp_reward, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            encode_uuid(row.id),
            row.arena_id.map(encode_uuid),
            row.title,
            row.description,
            row.period.as_ref(),
            row.target,
            row.xp_reward,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(quest)
  }

  async fn get_quest(&self, id: Uuid) -> Result<Option<Quest>> {
    self.read(move |conn| load_quest(conn, id)).await
  }

  async fn list_quests(&self) -> Result<Vec<Quest>> {
    self
      .read(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {QUEST_COLUMNS} FROM quests ORDER BY created_at, title"))?;
        collect_rows(&mut stmt, [], RawQuest::from_row, RawQuest::into_quest)
      })
      .await
  }

  // ─── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    input.validate()?;
    let course = Course {
      id:          Uuid::new_v4(),
      arena_id:    input.arena_id,
      title:       input.title,
      description: input.description,
      difficulty:  input.difficulty,
      xp_reward:   input.xp_reward,
      lessons:     input.lessons,
      created_at:  self.clock.now(),
    };
    let row = course.clone();

    self
      .write(move |conn| {
        check_arena(conn, row.arena_id)?;
        conn.execute(
          "INSERT INTO courses
             (course_id, arena_id, title, description, difficulty, xp_reward, lessons, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            encode_uuid(row.id),
            row.arena_id.map(encode_uuid),
            row.title,
            row.description,
            row.difficulty.as_ref(),
            row.xp_reward,
            encode_json(&row.lessons)?,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    self.read(move |conn| load_course(conn, id)).await
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    self
      .read(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at, title"))?;
        collect_rows(&mut stmt, [], RawCourse::from_row, RawCourse::into_course)
      })
      .await
  }

  // ─── Roadmaps ──────────────────────────────────────────────────────────────

  async fn create_roadmap(&self, input: NewRoadmap) -> Result<Roadmap> {
    input.validate()?;
    let roadmap = Roadmap {
      id:              Uuid::new_v4(),
      title:           input.title,
      description:     input.description,
      difficulty:      input.difficulty,
      xp_reward:       input.xp_reward,
      estimated_weeks: input.estimated_weeks,
      milestones:      input.milestones,
      created_at:      self.clock.now(),
    };
    let row = roadmap.clone();

    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO roadmaps
             (roadmap_id, title, description, difficulty, xp_reward, estimated_weeks,
              milestones, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            encode_uuid(row.id),
            row.title,
            row.description,
            row.difficulty.as_ref(),
            row.xp_reward,
            row.estimated_weeks,
            encode_json(&row.milestones)?,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(roadmap)
  }

  async fn get_roadmap(&self, id: Uuid) -> Result<Option<Roadmap>> {
    self.read(move |conn| load_roadmap(conn, id)).await
  }

  async fn list_roadmaps(&self) -> Result<Vec<Roadmap>> {
    self
      .read(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ROADMAP_COLUMNS} FROM roadmaps ORDER BY created_at, title"
        ))?;
        collect_rows(&mut stmt, [], RawRoadmap::from_row, RawRoadmap::into_roadmap)
      })
      .await
  }

  // ─── Mentors and posts ─────────────────────────────────────────────────────

  async fn create_mentor(&self, input: NewMentor) -> Result<Mentor> {
    if !(0.0..=5.0).contains(&input.rating) {
      return Err(CoreError::Invalid("mentor rating must be between 0 and 5".into()).into());
    }
    let mentor = Mentor {
      id:        Uuid::new_v4(),
      name:      input.name,
      expertise: input.expertise,
      bio:       input.bio,
      rating:    input.rating,
    };
    let row = mentor.clone();

    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO mentors (mentor_id, name, expertise, bio, rating)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            encode_uuid(row.id),
            row.name,
            encode_json(&row.expertise)?,
            row.bio,
            f64::from(row.rating),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(mentor)
  }

  async fn list_mentors(&self) -> Result<Vec<Mentor>> {
    self
      .read(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MENTOR_COLUMNS} FROM mentors ORDER BY rating DESC, name"
        ))?;
        collect_rows(&mut stmt, [], RawMentor::from_row, RawMentor::into_mentor)
      })
      .await
  }

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      id:           Uuid::new_v4(),
      kind:         input.kind,
      title:        input.title,
      body:         input.body,
      author:       input.author,
      tags:         input.tags,
      published_at: input.published_at,
    };
    let row = post.clone();

    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, kind, title, body, author, tags, published_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            encode_uuid(row.id),
            row.kind.as_ref(),
            row.title,
            row.body,
            row.author,
            encode_json(&row.tags)?,
            encode_dt(row.published_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(post)
  }

  async fn list_posts(&self, kind: PostKind, limit: usize) -> Result<Vec<Post>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE kind = ?1
           ORDER BY published_at DESC
           LIMIT ?2"
        ))?;
        collect_rows(&mut stmt, params![kind.as_ref(), limit], RawPost::from_row, RawPost::into_post)
      })
      .await
  }
}
