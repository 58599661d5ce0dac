//! Per-user activity records and their transitions.
//!
//! Every transition is read-apply-write inside one transaction: the record is
//! loaded, the pure state machine from `questline_core::activity` is applied,
//! and the result written back. A failed transition writes nothing.

use questline_core::{
  Error as CoreError,
  activity::{
    ActivityStatus, ContentKind, Submission, Transition, UserChallenge, UserCourse, UserQuest,
    UserRoadmap,
  },
  store::ActivityStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use super::{
  SqliteStore,
  catalog::{load_challenge, load_course, load_quest, load_roadmap},
  collect_rows,
};
use crate::{
  Result,
  encode::{
    RawUserChallenge, RawUserCourse, RawUserQuest, RawUserRoadmap, USER_CHALLENGE_COLUMNS,
    USER_COURSE_COLUMNS, USER_QUEST_COLUMNS, USER_ROADMAP_COLUMNS, decode_int, encode_dt,
    encode_json, encode_uuid,
  },
};

fn not_found(kind: ContentKind, id: Uuid) -> crate::Error {
  CoreError::ContentNotFound { kind, id }.into()
}

fn not_started(kind: ContentKind, id: Uuid) -> crate::Error {
  CoreError::NotStarted { kind, id }.into()
}

/// Updates only touch records still in progress. Zero affected rows means
/// another writer completed the record first.
fn ensure_updated(updated: usize, kind: ContentKind, id: Uuid) -> Result<()> {
  if updated == 0 {
    return Err(CoreError::AlreadyCompleted { kind, id }.into());
  }
  Ok(())
}

// ─── Challenges ──────────────────────────────────────────────────────────────

fn load_user_challenge(
  conn: &Connection,
  user_id: Uuid,
  challenge_id: Uuid,
) -> Result<Option<UserChallenge>> {
  conn
    .query_row(
      &format!(
        "SELECT {USER_CHALLENGE_COLUMNS} FROM user_challenges
         WHERE user_id = ?1 AND challenge_id = ?2"
      ),
      params![encode_uuid(user_id), encode_uuid(challenge_id)],
      RawUserChallenge::from_row,
    )
    .optional()?
    .map(RawUserChallenge::into_record)
    .transpose()
}

fn insert_user_challenge(conn: &Connection, r: &UserChallenge) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO user_challenges ({USER_CHALLENGE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ),
    params![
      encode_uuid(r.user_id),
      encode_uuid(r.challenge_id),
      r.status.as_ref(),
      r.attempts,
      r.best_score,
      r.last_score,
      r.last_code,
      encode_dt(r.started_at),
      r.completed_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

fn update_user_challenge(conn: &Connection, r: &UserChallenge) -> Result<()> {
  let updated = conn.execute(
    "UPDATE user_challenges SET
       status = ?3, attempts = ?4, best_score = ?5, last_score = ?6,
       last_code = ?7, completed_at = ?8
     WHERE user_id = ?1 AND challenge_id = ?2 AND status = 'in_progress'",
    params![
      encode_uuid(r.user_id),
      encode_uuid(r.challenge_id),
      r.status.as_ref(),
      r.attempts,
      r.best_score,
      r.last_score,
      r.last_code,
      r.completed_at.map(encode_dt),
    ],
  )?;
  ensure_updated(updated, ContentKind::Challenge, r.challenge_id)
}

// ─── Quests ──────────────────────────────────────────────────────────────────

fn load_user_quest(conn: &Connection, user_id: Uuid, quest_id: Uuid) -> Result<Option<UserQuest>> {
  conn
    .query_row(
      &format!("SELECT {USER_QUEST_COLUMNS} FROM user_quests WHERE user_id = ?1 AND quest_id = ?2"),
      params![encode_uuid(user_id), encode_uuid(quest_id)],
      RawUserQuest::from_row,
    )
    .optional()?
    .map(RawUserQuest::into_record)
    .transpose()
}

fn update_user_quest(conn: &Connection, r: &UserQuest) -> Result<()> {
  let updated = conn.execute(
    "UPDATE user_quests SET status = ?3, progress = ?4, completed_at = ?5
     WHERE user_id = ?1 AND quest_id = ?2 AND status = 'in_progress'",
    params![
      encode_uuid(r.user_id),
      encode_uuid(r.quest_id),
      r.status.as_ref(),
      r.progress,
      r.completed_at.map(encode_dt),
    ],
  )?;
  ensure_updated(updated, ContentKind::Quest, r.quest_id)
}

/// Load an assigned quest, distinguishing an unknown quest from one the user
/// never accepted.
fn assigned_quest(conn: &Connection, user_id: Uuid, quest_id: Uuid) -> Result<UserQuest> {
  if let Some(record) = load_user_quest(conn, user_id, quest_id)? {
    return Ok(record);
  }
  if load_quest(conn, quest_id)?.is_none() {
    return Err(not_found(ContentKind::Quest, quest_id));
  }
  Err(not_started(ContentKind::Quest, quest_id))
}

// ─── Courses ─────────────────────────────────────────────────────────────────

fn load_user_course(
  conn: &Connection,
  user_id: Uuid,
  course_id: Uuid,
) -> Result<Option<UserCourse>> {
  conn
    .query_row(
      &format!(
        "SELECT {USER_COURSE_COLUMNS} FROM user_courses WHERE user_id = ?1 AND course_id = ?2"
      ),
      params![encode_uuid(user_id), encode_uuid(course_id)],
      RawUserCourse::from_row,
    )
    .optional()?
    .map(RawUserCourse::into_record)
    .transpose()
}

// ─── Roadmaps ────────────────────────────────────────────────────────────────

fn load_user_roadmap(
  conn: &Connection,
  user_id: Uuid,
  roadmap_id: Uuid,
) -> Result<Option<UserRoadmap>> {
  conn
    .query_row(
      &format!(
        "SELECT {USER_ROADMAP_COLUMNS} FROM user_roadmaps WHERE user_id = ?1 AND roadmap_id = ?2"
      ),
      params![encode_uuid(user_id), encode_uuid(roadmap_id)],
      RawUserRoadmap::from_row,
    )
    .optional()?
    .map(RawUserRoadmap::into_record)
    .transpose()
}

// ─── ActivityStore ───────────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  async fn start_challenge(&self, user_id: Uuid, challenge_id: Uuid) -> Result<UserChallenge> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        if load_challenge(conn, challenge_id)?.is_none() {
          return Err(not_found(ContentKind::Challenge, challenge_id));
        }
        if let Some(existing) = load_user_challenge(conn, user_id, challenge_id)? {
          return Ok(existing);
        }
        let record = UserChallenge::start(user_id, challenge_id, now);
        insert_user_challenge(conn, &record)?;
        Ok(record)
      })
      .await
  }

  async fn submit_challenge(
    &self,
    user_id: Uuid,
    challenge_id: Uuid,
    submission: Submission,
  ) -> Result<Transition<UserChallenge>> {
    let now = self.clock.now();
    let transition = self
      .write(move |conn| {
        let Some(mut record) = load_user_challenge(conn, user_id, challenge_id)? else {
          if load_challenge(conn, challenge_id)?.is_none() {
            return Err(not_found(ContentKind::Challenge, challenge_id));
          }
          return Err(not_started(ContentKind::Challenge, challenge_id));
        };
        let newly_completed = record.submit(submission, now)?;
        update_user_challenge(conn, &record)?;
        Ok(Transition { record, newly_completed })
      })
      .await?;

    tracing::debug!(
      %user_id,
      %challenge_id,
      attempts = transition.record.attempts,
      completed = transition.newly_completed,
      "challenge submitted"
    );
    Ok(transition)
  }

  async fn list_user_challenges(&self, user_id: Uuid) -> Result<Vec<UserChallenge>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_CHALLENGE_COLUMNS} FROM user_challenges
           WHERE user_id = ?1 ORDER BY started_at"
        ))?;
        collect_rows(
          &mut stmt,
          params![encode_uuid(user_id)],
          RawUserChallenge::from_row,
          RawUserChallenge::into_record,
        )
      })
      .await
  }

  async fn completed_challenge_count(&self, user_id: Uuid) -> Result<u32> {
    self
      .read(move |conn| {
        let n: i64 = conn.query_row(
          "SELECT COUNT(*) FROM user_challenges WHERE user_id = ?1 AND status = ?2",
          params![encode_uuid(user_id), ActivityStatus::Completed.as_ref()],
          |r| r.get(0),
        )?;
        decode_int(n, "completed challenge count")
      })
      .await
  }

  async fn assign_quest(&self, user_id: Uuid, quest_id: Uuid) -> Result<UserQuest> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(quest) = load_quest(conn, quest_id)? else {
          return Err(not_found(ContentKind::Quest, quest_id));
        };
        if let Some(existing) = load_user_quest(conn, user_id, quest_id)? {
          return Ok(existing);
        }
        let record = UserQuest::assign(user_id, quest_id, quest.target, now);
        conn.execute(
          &format!(
            "INSERT INTO user_quests ({USER_QUEST_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          params![
            encode_uuid(record.user_id),
            encode_uuid(record.quest_id),
            record.status.as_ref(),
            record.progress,
            record.target,
            encode_dt(record.assigned_at),
            record.completed_at.map(encode_dt),
          ],
        )?;
        Ok(record)
      })
      .await
  }

  async fn record_quest_progress(
    &self,
    user_id: Uuid,
    quest_id: Uuid,
    delta: u32,
  ) -> Result<Transition<UserQuest>> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let mut record = assigned_quest(conn, user_id, quest_id)?;
        let newly_completed = record.record_progress(delta, now)?;
        update_user_quest(conn, &record)?;
        Ok(Transition { record, newly_completed })
      })
      .await
  }

  async fn complete_quest(&self, user_id: Uuid, quest_id: Uuid) -> Result<Transition<UserQuest>> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let mut record = assigned_quest(conn, user_id, quest_id)?;
        let newly_completed = record.complete(now)?;
        update_user_quest(conn, &record)?;
        Ok(Transition { record, newly_completed })
      })
      .await
  }

  async fn list_user_quests(&self, user_id: Uuid) -> Result<Vec<UserQuest>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_QUEST_COLUMNS} FROM user_quests WHERE user_id = ?1 ORDER BY assigned_at"
        ))?;
        collect_rows(
          &mut stmt,
          params![encode_uuid(user_id)],
          RawUserQuest::from_row,
          RawUserQuest::into_record,
        )
      })
      .await
  }

  async fn start_course(&self, user_id: Uuid, course_id: Uuid) -> Result<UserCourse> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        if load_course(conn, course_id)?.is_none() {
          return Err(not_found(ContentKind::Course, course_id));
        }
        if let Some(existing) = load_user_course(conn, user_id, course_id)? {
          return Ok(existing);
        }
        let record = UserCourse::start(user_id, course_id, now);
        conn.execute(
          &format!("INSERT INTO user_courses ({USER_COURSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          params![
            encode_uuid(record.user_id),
            encode_uuid(record.course_id),
            record.status.as_ref(),
            record.progress,
            encode_dt(record.started_at),
            record.completed_at.map(encode_dt),
          ],
        )?;
        Ok(record)
      })
      .await
  }

  async fn record_course_progress(
    &self,
    user_id: Uuid,
    course_id: Uuid,
    percent: u8,
  ) -> Result<Transition<UserCourse>> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(mut record) = load_user_course(conn, user_id, course_id)? else {
          if load_course(conn, course_id)?.is_none() {
            return Err(not_found(ContentKind::Course, course_id));
          }
          return Err(not_started(ContentKind::Course, course_id));
        };
        let newly_completed = record.record_progress(percent, now)?;
        let updated = conn.execute(
          "UPDATE user_courses SET status = ?3, progress = ?4, completed_at = ?5
           WHERE user_id = ?1 AND course_id = ?2 AND status = 'in_progress'",
          params![
            encode_uuid(record.user_id),
            encode_uuid(record.course_id),
            record.status.as_ref(),
            record.progress,
            record.completed_at.map(encode_dt),
          ],
        )?;
        ensure_updated(updated, ContentKind::Course, course_id)?;
        Ok(Transition { record, newly_completed })
      })
      .await
  }

  async fn list_user_courses(&self, user_id: Uuid) -> Result<Vec<UserCourse>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COURSE_COLUMNS} FROM user_courses WHERE user_id = ?1 ORDER BY started_at"
        ))?;
        collect_rows(
          &mut stmt,
          params![encode_uuid(user_id)],
          RawUserCourse::from_row,
          RawUserCourse::into_record,
        )
      })
      .await
  }

  async fn start_roadmap(&self, user_id: Uuid, roadmap_id: Uuid) -> Result<UserRoadmap> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(roadmap) = load_roadmap(conn, roadmap_id)? else {
          return Err(not_found(ContentKind::Roadmap, roadmap_id));
        };
        if let Some(existing) = load_user_roadmap(conn, user_id, roadmap_id)? {
          return Ok(existing);
        }
        let milestone_count = u32::try_from(roadmap.milestones.len())
          .map_err(|_| CoreError::Invalid("too many milestones".into()))?;
        let record = UserRoadmap::start(user_id, roadmap_id, milestone_count, now);
        conn.execute(
          &format!(
            "INSERT INTO user_roadmaps ({USER_ROADMAP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          params![
            encode_uuid(record.user_id),
            encode_uuid(record.roadmap_id),
            record.status.as_ref(),
            encode_json(&record.completed_milestones)?,
            record.milestone_count,
            encode_dt(record.started_at),
            record.completed_at.map(encode_dt),
          ],
        )?;
        Ok(record)
      })
      .await
  }

  async fn complete_milestone(
    &self,
    user_id: Uuid,
    roadmap_id: Uuid,
    index: u32,
  ) -> Result<Transition<UserRoadmap>> {
    let now = self.clock.now();
    self
      .write(move |conn| {
        let Some(mut record) = load_user_roadmap(conn, user_id, roadmap_id)? else {
          if load_roadmap(conn, roadmap_id)?.is_none() {
            return Err(not_found(ContentKind::Roadmap, roadmap_id));
          }
          return Err(not_started(ContentKind::Roadmap, roadmap_id));
        };
        let newly_completed = record.complete_milestone(index, now)?;
        let updated = conn.execute(
          "UPDATE user_roadmaps SET status = ?3, completed_milestones = ?4, completed_at = ?5
           WHERE user_id = ?1 AND roadmap_id = ?2 AND status = 'in_progress'",
          params![
            encode_uuid(record.user_id),
            encode_uuid(record.roadmap_id),
            record.status.as_ref(),
            encode_json(&record.completed_milestones)?,
            record.completed_at.map(encode_dt),
          ],
        )?;
        ensure_updated(updated, ContentKind::Roadmap, roadmap_id)?;
        Ok(Transition { record, newly_completed })
      })
      .await
  }

  async fn list_user_roadmaps(&self, user_id: Uuid) -> Result<Vec<UserRoadmap>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_ROADMAP_COLUMNS} FROM user_roadmaps WHERE user_id = ?1 ORDER BY started_at"
        ))?;
        collect_rows(
          &mut stmt,
          params![encode_uuid(user_id)],
          RawUserRoadmap::from_row,
          RawUserRoadmap::into_record,
        )
      })
      .await
  }
}
