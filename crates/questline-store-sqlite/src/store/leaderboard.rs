//! Ranked listings over profiles, the XP ledger and completed challenges.

use questline_core::{
  leaderboard::{LeaderboardCategory, LeaderboardEntry, LeaderboardQuery},
  progression::level_for_xp,
  store::LeaderboardStore,
};
use rusqlite::params;

use super::SqliteStore;
use crate::{
  Result,
  encode::{decode_enum, decode_int, decode_uuid, encode_dt},
};

/// Score expression per category. `?1` is the window start, or NULL for all
/// time; `?2` (the limit) is always bound, so `?1` may go unused.
fn score_sql(query: &LeaderboardQuery) -> &'static str {
  match (query.category, query.since) {
    (LeaderboardCategory::Xp, None) => "p.xp",
    (LeaderboardCategory::Xp, Some(_)) => {
      "MAX(0, COALESCE((SELECT SUM(l.amount) FROM xp_ledger l
                        WHERE l.user_id = p.user_id AND l.recorded_at >= ?1), 0))"
    }
    (LeaderboardCategory::Challenges, _) => {
      "(SELECT COUNT(*) FROM user_challenges c
        WHERE c.user_id = p.user_id AND c.status = 'completed'
          AND (?1 IS NULL OR c.completed_at >= ?1))"
    }
    (LeaderboardCategory::Streak, _) => "p.daily_streak",
  }
}

struct RawEntry {
  user_id:   String,
  pen_name:  String,
  score:     i64,
  xp:        i64,
  tech_tier: String,
}

impl LeaderboardStore for SqliteStore {
  async fn leaderboard<'a>(&'a self, query: &'a LeaderboardQuery) -> Result<Vec<LeaderboardEntry>> {
    let sql = format!(
      "SELECT u.user_id, u.pen_name, {score} AS score, p.xp, p.tech_tier
       FROM user_profiles p
       JOIN users u ON u.user_id = p.user_id
       ORDER BY score DESC, u.pen_name ASC
       LIMIT ?2",
      score = score_sql(query),
    );
    let since = query.since.map(encode_dt);
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);

    let raws = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![since, limit], |row| {
            Ok(RawEntry {
              user_id:   row.get(0)?,
              pen_name:  row.get(1)?,
              score:     row.get(2)?,
              xp:        row.get(3)?,
              tech_tier: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .enumerate()
      .map(|(i, raw)| {
        let xp: u64 = decode_int(raw.xp, "xp")?;
        Ok(LeaderboardEntry {
          rank:      decode_int(i as i64 + 1, "rank")?,
          user_id:   decode_uuid(&raw.user_id)?,
          pen_name:  raw.pen_name,
          score:     decode_int(raw.score, "score")?,
          level:     level_for_xp(xp),
          tech_tier: decode_enum(&raw.tech_tier, "tech tier")?,
        })
      })
      .collect()
  }
}
