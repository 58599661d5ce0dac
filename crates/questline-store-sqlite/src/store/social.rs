//! Direct messages and clans.

use std::collections::HashMap;

use questline_core::{
  Error as CoreError,
  clan::{Clan, ClanDetail, ClanMember, ClanRole, NewClan},
  message::{ConversationSummary, Message, NewMessage},
  store::SocialStore,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use super::{SqliteStore, collect_rows, profiles::user_exists};
use crate::{
  Result,
  encode::{
    CLAN_COLUMNS, CLAN_MEMBER_COLUMNS, MESSAGE_COLUMNS, RawClan, RawClanMember, RawMessage,
    decode_int, encode_dt, encode_uuid,
  },
};

fn load_clan(conn: &Connection, clan_id: Uuid) -> Result<Option<Clan>> {
  conn
    .query_row(
      &format!("SELECT {CLAN_COLUMNS} FROM clans c WHERE c.clan_id = ?1"),
      params![encode_uuid(clan_id)],
      RawClan::from_row,
    )
    .optional()?
    .map(RawClan::into_clan)
    .transpose()
}

fn load_member(conn: &Connection, clan_id: Uuid, user_id: Uuid) -> Result<Option<ClanMember>> {
  conn
    .query_row(
      &format!(
        "SELECT {CLAN_MEMBER_COLUMNS}
         FROM clan_members m JOIN users u ON u.user_id = m.user_id
         WHERE m.clan_id = ?1 AND m.user_id = ?2"
      ),
      params![encode_uuid(clan_id), encode_uuid(user_id)],
      RawClanMember::from_row,
    )
    .optional()?
    .map(RawClanMember::into_member)
    .transpose()
}

fn insert_member(
  conn: &Connection,
  clan_id: Uuid,
  user_id: Uuid,
  role: ClanRole,
  joined_at: &str,
) -> Result<()> {
  conn.execute(
    "INSERT INTO clan_members (clan_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
    params![encode_uuid(clan_id), encode_uuid(user_id), role.as_ref(), joined_at],
  )?;
  Ok(())
}

impl SocialStore for SqliteStore {
  // ─── Messages ──────────────────────────────────────────────────────────────

  async fn send_message(&self, input: NewMessage) -> Result<Message> {
    let message = Message {
      id:          Uuid::new_v4(),
      sender_id:   input.sender_id,
      receiver_id: input.receiver_id,
      content:     input.content,
      is_read:     false,
      created_at:  self.clock.now(),
    };
    let row = message.clone();

    self
      .write(move |conn| {
        if !user_exists(conn, row.receiver_id)? {
          return Err(CoreError::UserNotFound(row.receiver_id).into());
        }
        conn.execute(
          &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
          params![
            encode_uuid(row.id),
            encode_uuid(row.sender_id),
            encode_uuid(row.receiver_id),
            row.content,
            row.is_read,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(message)
  }

  async fn conversation(&self, user_id: Uuid, partner_id: Uuid) -> Result<Vec<Message>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE (sender_id = ?1 AND receiver_id = ?2)
              OR (sender_id = ?2 AND receiver_id = ?1)
           ORDER BY created_at, rowid"
        ))?;
        collect_rows(
          &mut stmt,
          params![encode_uuid(user_id), encode_uuid(partner_id)],
          RawMessage::from_row,
          RawMessage::into_message,
        )
      })
      .await
  }

  async fn mark_conversation_read(&self, user_id: Uuid, partner_id: Uuid) -> Result<u32> {
    self
      .write(move |conn| {
        let n = conn.execute(
          "UPDATE messages SET is_read = 1
           WHERE sender_id = ?1 AND receiver_id = ?2 AND is_read = 0",
          params![encode_uuid(partner_id), encode_uuid(user_id)],
        )?;
        decode_int(n as i64, "read count")
      })
      .await
  }

  async fn conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
    let rows = self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.message_id, m.sender_id, m.receiver_id, m.content, m.is_read,
                  m.created_at, u.pen_name
           FROM messages m
           JOIN users u ON u.user_id =
             CASE WHEN m.sender_id = ?1 THEN m.receiver_id ELSE m.sender_id END
           WHERE m.sender_id = ?1 OR m.receiver_id = ?1
           ORDER BY m.created_at DESC, m.rowid DESC",
        )?;
        let raws = stmt
          .query_map(params![encode_uuid(user_id)], |row| {
            Ok((RawMessage::from_row(row)?, row.get::<_, String>(6)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws
          .into_iter()
          .map(|(raw, pen_name)| Ok((raw.into_message()?, pen_name)))
          .collect::<Result<Vec<_>>>()
      })
      .await?;

    // Rows arrive newest first, so the first row seen for a partner is the
    // latest message in that conversation.
    let mut summaries: Vec<ConversationSummary> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    for (message, pen_name) in rows {
      let partner_id =
        if message.sender_id == user_id { message.receiver_id } else { message.sender_id };
      let unread = u32::from(message.receiver_id == user_id && !message.is_read);

      match index.get(&partner_id) {
        Some(&i) => summaries[i].unread_count += unread,
        None => {
          index.insert(partner_id, summaries.len());
          summaries.push(ConversationSummary {
            partner_id,
            partner_pen_name: pen_name,
            last_message: message,
            unread_count: unread,
          });
        }
      }
    }
    Ok(summaries)
  }

  // ─── Clans ─────────────────────────────────────────────────────────────────

  async fn create_clan(&self, owner_id: Uuid, input: NewClan) -> Result<Clan> {
    input.validate()?;
    let clan = Clan {
      id:           Uuid::new_v4(),
      name:         input.name.trim().to_owned(),
      description:  input.description,
      owner_id,
      max_members:  input.max_members,
      member_count: 1,
      created_at:   self.clock.now(),
    };
    let row = clan.clone();

    self
      .write(move |conn| {
        if !user_exists(conn, owner_id)? {
          return Err(CoreError::UserNotFound(owner_id).into());
        }
        let taken = conn
          .query_row("SELECT 1 FROM clans WHERE name = ?1", params![row.name], |_| Ok(true))
          .optional()?
          .unwrap_or(false);
        if taken {
          return Err(CoreError::ClanNameTaken(row.name).into());
        }

        let created_at = encode_dt(row.created_at);
        conn.execute(
          "INSERT INTO clans (clan_id, name, description, owner_id, max_members, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            encode_uuid(row.id),
            row.name,
            row.description,
            encode_uuid(owner_id),
            row.max_members,
            created_at,
          ],
        )?;
        insert_member(conn, row.id, owner_id, ClanRole::Leader, &created_at)?;
        Ok(())
      })
      .await?;

    tracing::debug!(clan_id = %clan.id, %owner_id, "clan created");
    Ok(clan)
  }

  async fn list_clans(&self) -> Result<Vec<Clan>> {
    self
      .read(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CLAN_COLUMNS} FROM clans c ORDER BY c.created_at, c.name"
        ))?;
        collect_rows(&mut stmt, [], RawClan::from_row, RawClan::into_clan)
      })
      .await
  }

  async fn get_clan(&self, id: Uuid) -> Result<Option<ClanDetail>> {
    self
      .read(move |conn| {
        let Some(clan) = load_clan(conn, id)? else {
          return Ok(None);
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {CLAN_MEMBER_COLUMNS}
           FROM clan_members m JOIN users u ON u.user_id = m.user_id
           WHERE m.clan_id = ?1
           ORDER BY m.joined_at, m.rowid"
        ))?;
        let members = collect_rows(
          &mut stmt,
          params![encode_uuid(id)],
          RawClanMember::from_row,
          RawClanMember::into_member,
        )?;
        Ok(Some(ClanDetail { clan, members }))
      })
      .await
  }

  async fn join_clan(&self, clan_id: Uuid, user_id: Uuid) -> Result<ClanMember> {
    let now = self.clock.now();
    let member = self
      .write(move |conn| {
        let Some(clan) = load_clan(conn, clan_id)? else {
          return Err(CoreError::ClanNotFound(clan_id).into());
        };
        if !user_exists(conn, user_id)? {
          return Err(CoreError::UserNotFound(user_id).into());
        }
        if load_member(conn, clan_id, user_id)?.is_some() {
          return Err(CoreError::AlreadyMember { clan_id, user_id }.into());
        }
        // Counted inside the same transaction as the insert, so two joins
        // can never both take the last seat.
        if !clan.has_capacity() {
          return Err(CoreError::ClanFull { clan_id, max_members: clan.max_members }.into());
        }

        insert_member(conn, clan_id, user_id, ClanRole::Member, &encode_dt(now))?;
        load_member(conn, clan_id, user_id)?
          .ok_or_else(|| crate::Error::Decode("clan member vanished after insert".into()))
      })
      .await?;

    tracing::debug!(%clan_id, %user_id, "joined clan");
    Ok(member)
  }
}
