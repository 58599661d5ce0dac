//! Clans and their capacity-bounded membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

pub const DEFAULT_MAX_MEMBERS: u32 = 50;
pub const MAX_CLAN_SIZE: u32 = 500;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClanRole {
  Leader,
  Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clan {
  pub id:           Uuid,
  pub name:         String,
  pub description:  String,
  pub owner_id:     Uuid,
  pub max_members:  u32,
  /// Counted from membership rows at read time.
  pub member_count: u32,
  pub created_at:   DateTime<Utc>,
}

impl Clan {
  pub fn has_capacity(&self) -> bool { self.member_count < self.max_members }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanMember {
  pub clan_id:   Uuid,
  pub user_id:   Uuid,
  pub pen_name:  String,
  pub role:      ClanRole,
  pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanDetail {
  #[serde(flatten)]
  pub clan:    Clan,
  pub members: Vec<ClanMember>,
}

/// Body of `POST /api/clans`. The creator becomes the leader and occupies
/// one seat.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClan {
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default = "default_max_members")]
  pub max_members: u32,
}

fn default_max_members() -> u32 { DEFAULT_MAX_MEMBERS }

impl NewClan {
  pub fn validate(&self) -> Result<()> {
    let len = self.name.trim().chars().count();
    if !(3..=40).contains(&len) {
      return Err(Error::Invalid("clan name must be 3-40 characters".into()));
    }
    if self.max_members == 0 || self.max_members > MAX_CLAN_SIZE {
      return Err(Error::Invalid(format!(
        "max members must be between 1 and {MAX_CLAN_SIZE}"
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capacity_is_strictly_below_max() {
    let mut clan = Clan {
      id:           Uuid::new_v4(),
      name:         "Borrow Checkers".into(),
      description:  String::new(),
      owner_id:     Uuid::new_v4(),
      max_members:  2,
      member_count: 1,
      created_at:   Utc::now(),
    };
    assert!(clan.has_capacity());
    clan.member_count = 2;
    assert!(!clan.has_capacity());
  }

  #[test]
  fn new_clan_validation() {
    let ok: NewClan = serde_json::from_value(serde_json::json!({ "name": "Rustaceans" })).unwrap();
    assert_eq!(ok.max_members, DEFAULT_MAX_MEMBERS);
    assert!(ok.validate().is_ok());

    let tiny = NewClan { name: "ab".into(), description: String::new(), max_members: 5 };
    assert!(tiny.validate().is_err());

    let empty = NewClan { name: "Lonely".into(), description: String::new(), max_members: 0 };
    assert!(empty.validate().is_err());
  }
}
