//! Turning a newly completed activity into XP, a streak tick and badges.
//!
//! Handlers call [`grant_completion`] only after a store transition reports
//! `newly_completed`, so a completion is rewarded at most once. The
//! transition commits first; an award that then fails is logged at `error`
//! and is not retried.

use questline_core::{
  activity::{ContentKind, Transition},
  progression::{TechTier, XpAward, XpSource, xp_to_next_level},
  store::ProfileStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// What the caller gained from an award, as shown to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
  pub xp_awarded:       i64,
  pub total_xp:         u64,
  pub level:            u64,
  pub leveled_up:       bool,
  pub xp_to_next_level: u64,
  pub tech_tier:        TechTier,
  pub promoted_to:      Option<TechTier>,
  pub daily_streak:     u32,
  pub badges:           Vec<String>,
}

/// The `achievement` block returned with a completing transition. `reward`
/// is `null` when the user has no profile to credit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
  pub kind:       ContentKind,
  pub content_id: Uuid,
  pub xp_reward:  u32,
  pub reward:     Option<Reward>,
}

/// Response to a state-changing activity call. `achievement` is present
/// only on the call that completed the record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress<T> {
  pub record:          T,
  pub newly_completed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub achievement:     Option<Achievement>,
}

impl<T> Progress<T> {
  pub fn new(transition: Transition<T>, achievement: Option<Achievement>) -> Self {
    Self {
      record: transition.record,
      newly_completed: transition.newly_completed,
      achievement,
    }
  }
}

/// Award `xp_reward` for completing `kind` `content_id` and record the day's
/// activity for the streak.
pub async fn grant_completion<S>(
  state: &AppState<S>,
  user_id: Uuid,
  kind: ContentKind,
  content_id: Uuid,
  xp_reward: u32,
) -> Result<Achievement, ApiError>
where
  S: ProfileStore,
{
  let source = XpSource::Content { content: kind, id: content_id };
  let award = state
    .store
    .add_xp(user_id, i64::from(xp_reward), source)
    .await
    .map_err(|e| {
      tracing::error!(
        %user_id,
        %kind,
        %content_id,
        xp_reward,
        error = %e,
        "completion recorded but XP award failed"
      );
      ApiError::store(e)
    })?;

  let outcome = match award {
    XpAward::Applied(outcome) => outcome,
    XpAward::ProfileMissing => {
      tracing::warn!(%user_id, %kind, %content_id, "completion not rewarded: user has no profile");
      return Ok(Achievement { kind, content_id, xp_reward, reward: None });
    }
  };

  if let Some(tier) = outcome.promoted_to {
    tracing::info!(%user_id, %tier, level = outcome.profile.level, "tier promotion");
  }

  let profile = state
    .store
    .record_activity(user_id, state.clock.today())
    .await
    .map_err(ApiError::store)?
    .unwrap_or_else(|| outcome.profile.clone());

  tracing::info!(
    %user_id,
    %kind,
    %content_id,
    xp = outcome.applied,
    total_xp = profile.xp,
    "completion rewarded"
  );

  let reward = Reward {
    xp_awarded:       outcome.applied,
    total_xp:         profile.xp,
    level:            profile.level,
    leveled_up:       outcome.leveled_up(),
    xp_to_next_level: xp_to_next_level(profile.xp),
    tech_tier:        profile.tech_tier,
    promoted_to:      outcome.promoted_to,
    daily_streak:     profile.daily_streak,
    badges:           profile.badges,
  };
  Ok(Achievement { kind, content_id, xp_reward, reward: Some(reward) })
}
