//! Entry lifecycle rules: when an entry unlocks, how a reflection moves it
//! between statuses, and what a locked entry is allowed to show.
//!
//! Everything here is pure and takes `now` explicitly so callers (and tests)
//! control the clock.

use chrono::{DateTime, Duration, Utc};

use crate::api::EntryResponse;
use crate::models::EntryStatus;

/// A freshly written private entry stays sealed this long.
pub const INITIAL_LOCK_HOURS: i64 = 24;
pub const NEED_HELP_LOCK_HOURS: i64 = 6;
pub const STILL_DEALING_LOCK_HOURS: i64 = 12;

pub const PREVIEW_CHARS: usize = 50;
pub const LOCKED_PREVIEW: &str = "Locked content...";

/// How worried the supportive response should sound, derived from the
/// need-help streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    Neutral,
    Heightened,
    Escalated,
}

impl Concern {
    pub fn from_streak(streak: u32) -> Self {
        match streak {
            s if s >= 3 => Self::Escalated,
            2 => Self::Heightened,
            _ => Self::Neutral,
        }
    }
}

/// Unlock time for a new entry. Public entries are readable immediately.
pub fn initial_unlock_at(is_public: bool, now: DateTime<Utc>) -> DateTime<Utc> {
    if is_public {
        now
    } else {
        now + Duration::hours(INITIAL_LOCK_HOURS)
    }
}

/// State of an entry before a reflection is applied.
#[derive(Debug, Clone, Copy)]
pub struct EntryState {
    pub need_help_count: u32,
    pub unlock_at: DateTime<Utc>,
    pub is_finished: bool,
}

/// Result of applying one reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: EntryStatus,
    pub need_help_count: u32,
    pub unlock_at: DateTime<Utc>,
    pub is_finished: bool,
    pub concern: Concern,
}

impl Transition {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        is_locked(self.unlock_at, now)
    }
}

/// Apply a reflection with `status` to an entry in `prior` state.
///
/// Re-locking never pulls an existing unlock time earlier: responding to an
/// entry that is still sealed keeps the later of the two deadlines. Only
/// `over_it` (and the explicit unlock operation) move it back to `now`.
pub fn transition(prior: EntryState, status: EntryStatus, now: DateTime<Utc>) -> Transition {
    let relock = |hours: i64| prior.unlock_at.max(now + Duration::hours(hours));

    match status {
        EntryStatus::NeedHelp => {
            let streak = prior.need_help_count.saturating_add(1);
            Transition {
                status,
                need_help_count: streak,
                unlock_at: relock(NEED_HELP_LOCK_HOURS),
                is_finished: prior.is_finished,
                concern: Concern::from_streak(streak),
            }
        }
        EntryStatus::StillDealing => Transition {
            status,
            need_help_count: 0,
            unlock_at: relock(STILL_DEALING_LOCK_HOURS),
            is_finished: prior.is_finished,
            concern: Concern::Neutral,
        },
        EntryStatus::OverIt => Transition {
            status,
            need_help_count: 0,
            unlock_at: now,
            is_finished: true,
            concern: Concern::Neutral,
        },
    }
}

pub fn is_locked(unlock_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now < unlock_at
}

/// First [`PREVIEW_CHARS`] characters of `content`, with an ellipsis when
/// anything was cut.
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Withhold the body of a sealed entry, including the text of its earlier
/// reflections. List views also get a short preview of unlocked content.
pub fn apply_lock(entry: &mut EntryResponse, now: DateTime<Utc>, with_preview: bool) {
    if is_locked(entry.unlock_at, now) {
        entry.is_locked = true;
        entry.content.clear();
        entry.reflection.clear();
        for step in &mut entry.reflections {
            step.content.clear();
        }
        entry.preview = LOCKED_PREVIEW.to_string();
    } else {
        entry.is_locked = false;
        entry.preview = if with_preview {
            preview(&entry.content)
        } else {
            String::new()
        };
    }
}
