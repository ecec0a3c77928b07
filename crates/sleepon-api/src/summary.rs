//! Per-user wellbeing summary, cached until any tracked entry field changes.

use std::collections::HashMap;

use axum::{Extension, Json, extract::State};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use sleepon_ai::prompts::{EntrySnapshot, summary_prompt};
use sleepon_db::models::EntryRow;
use sleepon_types::api::{Claims, SummaryResponse, SummaryStats};
use sleepon_types::models::EntryStatus;

use crate::auth::{AppState, run_db};
use crate::entries::parse_stored_status;
use crate::error::ApiError;

/// Hex characters kept from the SHA-256 digest.
pub const HASH_PREFIX_LEN: usize = 32;

/// Score reported before the user has written anything.
pub const EMPTY_SCORE: u32 = 50;

struct CachedSummary {
    hash: String,
    summary: SummaryResponse,
}

/// Last summary computed for each user, keyed by username.
#[derive(Default)]
pub struct SummaryCache {
    slots: RwLock<HashMap<String, CachedSummary>>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached summary for `username` if it was computed from data hashing to `hash`.
    pub async fn get(&self, username: &str, hash: &str) -> Option<SummaryResponse> {
        let slots = self.slots.read().await;
        slots
            .get(username)
            .filter(|cached| cached.hash == hash)
            .map(|cached| cached.summary.clone())
    }

    pub async fn store(&self, username: &str, hash: String, summary: SummaryResponse) {
        self.slots
            .write()
            .await
            .insert(username.to_string(), CachedSummary { hash, summary });
    }
}

/// Fingerprint of every field that feeds the summary.
pub fn content_hash(entries: &[EntryRow]) -> String {
    let mut hasher = Sha256::new();
    for e in entries {
        hasher.update(
            format!(
                "{}:{}:{}:{}:{}:{}|",
                e.id,
                e.content,
                e.reflection,
                e.status.as_deref().unwrap_or(""),
                e.ai_response,
                e.need_help_count
            )
            .as_bytes(),
        );
    }
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(HASH_PREFIX_LEN);
    hash
}

pub fn compute_stats(entries: &[EntryRow]) -> SummaryStats {
    let mut stats = SummaryStats {
        total: entries.len(),
        ..SummaryStats::default()
    };

    for e in entries {
        match parse_stored_status(e.status.as_deref(), &e.id) {
            Some(EntryStatus::OverIt) => stats.over_it += 1,
            Some(EntryStatus::StillDealing) => stats.still_dealing += 1,
            Some(EntryStatus::NeedHelp) => stats.need_help += 1,
            None => stats.pending += 1,
        }
        stats.need_help_streak = stats.need_help_streak.max(e.need_help_count);
    }

    stats
}

/// `resolved * 100 / total - 10 * need_help`, floored at zero. Both
/// `over_it` and `still_dealing` count as resolved.
pub fn mental_score(stats: &SummaryStats) -> u32 {
    if stats.total == 0 {
        return EMPTY_SCORE;
    }
    let resolved = (stats.over_it + stats.still_dealing) as i64;
    let score = resolved * 100 / stats.total as i64 - 10 * stats.need_help as i64;
    score.max(0) as u32
}

pub fn mental_state(score: u32) -> (&'static str, &'static str) {
    match score {
        80.. => ("Doing great", "🌟"),
        60..=79 => ("Doing okay", "😊"),
        40..=59 => ("Needs some care", "😐"),
        20..=39 => ("Worrying", "😔"),
        _ => ("Needs help", "🆘"),
    }
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let username = claims.username.clone();
    let entries = run_db(&state, move |db| db.list_all_entries(&username)).await?;

    let hash = content_hash(&entries);
    if let Some(cached) = state.summaries.get(&claims.username, &hash).await {
        debug!("Summary cache hit for {}", claims.username);
        return Ok(Json(cached));
    }

    let stats = compute_stats(&entries);
    let score = mental_score(&stats);
    let (label, emoji) = mental_state(score);

    let ai_summary = if entries.is_empty() {
        String::new()
    } else {
        let snapshots: Vec<EntrySnapshot<'_>> = entries
            .iter()
            .map(|e| EntrySnapshot {
                title: &e.title,
                content: &e.content,
                mood: &e.mood,
                reflection: &e.reflection,
                ai_response: &e.ai_response,
                status: parse_stored_status(e.status.as_deref(), &e.id),
            })
            .collect();

        state
            .ai
            .generate(&summary_prompt(&stats, score, &snapshots))
            .await
            .unwrap_or_else(|e| {
                warn!("Summary narrative unavailable: {}", e);
                String::new()
            })
    };

    let summary = SummaryResponse {
        stats,
        mental_score: score,
        mental_state: label.to_string(),
        mental_emoji: emoji.to_string(),
        ai_summary,
    };

    state
        .summaries
        .store(&claims.username, hash, summary.clone())
        .await;

    Ok(Json(summary))
}
