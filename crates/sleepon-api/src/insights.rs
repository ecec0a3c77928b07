//! AI-assisted extras: writing prompts, weekly digest, need-help alerts and
//! get-to-know-you questions. Each degrades to fixed content when the model
//! is unavailable or replies with something undecodable.

use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State};
use chrono::{Duration, Utc};
use tracing::warn;

use sleepon_ai::fallback::{CRISIS_HOTLINE, NO_ENTRIES_DIGEST, default_writing_prompts, sample_questions};
use sleepon_ai::prompts::{EntrySnapshot, questions_prompt, weekly_digest_prompt, writing_prompts_prompt};
use sleepon_ai::structured::decode_json;
use sleepon_db::models::EntryRow;
use sleepon_types::api::{
    Alert, AlertLevel, AlertsResponse, Claims, PromptsResponse, Question, QuestionsResponse,
    WeeklyDigestResponse,
};
use sleepon_types::models::EntryStatus;

use crate::auth::{AppState, run_db};
use crate::entries::parse_stored_status;
use crate::error::ApiError;

const PROMPT_CONTEXT_ENTRIES: u32 = 5;
const ALERT_WINDOW: u32 = 10;
const DIGEST_DAYS: i64 = 7;
const QUESTION_COUNT: usize = 3;

fn snapshot(e: &EntryRow) -> EntrySnapshot<'_> {
    EntrySnapshot {
        title: &e.title,
        content: &e.content,
        mood: &e.mood,
        reflection: &e.reflection,
        ai_response: &e.ai_response,
        status: parse_stored_status(e.status.as_deref(), &e.id),
    }
}

pub async fn get_ai_prompts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<PromptsResponse>, ApiError> {
    let recent = run_db(&state, move |db| {
        db.recent_entries(&claims.username, PROMPT_CONTEXT_ENTRIES)
    })
    .await?;

    let snapshots: Vec<_> = recent.iter().map(snapshot).collect();
    let prompts = match state.ai.generate(&writing_prompts_prompt(&snapshots)).await {
        Ok(reply) => match decode_json::<Vec<String>>(&reply) {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => default_writing_prompts(),
            Err(e) => {
                warn!("Undecodable writing prompts: {}", e);
                default_writing_prompts()
            }
        },
        Err(e) => {
            warn!("Writing prompts unavailable: {}", e);
            default_writing_prompts()
        }
    };

    Ok(Json(PromptsResponse { prompts }))
}

pub async fn get_weekly_digest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<WeeklyDigestResponse>, ApiError> {
    let since = Utc::now() - Duration::days(DIGEST_DAYS);
    let week = run_db(&state, move |db| db.entries_since(&claims.username, since)).await?;

    if week.is_empty() {
        return Ok(Json(WeeklyDigestResponse {
            digest: NO_ENTRIES_DIGEST.to_string(),
            has_data: false,
            entry_count: 0,
            moods: BTreeMap::new(),
            statuses: BTreeMap::new(),
        }));
    }

    let mut moods = BTreeMap::new();
    let mut statuses = BTreeMap::new();
    for e in &week {
        if !e.mood.is_empty() {
            *moods.entry(e.mood.clone()).or_insert(0) += 1;
        }
        if let Some(status) = parse_stored_status(e.status.as_deref(), &e.id) {
            *statuses.entry(status.to_string()).or_insert(0) += 1;
        }
    }

    let snapshots: Vec<_> = week.iter().map(snapshot).collect();
    let digest = state
        .ai
        .generate(&weekly_digest_prompt(&snapshots))
        .await
        .unwrap_or_else(|e| {
            warn!("Weekly digest unavailable: {}", e);
            String::new()
        });

    Ok(Json(WeeklyDigestResponse {
        digest,
        has_data: true,
        entry_count: week.len(),
        moods,
        statuses,
    }))
}

/// Alerts for a window of statuses ordered newest first.
pub fn pattern_alerts(statuses: &[Option<EntryStatus>]) -> AlertsResponse {
    let mut need_help = 0u32;
    let mut streak = 0u32;
    let mut max_streak = 0u32;

    for status in statuses {
        if *status == Some(EntryStatus::NeedHelp) {
            need_help += 1;
            streak += 1;
            max_streak = max_streak.max(streak);
        } else {
            streak = 0;
        }
    }

    let mut alerts = Vec::new();
    if max_streak >= 3 {
        alerts.push(Alert {
            level: AlertLevel::Critical,
            title: "You've been struggling for a while".into(),
            message: format!(
                "You chose \"need help\" {max_streak} times in a row. Please talk to someone you trust, \
                 or call the mental health hotline {CRISIS_HOTLINE}."
            ),
        });
    } else if max_streak >= 2 {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            title: "Keep an eye on yourself".into(),
            message: "You've asked for help twice in a row recently. Take some time for yourself \
                      and consider sharing how you feel with someone close."
                .into(),
        });
    }

    if need_help > 5 {
        alerts.push(Alert {
            level: AlertLevel::Info,
            title: "Lots of heavy days lately".into(),
            message: format!(
                "{need_help} of your last {} entries needed help. Looking after yourself matters.",
                statuses.len()
            ),
        });
    }

    AlertsResponse {
        alerts,
        need_help_rate: f64::from(need_help) / statuses.len().max(1) as f64 * 100.0,
        max_streak,
    }
}

pub async fn get_pattern_alerts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let recent = run_db(&state, move |db| db.recent_entries(&claims.username, ALERT_WINDOW)).await?;

    let statuses: Vec<_> = recent
        .iter()
        .map(|e| parse_stored_status(e.status.as_deref(), &e.id))
        .collect();

    Ok(Json(pattern_alerts(&statuses)))
}

pub async fn get_ai_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let (preferences, recent) = run_db(&state, move |db| {
        Ok((
            db.get_preferences(&claims.username)?,
            db.recent_entries(&claims.username, PROMPT_CONTEXT_ENTRIES)?,
        ))
    })
    .await?;

    let answers: Vec<(&str, &str)> = preferences
        .iter()
        .map(|p| (p.question.as_str(), p.answer.as_str()))
        .collect();
    let snapshots: Vec<_> = recent.iter().map(snapshot).collect();

    let questions = match state.ai.generate(&questions_prompt(&answers, &snapshots)).await {
        Ok(reply) => match decode_json::<Vec<Question>>(&reply) {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => sample_questions(QUESTION_COUNT),
            Err(e) => {
                warn!("Undecodable questions: {}", e);
                sample_questions(QUESTION_COUNT)
            }
        },
        Err(e) => {
            warn!("Questions unavailable: {}", e);
            sample_questions(QUESTION_COUNT)
        }
    };

    Ok(Json(QuestionsResponse { questions }))
}
