//! Reflecting on an entry: the status state machine plus the supportive
//! reply that goes with it.

use axum::{Extension, Json, extract::State};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sleepon_ai::fallback::{OVER_IT_FALLBACK, pick_fallback};
use sleepon_ai::prompts::{HistoryStep, growth_summary_prompt, reflection_prompt};
use sleepon_db::models::ReflectionUpdate;
use sleepon_types::api::{Claims, ReflectionResponse, RespondRequest, RespondResponse};
use sleepon_types::lifecycle::{EntryState, Transition, apply_lock, transition};
use sleepon_types::models::EntryStatus;

use crate::auth::{AppState, run_db};
use crate::entries::{entry_not_found, entry_response, reflection_response};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

pub async fn respond(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RespondRequest>,
) -> Result<Json<RespondResponse>, ApiError> {
    let (mut row, history) = run_db(&state, move |db| {
        let id = id.to_string();
        let Some(row) = db.get_entry(&id, &claims.username)? else {
            return Ok(None);
        };
        let history = db.get_reflections(&id)?;
        Ok(Some((row, history)))
    })
    .await?
    .ok_or_else(entry_not_found)?;

    let mut reflections: Vec<ReflectionResponse> =
        history.into_iter().filter_map(reflection_response).collect();

    let now = Utc::now();
    let prior = EntryState {
        need_help_count: row.need_help_count,
        unlock_at: row.unlock_at,
        is_finished: row.is_finished,
    };
    let next = transition(prior, req.status, now);

    let ai_response = supportive_reply(&state, &row.content, &req.reflection, &reflections, &next).await;

    let history_id = Uuid::new_v4();
    {
        let entry_id = row.id.clone();
        let reflection = req.reflection.clone();
        let ai_response = ai_response.clone();
        run_db(&state, move |db| {
            db.apply_reflection(&ReflectionUpdate {
                history_id: &history_id.to_string(),
                entry_id: &entry_id,
                reflection: &reflection,
                status: next.status.as_str(),
                ai_response: &ai_response,
                need_help_count: next.need_help_count,
                unlock_at: next.unlock_at,
                is_finished: next.is_finished,
                created_at: now,
            })
        })
        .await?;
    }

    info!(
        "Entry {} responded with {} (need-help streak {})",
        row.id, next.status, next.need_help_count
    );

    row.status = Some(next.status.as_str().to_string());
    row.reflection = req.reflection.clone();
    row.ai_response = ai_response.clone();
    row.need_help_count = next.need_help_count;
    row.unlock_at = next.unlock_at;
    row.is_finished = next.is_finished;

    reflections.push(ReflectionResponse {
        id: history_id,
        entry_id: id,
        content: req.reflection,
        status: next.status,
        ai_response: ai_response.clone(),
        created_at: now,
    });

    let mut entry = entry_response(row, reflections);
    apply_lock(&mut entry, now, false);

    Ok(Json(RespondResponse { entry, ai_response }))
}

/// Generated reply for the transition, or a canned one when the model is down.
async fn supportive_reply(
    state: &AppState,
    original: &str,
    reflection: &str,
    history: &[ReflectionResponse],
    next: &Transition,
) -> String {
    let prompt = match next.status {
        EntryStatus::OverIt => {
            let steps: Vec<HistoryStep<'_>> = history
                .iter()
                .map(|r| HistoryStep {
                    content: &r.content,
                    status: r.status,
                })
                .collect();
            growth_summary_prompt(original, &steps, reflection)
        }
        status => reflection_prompt(original, reflection, status, next.concern, next.need_help_count),
    };

    match state.ai.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Supportive reply unavailable, using fallback: {}", e);
            match next.status {
                EntryStatus::OverIt => OVER_IT_FALLBACK.to_string(),
                status => pick_fallback(status, next.concern).to_string(),
            }
        }
    }
}
