use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use sleepon_db::models::PreferenceRow;
use sleepon_types::api::{Claims, PreferenceResponse, SavePreferenceRequest};

use crate::auth::{AppState, run_db};
use crate::entries::parse_stored_id;
use crate::error::ApiError;
use crate::extract::ApiJson;

fn preference_response(row: PreferenceRow) -> PreferenceResponse {
    PreferenceResponse {
        id: parse_stored_id(&row.id, "preference"),
        username: row.username,
        question: row.question,
        answer: row.answer,
        category: row.category,
        created_at: row.created_at,
    }
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PreferenceResponse>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_preferences(&claims.username)).await?;
    Ok(Json(rows.into_iter().map(preference_response).collect()))
}

pub async fn save_preference(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SavePreferenceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.question.trim().is_empty() || req.answer.trim().is_empty() {
        return Err(ApiError::BadRequest("Question and answer are required".into()));
    }

    let row = PreferenceRow {
        id: Uuid::new_v4().to_string(),
        username: claims.username,
        question: req.question,
        answer: req.answer,
        category: req.category,
        created_at: Utc::now(),
    };

    let row = run_db(&state, move |db| {
        db.insert_preference(&row)?;
        Ok(row)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(preference_response(row))))
}
