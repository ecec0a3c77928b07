use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use sleepon_db::models::{EntryRow, NewEntry, ReflectionRow};
use sleepon_types::api::{
    Claims, CreateEntryRequest, EntryActionResponse, EntryResponse, ReflectionResponse,
    TogglePublicRequest,
};
use sleepon_types::lifecycle::{apply_lock, initial_unlock_at};
use sleepon_types::models::EntryStatus;

use crate::auth::{AppState, run_db};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

pub(crate) fn entry_not_found() -> ApiError {
    ApiError::NotFound("Entry not found".into())
}

/// Parse a stored id. Rows are only written by this service, so a bad value
/// means the file was edited by hand; it is logged and replaced by the nil id.
pub(crate) fn parse_stored_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id {:?} in database: {}", what, raw, e);
        Uuid::nil()
    })
}

pub(crate) fn parse_stored_status(raw: Option<&str>, entry_id: &str) -> Option<EntryStatus> {
    let raw = raw?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Entry {} has {}; treating as pending", entry_id, e);
            None
        }
    }
}

/// Reflection history record, or `None` when its status is unreadable.
pub(crate) fn reflection_response(row: ReflectionRow) -> Option<ReflectionResponse> {
    let status = match row.status.parse() {
        Ok(status) => status,
        Err(e) => {
            warn!("Skipping reflection {}: {}", row.id, e);
            return None;
        }
    };

    Some(ReflectionResponse {
        id: parse_stored_id(&row.id, "reflection"),
        entry_id: parse_stored_id(&row.entry_id, "entry"),
        content: row.content,
        status,
        ai_response: row.ai_response,
        created_at: row.created_at,
    })
}

/// Row to response, before lock rules are applied.
pub(crate) fn entry_response(row: EntryRow, reflections: Vec<ReflectionResponse>) -> EntryResponse {
    EntryResponse {
        id: parse_stored_id(&row.id, "entry"),
        status: parse_stored_status(row.status.as_deref(), &row.id),
        username: row.username,
        title: row.title,
        content: row.content,
        mood: row.mood,
        reflection: row.reflection,
        ai_response: row.ai_response,
        need_help_count: row.need_help_count,
        preview: String::new(),
        is_locked: false,
        unlock_at: row.unlock_at,
        created_at: row.created_at,
        is_public: row.is_public,
        is_anonymous: row.is_anonymous,
        is_finished: row.is_finished,
        reflections,
    }
}

/// Owner's private entries, newest first. Sealed bodies are withheld.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let rows = run_db(&state, move |db| db.list_private_entries(&claims.username)).await?;

    let now = Utc::now();
    let entries = rows
        .into_iter()
        .map(|row| {
            let mut entry = entry_response(row, Vec::new());
            apply_lock(&mut entry, now, true);
            entry
        })
        .collect();

    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EntryResponse>, ApiError> {
    let (row, history) = run_db(&state, move |db| {
        let id = id.to_string();
        let Some(row) = db.get_entry(&id, &claims.username)? else {
            return Ok(None);
        };
        let history = db.get_reflections(&id)?;
        Ok(Some((row, history)))
    })
    .await?
    .ok_or_else(entry_not_found)?;

    let reflections = history.into_iter().filter_map(reflection_response).collect();
    let mut entry = entry_response(row, reflections);
    apply_lock(&mut entry, Utc::now(), false);

    Ok(Json(entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Title and content are required".into()));
    }

    let now = Utc::now();
    let row = EntryRow {
        id: Uuid::new_v4().to_string(),
        username: claims.username,
        title: req.title,
        content: req.content,
        mood: req.mood,
        reflection: String::new(),
        ai_response: String::new(),
        status: None,
        need_help_count: 0,
        unlock_at: initial_unlock_at(req.is_public, now),
        is_public: req.is_public,
        is_anonymous: req.is_anonymous,
        is_finished: false,
        created_at: now,
    };

    let row = run_db(&state, move |db| {
        db.insert_entry(&NewEntry {
            id: &row.id,
            username: &row.username,
            title: &row.title,
            content: &row.content,
            mood: &row.mood,
            unlock_at: row.unlock_at,
            is_public: row.is_public,
            is_anonymous: row.is_anonymous,
            created_at: row.created_at,
        })?;
        Ok(row)
    })
    .await?;

    info!("Entry {} created by {}", row.id, row.username);

    let mut entry = entry_response(row, Vec::new());
    apply_lock(&mut entry, now, false);

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Lift the seal immediately, whatever the current status.
pub async fn unlock_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EntryActionResponse>, ApiError> {
    let unlocked = run_db(&state, move |db| {
        db.unlock_entry(&id.to_string(), &claims.username, Utc::now())
    })
    .await?;

    if !unlocked {
        return Err(entry_not_found());
    }

    Ok(Json(EntryActionResponse {
        message: "Entry unlocked".into(),
        id,
    }))
}

/// Delete an entry together with its reflection history and comments.
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<EntryActionResponse>, ApiError> {
    let username = claims.username.clone();
    let deleted = run_db(&state, move |db| db.delete_entry(&id.to_string(), &username)).await?;

    if !deleted {
        return Err(entry_not_found());
    }

    info!("Entry {} deleted by {}", id, claims.username);

    Ok(Json(EntryActionResponse {
        message: "Entry deleted".into(),
        id,
    }))
}

pub async fn toggle_public(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TogglePublicRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let row = run_db(&state, move |db| {
        let id = id.to_string();
        if !db.set_visibility(&id, &claims.username, req.is_public, req.is_anonymous)? {
            return Ok(None);
        }
        db.get_entry(&id, &claims.username)
    })
    .await?
    .ok_or_else(entry_not_found)?;

    let mut entry = entry_response(row, Vec::new());
    apply_lock(&mut entry, Utc::now(), false);

    Ok(Json(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: Option<&str>) -> EntryRow {
        let now = Utc::now();
        EntryRow {
            id: Uuid::new_v4().to_string(),
            username: "nok".into(),
            title: "t".into(),
            content: "c".into(),
            mood: "sad".into(),
            reflection: String::new(),
            ai_response: String::new(),
            status: status.map(str::to_string),
            need_help_count: 1,
            unlock_at: now,
            is_public: false,
            is_anonymous: false,
            is_finished: false,
            created_at: now,
        }
    }

    #[test]
    fn known_status_is_parsed() {
        let entry = entry_response(row(Some("need_help")), Vec::new());
        assert_eq!(entry.status, Some(EntryStatus::NeedHelp));
        assert_eq!(entry.need_help_count, 1);
    }

    #[test]
    fn corrupt_status_reads_as_pending() {
        let entry = entry_response(row(Some("furious")), Vec::new());
        assert_eq!(entry.status, None);
    }

    #[test]
    fn corrupt_reflection_is_skipped() {
        let bad = ReflectionRow {
            id: Uuid::new_v4().to_string(),
            entry_id: Uuid::new_v4().to_string(),
            content: "x".into(),
            status: "meh".into(),
            ai_response: String::new(),
            created_at: Utc::now(),
        };
        assert!(reflection_response(bad).is_none());
    }
}
