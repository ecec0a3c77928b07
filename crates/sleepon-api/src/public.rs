//! Public feed and comments on public entries.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use sleepon_db::models::CommentRow;
use sleepon_types::api::{Claims, CommentResponse, CreateCommentRequest, EntryResponse};
use sleepon_types::lifecycle::apply_lock;
use sleepon_types::models::display_author;

use crate::auth::{AppState, run_db};
use crate::entries::{entry_not_found, entry_response, parse_stored_id};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

/// Comment as shown to readers. The stored row keeps the real author.
fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_stored_id(&row.id, "comment"),
        entry_id: parse_stored_id(&row.entry_id, "entry"),
        username: display_author(&row.username, row.is_anonymous),
        content: row.content,
        is_anonymous: row.is_anonymous,
        created_at: row.created_at,
    }
}

pub async fn get_public_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let now = Utc::now();
    let rows = run_db(&state, move |db| db.public_entries(now)).await?;

    let entries = rows
        .into_iter()
        .map(|row| {
            let mut entry = entry_response(row, Vec::new());
            entry.username = display_author(&entry.username, entry.is_anonymous);
            apply_lock(&mut entry, now, true);
            entry
        })
        .collect();

    Ok(Json(entries))
}

pub async fn get_comments(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_comments(&id.to_string())).await?;
    Ok(Json(rows.into_iter().map(comment_response).collect()))
}

/// Post a comment under someone's public entry once moderation allows it.
pub async fn post_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment content is required".into()));
    }

    let entry = run_db(&state, move |db| db.get_entry_by_id(&id.to_string()))
        .await?
        .ok_or_else(entry_not_found)?;

    if !entry.is_public {
        return Err(ApiError::forbidden("This entry is not public"));
    }

    let verdict = state
        .moderator
        .review(&entry.content, &req.content)
        .await
        .map_err(|e| {
            error!("Moderation failed for comment on {}: {}", id, e);
            ApiError::Internal("Failed to moderate comment".into())
        })?;

    if !verdict.allowed {
        info!("Comment by {} on {} rejected: {}", claims.username, id, verdict.reason);
        return Err(ApiError::Forbidden {
            message: "Comment rejected by moderation".into(),
            reason: Some(verdict.reason),
        });
    }

    let row = CommentRow {
        id: Uuid::new_v4().to_string(),
        entry_id: entry.id,
        username: claims.username,
        content: req.content,
        is_anonymous: req.is_anonymous,
        created_at: Utc::now(),
    };

    let row = run_db(&state, move |db| {
        db.insert_comment(&row)?;
        Ok(row)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleepon_types::models::ANONYMOUS_NAME;

    #[test]
    fn anonymous_comment_hides_author() {
        let row = CommentRow {
            id: Uuid::new_v4().to_string(),
            entry_id: Uuid::new_v4().to_string(),
            username: "somchai".into(),
            content: "stay strong".into(),
            is_anonymous: true,
            created_at: Utc::now(),
        };
        let shown = comment_response(row.clone());
        assert_eq!(shown.username, ANONYMOUS_NAME);

        let named = comment_response(CommentRow {
            is_anonymous: false,
            ..row
        });
        assert_eq!(named.username, "somchai");
    }
}
