use axum::{Extension, Json, extract::State};

use sleepon_types::api::{Claims, ProfileResponse, UpdateProfileRequest, UpdateProfileResponse};

use crate::auth::{AppState, run_db};
use crate::error::ApiError;
use crate::extract::ApiJson;

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = run_db(&state, move |db| db.get_user_by_username(&claims.username))
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(ProfileResponse {
        username: user.username,
        display_name: user.display_name,
        avatar: user.avatar,
    }))
}

/// Replace display name and avatar. Omitted fields are cleared.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let display_name = req.display_name.trim().to_string();
    let avatar = req.avatar;

    let (name, pic) = (display_name.clone(), avatar.clone());
    let updated = run_db(&state, move |db| {
        db.update_profile(&claims.username, &name, &pic)
    })
    .await?;

    if !updated {
        return Err(user_not_found());
    }

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated".into(),
        display_name,
        avatar,
    }))
}
