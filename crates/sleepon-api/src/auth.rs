use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use sleepon_ai::{Moderator, TextGenerator};
use sleepon_db::Database;
use sleepon_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::summary::SummaryCache;

/// Lifetime of an issued bearer token.
pub const TOKEN_TTL_HOURS: i64 = 72;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub ai: Arc<dyn TextGenerator>,
    pub moderator: Moderator,
    pub summaries: SummaryCache,
}

impl AppStateInner {
    pub fn new(
        db: Database,
        jwt_secret: String,
        ai: Arc<dyn TextGenerator>,
        moderation_fail_open: bool,
    ) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret,
            moderator: Moderator::new(ai.clone(), moderation_fail_open),
            ai,
            summaries: SummaryCache::new(),
        })
    }
}

/// Run blocking database work off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal("Internal server error".into())
        })?
        .map_err(ApiError::from)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let name_len = username.chars().count();
    if !(3..=32).contains(&name_len) {
        return Err(ApiError::BadRequest(
            "Username must be between 3 and 32 characters".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let lookup = username.clone();
    if run_db(&state, move |db| db.get_user_by_username(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            ApiError::Internal("Failed to hash password".into())
        })?
        .to_string();

    let user_id = Uuid::new_v4().to_string();
    let name = username.clone();
    let created = run_db(&state, move |db| {
        db.create_user(&user_id, &name, &password_hash, Utc::now())
    })
    .await?;

    // Lost a race with a concurrent registration of the same name
    if !created {
        return Err(ApiError::Conflict("Username already exists".into()));
    }

    info!("User {} registered", username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let lookup = req.username.trim().to_string();
    let user = run_db(&state, move |db| db.get_user_by_username(&lookup))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(|e| {
        error!("Stored password hash for {} is unreadable: {}", user.username, e);
        ApiError::Internal("Internal server error".into())
    })?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".into()))?;

    let token = create_token(&state.jwt_secret, &user.username).map_err(|e| {
        error!("Token signing failed: {}", e);
        ApiError::Internal("Failed to issue token".into())
    })?;

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        username: user.username,
        display_name: user.display_name,
        avatar: user.avatar,
    }))
}

pub fn create_token(secret: &str, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        username: username.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
