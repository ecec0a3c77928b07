use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use sleepon_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer JWT, then hand its [`Claims`] to the
/// handler through request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))?;

    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
