//! HTTP surface of SleepOn: handlers, bearer auth and the route table.

pub mod auth;
pub mod entries;
pub mod error;
pub mod extract;
pub mod insights;
pub mod middleware;
pub mod preferences;
pub mod profile;
pub mod public;
pub mod reflect;
pub mod summary;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

async fn health() -> &'static str {
    "ok"
}

/// Full route table with state attached. Callers add transport layers.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/public/entries", get(public::get_public_entries))
        .route("/entries/{id}/comments", get(public::get_comments));

    let protected_routes = Router::new()
        .route("/profile", get(profile::get_profile).post(profile::update_profile))
        .route("/entries", get(entries::list_entries).post(entries::create_entry))
        .route("/entries/{id}", get(entries::get_entry).delete(entries::delete_entry))
        .route("/entries/{id}/respond", post(reflect::respond))
        .route("/entries/{id}/unlock", post(entries::unlock_entry))
        .route("/entries/{id}/public", post(entries::toggle_public))
        .route("/entries/{id}/comments", post(public::post_comment))
        .route("/summary", get(summary::get_summary))
        .route("/ai/prompts", get(insights::get_ai_prompts))
        .route("/ai/weekly-digest", get(insights::get_weekly_digest))
        .route("/ai/alerts", get(insights::get_pattern_alerts))
        .route("/ai/questions", get(insights::get_ai_questions))
        .route(
            "/preferences",
            get(preferences::get_preferences).post(preferences::save_preference),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
