mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sleepon_ai::GeminiClient;
use sleepon_api::AppStateInner;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sleepon=debug,sleepon_api=debug,sleepon_ai=debug,sleepon_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = sleepon_db::Database::open(&config.db_path)?;

    let gemini = GeminiClient::new(
        &config.gemini_base_url,
        &config.gemini_model,
        config.gemini_api_keys.clone(),
        config.ai_timeout,
    )?;
    info!(
        "Using {} with {} API key(s)",
        config.gemini_model,
        gemini.key_count()
    );

    let state = AppStateInner::new(
        db,
        config.jwt_secret.clone(),
        Arc::new(gemini),
        config.moderation_fail_open,
    );

    let app = sleepon_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("SleepOn server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
