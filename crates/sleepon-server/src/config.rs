//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// JWT secrets copied from sample `.env` files. Refused at startup.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
    "secret",
];

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `SLEEPON_JWT_SECRET`. Required.
    pub jwt_secret: String,
    /// Env: `SLEEPON_DB_PATH`. Default `sleepon.db`.
    pub db_path: PathBuf,
    /// Env: `SLEEPON_HOST` and `SLEEPON_PORT`. Default `0.0.0.0:8080`.
    pub addr: SocketAddr,
    /// Env: `GEMINI_API_KEYS`, comma-separated. Blank items are skipped; at
    /// least one key is required.
    pub gemini_api_keys: Vec<String>,
    /// Env: `GEMINI_MODEL`.
    pub gemini_model: String,
    /// Env: `GEMINI_BASE_URL`.
    pub gemini_base_url: String,
    /// Env: `SLEEPON_AI_TIMEOUT_SECS`. Bounds each credential attempt.
    pub ai_timeout: Duration,
    /// Env: `SLEEPON_MODERATION_FAIL_OPEN`. Default `true`.
    pub moderation_fail_open: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("SLEEPON_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("SLEEPON_JWT_SECRET is unset or still a placeholder");
        }

        let gemini_api_keys: Vec<String> = get("GEMINI_API_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if gemini_api_keys.is_empty() {
            bail!("GEMINI_API_KEYS must list at least one key");
        }

        let host = get("SLEEPON_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SLEEPON_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("SLEEPON_PORT is not a valid port")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let timeout_secs: u64 = get("SLEEPON_AI_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("SLEEPON_AI_TIMEOUT_SECS must be a whole number of seconds")?;

        let moderation_fail_open = match get("SLEEPON_MODERATION_FAIL_OPEN") {
            None => true,
            Some(v) => parse_bool(&v)
                .with_context(|| format!("SLEEPON_MODERATION_FAIL_OPEN: expected true/false, got {v:?}"))?,
        };

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(get("SLEEPON_DB_PATH").unwrap_or_else(|| "sleepon.db".into())),
            addr,
            gemini_api_keys,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            ai_timeout: Duration::from_secs(timeout_secs),
            moderation_fail_open,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
