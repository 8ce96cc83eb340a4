use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

/// Minimum session secret length, the size of a cookie signing key.
const MIN_SESSION_SECRET: usize = 64;

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub session_secret: String,
    pub token_ttl_hours: i64,
    pub session_idle_hours: i64,
    pub templates_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub images_dir: PathBuf,
    pub payment_endpoint: String,
    pub payment_server_key: String,
    pub admin: Option<AdminSeed>,
}

#[derive(Debug)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = var("CROWDFUND_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CROWDFUND_JWT_SECRET is unset or still a placeholder");
        }

        let session_secret = var("CROWDFUND_SESSION_SECRET").unwrap_or_default();
        if session_secret.len() < MIN_SESSION_SECRET {
            bail!("CROWDFUND_SESSION_SECRET must be at least {} bytes", MIN_SESSION_SECRET);
        }

        let admin = match (var("CROWDFUND_ADMIN_EMAIL"), var("CROWDFUND_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed { email, password }),
            (None, None) => None,
            _ => bail!("CROWDFUND_ADMIN_EMAIL and CROWDFUND_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            host: var("CROWDFUND_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed("CROWDFUND_PORT", 8080)?,
            db_path: var("CROWDFUND_DB_PATH").unwrap_or_else(|| "crowdfund.db".into()).into(),
            jwt_secret,
            session_secret,
            token_ttl_hours: parsed("CROWDFUND_TOKEN_TTL_HOURS", 720)?,
            session_idle_hours: parsed("CROWDFUND_SESSION_IDLE_HOURS", 24)?,
            templates_dir: var("CROWDFUND_TEMPLATES_DIR")
                .unwrap_or_else(|| "./web/templates".into())
                .into(),
            assets_dir: var("CROWDFUND_ASSETS_DIR").unwrap_or_else(|| "./web/assets".into()).into(),
            images_dir: var("CROWDFUND_IMAGES_DIR").unwrap_or_else(|| "./images".into()).into(),
            payment_endpoint: var("CROWDFUND_PAYMENT_ENDPOINT")
                .unwrap_or_else(|| crowdfund_api::payment::SANDBOX_ENDPOINT.into()),
            payment_server_key: var("CROWDFUND_PAYMENT_SERVER_KEY").unwrap_or_default(),
            admin,
        })
    }
}

/// A set, non-blank variable.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid {}: {:?}", name, raw)),
        None => Ok(default),
    }
}
