//! Runtime configuration, read once from the environment at startup.

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Which remote store implementation backs the service
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Supabase { url: String, api_key: String },
    /// Process-local store, used for local development
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub cors_origin: String,
    pub oauth_redirect: String,
    pub patient_name: String,
    /// Idle time after which an anonymous session is evicted
    pub anonymous_session_idle: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match or_default(&lookup, "CARE_STORE", "supabase").as_str() {
            "supabase" => StoreBackend::Supabase {
                url: required(&lookup, "SUPABASE_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                api_key: required(&lookup, "SUPABASE_KEY")?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("CARE_STORE must be 'supabase' or 'memory', got '{}'", other)),
        };

        Ok(Self {
            bind_addr: parsed(&lookup, "CARE_BIND_ADDR", "127.0.0.1:8501")?,
            store,
            cors_origin: or_default(&lookup, "CARE_CORS_ORIGIN", "http://localhost:8080"),
            oauth_redirect: or_default(&lookup, "CARE_OAUTH_REDIRECT", "http://localhost:8501"),
            patient_name: or_default(&lookup, "CARE_PATIENT_NAME", "Fernando Paiva"),
            anonymous_session_idle: Duration::from_secs(parsed(&lookup, "CARE_SESSION_IDLE_SECS", "1800")?),
        })
    }

    /// Configuration for tests and local runs against the in-memory store
    pub fn memory() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            store: StoreBackend::Memory,
            cors_origin: "http://localhost:8080".to_string(),
            oauth_redirect: "http://localhost:8501".to_string(),
            patient_name: "Fernando Paiva".to_string(),
            anonymous_session_idle: Duration::from_secs(30 * 60),
        }
    }
}

fn or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("Environment variable {key} is required"))
}

fn parsed<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    or_default(lookup, key, default)
        .parse()
        .with_context(|| format!("Invalid {key} value"))
}
