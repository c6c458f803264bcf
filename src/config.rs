use crate::sync::DEFAULT_COOLDOWN;
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/progress.json";
const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:5000/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub remote_url: String,
    pub sync_cooldown: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_or("PORT", DEFAULT_PORT),
            data_path: resolve_data_path(),
            remote_url: env::var("JAPA_REMOTE_URL").unwrap_or_else(|_| {
                info!("JAPA_REMOTE_URL not set, using default: {DEFAULT_REMOTE_URL}");
                DEFAULT_REMOTE_URL.to_string()
            }),
            sync_cooldown: Duration::from_millis(parse_or(
                "JAPA_SYNC_COOLDOWN_MS",
                DEFAULT_COOLDOWN.as_millis() as u64,
            )),
        }
    }
}

/// Log filter from `RUST_LOG`, or `info` when it is unset or invalid.
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

pub fn resolve_data_path() -> PathBuf {
    env::var("APP_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH))
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {raw:?}: {err}; using default {default}");
            default
        }),
        Err(_) => default,
    }
}
