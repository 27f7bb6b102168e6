use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub maps_api_key: Option<String>,
    pub maps_base_url: String,
    pub maps_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: log_format(env::var("LOG_FORMAT").ok().as_deref())?,
            database_url: non_empty_var("DATABASE_URL"),
            database_max_connections: parse_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            database_acquire_timeout: Duration::from_secs(parse_or_default(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                5,
            )?),
            maps_api_key: maps_api_key()?,
            maps_base_url: env::var("MAPS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_MAPS_BASE_URL.to_string()),
            maps_timeout: Duration::from_secs(parse_or_default("MAPS_TIMEOUT_SECS", 10)?),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn log_format(raw: Option<&str>) -> Result<LogFormat, AppError> {
    match raw {
        None | Some("compact") => Ok(LogFormat::Compact),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other} (expected compact or json)"
        ))),
    }
}

fn maps_api_key() -> Result<Option<String>, AppError> {
    resolve_maps_api_key(
        non_empty_var("MAPS_API_KEY"),
        non_empty_var("MAPS_API_KEY_FILE"),
    )
}

/// An inline key wins over the key file.
fn resolve_maps_api_key(
    key: Option<String>,
    key_file: Option<String>,
) -> Result<Option<String>, AppError> {
    if let Some(key) = key {
        return Ok(Some(key));
    }

    let Some(path) = key_file else {
        return Ok(None);
    };

    let contents = std::fs::read_to_string(&path).map_err(|err| {
        AppError::Internal(format!("failed to read MAPS_API_KEY_FILE {path}: {err}"))
    })?;
    let key = contents.trim().to_string();

    Ok((!key.is_empty()).then_some(key))
}
