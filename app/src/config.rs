// app/src/config.rs

use std::env;

use chrono::Duration;
use dotenvy::dotenv;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs on the in-memory store.
  pub database_url: Option<String>,
  pub database_key: Option<String>,
  pub jwt_secret: String,
  pub jwt_expires_in_secs: u64,
  pub dashboard_ttl_secs: u64,
  pub dashboard_refresh_secs: u64,
  /// Seeds demo rows into the in-memory store.
  pub seed_db: bool,
  /// Password for the seeded `admin@bookstore.local` account.
  pub seed_admin_password: Option<String>,
  pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("jwt_expires_in_secs", &self.jwt_expires_in_secs)
      .field("dashboard_ttl_secs", &self.dashboard_ttl_secs)
      .field("dashboard_refresh_secs", &self.dashboard_refresh_secs)
      .field("seed_db", &self.seed_db)
      .field("log_format", &self.log_format)
      .finish_non_exhaustive()
  }
}

/// Ten years.
pub const MAX_JWT_EXPIRES_IN_SECS: u64 = 315_360_000;
/// One day.
pub const MAX_DASHBOARD_SECS: u64 = 86_400;

fn parse_var<T>(name: &str, raw: String) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value: {}", name, e)))
}

fn bounded_secs(name: &str, raw: String, max: u64) -> Result<u64> {
  let secs: u64 = parse_var(name, raw)?;
  if secs == 0 || secs > max {
    return Err(AppError::Config(format!("{} must be between 1 and {}", name, max)));
  }
  Ok(secs)
}

fn seconds(secs: u64) -> Duration {
  i64::try_from(secs)
    .ok()
    .and_then(Duration::try_seconds)
    .unwrap_or(Duration::MAX)
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let optional = |var_name: &str| get_env(var_name).ok().filter(|v| !v.is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", get_env("SERVER_PORT").unwrap_or_else(|_| "8080".to_string()))?;
    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.is_empty() {
      return Err(AppError::Config("JWT_SECRET cannot be empty".to_string()));
    }
    let jwt_expires_in_secs = bounded_secs(
      "JWT_EXPIRES_IN_SECS",
      get_env("JWT_EXPIRES_IN_SECS").unwrap_or_else(|_| "86400".to_string()),
      MAX_JWT_EXPIRES_IN_SECS,
    )?;
    let dashboard_ttl_secs = bounded_secs(
      "DASHBOARD_TTL_SECS",
      get_env("DASHBOARD_TTL_SECS").unwrap_or_else(|_| "120".to_string()),
      MAX_DASHBOARD_SECS,
    )?;
    let dashboard_refresh_secs = bounded_secs(
      "DASHBOARD_REFRESH_SECS",
      get_env("DASHBOARD_REFRESH_SECS").unwrap_or_else(|_| "300".to_string()),
      MAX_DASHBOARD_SECS,
    )?;
    let seed_db = parse_var("SEED_DB", get_env("SEED_DB").unwrap_or_else(|_| "false".to_string()))?;
    let log_format = match get_env("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()).as_str() {
      "text" => LogFormat::Text,
      "json" => LogFormat::Json,
      other => return Err(AppError::Config(format!("Invalid LOG_FORMAT value: {}", other))),
    };

    let config = Self {
      server_host,
      server_port,
      database_url: optional("DATABASE_URL"),
      database_key: optional("DATABASE_KEY"),
      jwt_secret,
      jwt_expires_in_secs,
      dashboard_ttl_secs,
      dashboard_refresh_secs,
      seed_db,
      seed_admin_password: optional("SEED_ADMIN_PASSWORD"),
      log_format,
    };
    tracing::debug!(config = ?config, "Loaded configuration.");
    Ok(config)
  }

  /// Token lifetime; saturates instead of wrapping for oversized values.
  pub fn jwt_lifetime(&self) -> Duration {
    seconds(self.jwt_expires_in_secs)
  }

  pub fn dashboard_ttl(&self) -> Duration {
    seconds(self.dashboard_ttl_secs)
  }

  /// Defaults for an in-memory instance with the given signing secret.
  pub fn local(jwt_secret: &str) -> Self {
    AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      database_key: None,
      jwt_secret: jwt_secret.to_string(),
      jwt_expires_in_secs: 86_400,
      dashboard_ttl_secs: 120,
      dashboard_refresh_secs: 300,
      seed_db: false,
      seed_admin_password: None,
      log_format: LogFormat::Text,
    }
  }
}
