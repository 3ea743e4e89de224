use std::env;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means records live in process memory only.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    pub stats_lookback_months: u32,
    pub calendar_lookback_months: u32,
    pub history_limit: i64,
    pub trend_window_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_access_ttl_secs: parse_var("JWT_ACCESS_TTL_SECS", 900)?,
            jwt_refresh_ttl_secs: parse_var("JWT_REFRESH_TTL_SECS", 604800)?,

            stats_lookback_months: parse_var("STATS_LOOKBACK_MONTHS", 6)?,
            calendar_lookback_months: parse_var("CALENDAR_LOOKBACK_MONTHS", 3)?,
            history_limit: parse_var("HISTORY_LIMIT", 30)?,
            trend_window_days: parse_var("TREND_WINDOW_DAYS", 30)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for tests and local runs without an environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:8081".into(),
            cors_extra_origins: Vec::new(),
            jwt_secret: jwt_secret.into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604800,
            stats_lookback_months: 6,
            calendar_lookback_months: 3,
            history_limit: 30,
            trend_window_days: 30,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number", name)),
        _ => Ok(default),
    }
}
