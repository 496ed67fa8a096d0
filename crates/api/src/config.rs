use std::str::FromStr;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Log output format, selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background tasks to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Load the demo assignments at startup (default: `false`).
    pub seed_demo_data: bool,
    /// Optional webhook receiving load completion notifications.
    pub notify_webhook_url: Option<String>,
    /// Log output format (default: pretty).
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:3000".into()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            seed_demo_data: false,
            notify_webhook_url: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `SEED_DEMO_DATA`        | `false`                 |
    /// | `NOTIFY_WEBHOOK_URL`    | unset                   |
    /// | `LOG_FORMAT`            | `pretty`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", &lookup, defaults.port)?;

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };
        for origin in &cors_origins {
            origin
                .parse::<axum::http::HeaderValue>()
                .map_err(|e| ConfigError {
                    var: "CORS_ORIGINS",
                    value: origin.clone(),
                    reason: e.to_string(),
                })?;
        }

        let request_timeout_secs =
            parse_or("REQUEST_TIMEOUT_SECS", &lookup, defaults.request_timeout_secs)?;
        let shutdown_timeout_secs =
            parse_or("SHUTDOWN_TIMEOUT_SECS", &lookup, defaults.shutdown_timeout_secs)?;
        let seed_demo_data = match lookup("SEED_DEMO_DATA") {
            Some(raw) => parse_flag("SEED_DEMO_DATA", &raw)?,
            None => defaults.seed_demo_data,
        };
        let notify_webhook_url = lookup("NOTIFY_WEBHOOK_URL").filter(|s| !s.trim().is_empty());
        let log_format = parse_or("LOG_FORMAT", &lookup, defaults.log_format)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            seed_demo_data,
            notify_webhook_url,
            log_format,
        })
    }
}

fn parse_or<T>(
    var: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError {
            var,
            value: raw.to_string(),
            reason: "expected a boolean flag".into(),
        }),
    }
}
