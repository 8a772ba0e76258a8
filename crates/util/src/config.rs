use std::{env, fmt, net::SocketAddr, path::PathBuf};

use super::{server_bind_address, DEFAULT_CITIES_PATH, DEFAULT_SSE_HEARTBEAT_SECS, DEFAULT_VENUES_PATH};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub venues_path: PathBuf,
    pub cities_path: PathBuf,
    /// Password gating the editing routes. `None` leaves them open.
    pub admin_password: Option<String>,
    pub sse_heartbeat_secs: u64,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        let venues_path = path_var("APP_VENUES_PATH", DEFAULT_VENUES_PATH);
        let cities_path = path_var("APP_CITIES_PATH", DEFAULT_CITIES_PATH);
        let admin_password = env::var("APP_ADMIN_PASSWORD")
            .ok()
            .filter(|value| !value.is_empty());
        let sse_heartbeat_secs = match env::var("APP_SSE_HEARTBEAT_SECS") {
            Ok(raw) => parse_heartbeat(&raw)?,
            Err(_) => DEFAULT_SSE_HEARTBEAT_SECS,
        };

        Ok(Self {
            bind_addr,
            environment,
            venues_path,
            cities_path,
            admin_password,
            sse_heartbeat_secs,
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("environment", &self.environment)
            .field("venues_path", &self.venues_path)
            .field("cities_path", &self.cities_path)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .field("sse_heartbeat_secs", &self.sse_heartbeat_secs)
            .finish()
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .into()
}

fn parse_heartbeat(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidHeartbeat(raw.to_string())),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    InvalidHeartbeat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::InvalidHeartbeat(value) => write!(
                f,
                "APP_SSE_HEARTBEAT_SECS must be a positive integer (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
