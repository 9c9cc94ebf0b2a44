use std::{env, fmt, net::SocketAddr};

use super::{database_url, server_bind_address, DEFAULT_CORS_ORIGIN};

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
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    /// Origin of the web client allowed through CORS.
    pub cors_origin: String,
    /// First account created on an empty database, if configured.
    pub bootstrap_user: Option<BootstrapUser>,
}

/// Credentials of the account seeded at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapUser {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for BootstrapUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapUser")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        let database_url = database_url();
        if database_url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }

        let cors_origin =
            env::var("APP_CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        let bootstrap_user = match (
            non_empty_var("APP_BOOTSTRAP_EMAIL"),
            non_empty_var("APP_BOOTSTRAP_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapUser { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteBootstrapUser),
        };

        Ok(Self {
            bind_addr,
            environment,
            database_url,
            cors_origin,
            bootstrap_user,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    EmptyDatabaseUrl,
    IncompleteBootstrapUser,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::EmptyDatabaseUrl => write!(f, "DATABASE_URL must not be empty"),
            Self::IncompleteBootstrapUser => write!(
                f,
                "APP_BOOTSTRAP_EMAIL and APP_BOOTSTRAP_PASSWORD must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
