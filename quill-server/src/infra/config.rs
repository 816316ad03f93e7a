use std::{env, time::Duration};

use quill_core::auth::{AuthSettings, PasswordParams, TokenError, parse_algorithm};
use thiserror::Error;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("SECRET_KEY must be set to a non-empty value")]
    MissingSecret,
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("invalid database URL: {source}")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("database username {username:?} cannot be encoded in a URL")]
    InvalidDatabaseUsername { username: String },
    #[error("database password cannot be encoded in a URL")]
    InvalidDatabasePassword,
    #[error(transparent)]
    Auth(#[from] TokenError),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Effective PostgreSQL URL, either given directly or composed from parts.
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Database settings alone, for commands that never touch auth.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        dotenvy::dotenv().ok();
        let get = |key: &str| env::var(key).ok().filter(|value| !value.trim().is_empty());
        Ok(Self {
            url: resolve_database_url(&get)?,
        })
    }
}

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load from process environment, after merging a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key/value source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server = ServerConfig {
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("SERVER_PORT", get("SERVER_PORT"), DEFAULT_PORT)?,
        };

        let database = DatabaseConfig {
            url: resolve_database_url(&get)?,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server,
            database,
            auth: load_auth_settings(&get)?,
            cors_allowed_origins,
        })
    }
}

fn load_auth_settings<G>(get: &G) -> Result<AuthSettings, ConfigLoadError>
where
    G: Fn(&str) -> Option<String>,
{
    let secret = get("SECRET_KEY").ok_or(ConfigLoadError::MissingSecret)?;
    let mut settings = AuthSettings::new(secret.as_bytes())?;

    if let Some(name) = get("ALGORITHM") {
        settings = settings.with_algorithm(parse_algorithm(&name)?)?;
    }

    if let Some(raw) = get("ACCESS_TOKEN_TTL") {
        let ttl = humantime::parse_duration(raw.trim()).map_err(|err| {
            ConfigLoadError::InvalidValue {
                key: "ACCESS_TOKEN_TTL",
                message: err.to_string(),
            }
        })?;
        settings = settings.with_access_token_ttl(ttl)?;
    } else if let Some(raw) = get("ACCESS_TOKEN_EXPIRE_MINUTES") {
        let minutes: u64 = parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", Some(raw), 15)?;
        let seconds = minutes
            .checked_mul(60)
            .ok_or(ConfigLoadError::InvalidValue {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                message: format!("{minutes} minutes is out of range"),
            })?;
        settings = settings.with_access_token_ttl(Duration::from_secs(seconds))?;
    }

    let defaults = PasswordParams::default();
    let params = PasswordParams {
        memory_kib: parse_or("ARGON2_MEMORY_KIB", get("ARGON2_MEMORY_KIB"), defaults.memory_kib)?,
        iterations: parse_or("ARGON2_ITERATIONS", get("ARGON2_ITERATIONS"), defaults.iterations)?,
        parallelism: parse_or(
            "ARGON2_PARALLELISM",
            get("ARGON2_PARALLELISM"),
            defaults.parallelism,
        )?,
    };

    Ok(settings.with_password_params(params))
}

fn resolve_database_url<G>(get: &G) -> Result<Option<String>, ConfigLoadError>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        Url::parse(url.trim()).map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
        return Ok(Some(url.trim().to_string()));
    }

    let (Some(host), Some(user), Some(name)) = (
        get("DATABASE_HOSTNAME"),
        get("DATABASE_USERNAME"),
        get("DATABASE_NAME"),
    ) else {
        return Ok(None);
    };
    let port = parse_or("DATABASE_PORT", get("DATABASE_PORT"), DEFAULT_DATABASE_PORT)?;

    let mut url = Url::parse(&format!("postgresql://{host}:{port}/{name}"))
        .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
    url.set_username(&user)
        .map_err(|_| ConfigLoadError::InvalidDatabaseUsername { username: user.clone() })?;
    if let Some(password) = get("DATABASE_PASSWORD") {
        url.set_password(Some(&password))
            .map_err(|_| ConfigLoadError::InvalidDatabasePassword)?;
    }

    Ok(Some(url.to_string()))
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigLoadError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| ConfigLoadError::InvalidValue {
            key,
            message: err.to_string(),
        }),
        None => Ok(default),
    }
}
