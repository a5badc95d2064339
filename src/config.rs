//! Service configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SUBMIT_DELAY_MS: u64 = 1000;
/// Must stay above the 5 MiB image limit so oversized images reach
/// validation instead of being cut off by the body limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
pub const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),
    #[error("malformed operator entry {0:?}: expected user:sha256hex")]
    MalformedOperator(String),
}

/// One operator credential: a username and the hex sha256 of the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCredential {
    pub username: String,
    pub password_sha256: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Simulated latency of the backing-store write during submission.
    pub submit_delay: Duration,
    pub max_upload_bytes: usize,
    pub seed_notices: bool,
    pub cookie_secure: bool,
    /// Lifetime of an operator session and its cookie.
    pub session_ttl: Duration,
    /// How often expired sessions and their drafts are swept.
    pub session_sweep_interval: Duration,
    pub operators: Vec<OperatorCredential>,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SUBMIT_DELAY_MS`: default 1000
    /// - `MAX_UPLOAD_BYTES`: default 8 MiB
    /// - `SEED_NOTICES`: default true
    /// - `COOKIE_SECURE`: default false
    /// - `SESSION_TTL_SECS`: default 12 hours, at most one year
    /// - `SESSION_SWEEP_SECS`: default 60
    /// - `NOTICEBOARD_OPERATORS`: `user:sha256hex[,user:sha256hex]`, no
    ///   operators when unset
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` or `NOTICEBOARD_OPERATORS` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        let operators = match std::env::var("NOTICEBOARD_OPERATORS") {
            Ok(raw) => parse_operators(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            port,
            submit_delay: Duration::from_millis(env_parse("SUBMIT_DELAY_MS", DEFAULT_SUBMIT_DELAY_MS)),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            seed_notices: env_bool("SEED_NOTICES").unwrap_or(true),
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
            session_ttl: Duration::from_secs(
                env_parse("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS).min(MAX_SESSION_TTL_SECS),
            ),
            session_sweep_interval: Duration::from_secs(
                env_parse("SESSION_SWEEP_SECS", DEFAULT_SESSION_SWEEP_SECS).max(1),
            ),
            operators,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            submit_delay: Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            seed_notices: true,
            cookie_secure: false,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            session_sweep_interval: Duration::from_secs(DEFAULT_SESSION_SWEEP_SECS),
            operators: Vec::new(),
        }
    }
}

/// Parse `user:sha256hex` pairs separated by commas. Blank entries are skipped.
///
/// # Errors
///
/// Returns `MalformedOperator` for entries without a username or with a
/// digest that is not 64 hex characters.
pub fn parse_operators(raw: &str) -> Result<Vec<OperatorCredential>, ConfigError> {
    let mut out = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((username, digest)) = entry.split_once(':') else {
            return Err(ConfigError::MalformedOperator(entry.to_owned()));
        };
        let username = username.trim();
        let digest = digest.trim().to_ascii_lowercase();
        if username.is_empty() || digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::MalformedOperator(entry.to_owned()));
        }
        out.push(OperatorCredential { username: username.to_owned(), password_sha256: digest });
    }
    Ok(out)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|raw| parse_bool(&raw))
}

/// Lenient boolean flag: `1/true/yes/on` and `0/false/no/off`, any case.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
