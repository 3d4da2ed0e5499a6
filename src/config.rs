use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::info;

use crate::auth::{PasswordHasher, PasswordScheme, SessionKeys};

#[derive(Error, Debug)]
#[error("Invalid {key} value '{value}': {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
    pub min_password_len: usize,
    pub password_scheme: PasswordScheme,
    pub bcrypt_cost: u32,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
    /// Defaults applied during `load`, logged by `log_notices`.
    pub notices: Vec<String>,
}

impl Config {
    /// Read settings from the environment (and `.env` when present).
    ///
    /// Fallbacks to defaults are recorded in `notices` rather than logged
    /// here, since this runs before the subscriber exists. Call
    /// [`Config::log_notices`] once tracing is up.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut notices = Vec::new();

        let jwt_secret = env::var("FGC_JWT_SECRET").unwrap_or_else(|_| {
            notices.push("FGC_JWT_SECRET not set, sessions will not survive a restart".to_string());
            uuid::Uuid::new_v4().simple().to_string()
        });

        Ok(Self {
            data_dir: try_load("FGC_DATA_DIR", "fgc_data", &mut notices)?,
            bind_addr: try_load("FGC_BIND_ADDR", "0.0.0.0:11111", &mut notices)?,
            jwt_secret,
            session_ttl_secs: try_load("FGC_SESSION_TTL_SECS", "3600", &mut notices)?,
            min_password_len: try_load("FGC_MIN_PASSWORD_LEN", "6", &mut notices)?,
            password_scheme: try_load("FGC_PASSWORD_SCHEME", "bcrypt", &mut notices)?,
            bcrypt_cost: check_bcrypt_cost(try_load(
                "FGC_BCRYPT_COST",
                &bcrypt::DEFAULT_COST.to_string(),
                &mut notices,
            )?)?,
            log_format: try_load("FGC_LOG_FORMAT", "pretty", &mut notices)?,
            log_dir: env::var("FGC_LOG_DIR").ok().map(PathBuf::from),
            notices,
        })
    }

    pub fn log_notices(&self) {
        for notice in &self.notices {
            info!("{notice}");
        }
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.password_scheme, self.bcrypt_cost)
    }

    pub fn session_keys(&self) -> SessionKeys {
        SessionKeys::new(self.jwt_secret.as_bytes(), self.session_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("fgc_data"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 11111)),
            jwt_secret: uuid::Uuid::new_v4().simple().to_string(),
            session_ttl_secs: 3600,
            min_password_len: 6,
            password_scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            log_format: LogFormat::Pretty,
            log_dir: None,
            notices: Vec::new(),
        }
    }
}

fn try_load<T: FromStr>(
    key: &'static str,
    default: &str,
    notices: &mut Vec<String>,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        notices.push(format!("{key} not set, using default: {default}"));
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError {
        key,
        reason: e.to_string(),
        value,
    })
}

/// bcrypt only accepts costs in 4..=31.
fn check_bcrypt_cost(cost: u32) -> Result<u32, ConfigError> {
    if (4..=31).contains(&cost) {
        Ok(cost)
    } else {
        Err(ConfigError {
            key: "FGC_BCRYPT_COST",
            value: cost.to_string(),
            reason: "must be between 4 and 31".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_default_and_invalid() {
        let mut notices = Vec::new();
        let ttl: u64 = try_load("FGC_TEST_UNSET_TTL", "42", &mut notices).unwrap();
        assert_eq!(ttl, 42);
        assert_eq!(notices, vec!["FGC_TEST_UNSET_TTL not set, using default: 42".to_string()]);

        let err = try_load::<u64>("FGC_TEST_UNSET_BAD", "soon", &mut notices).unwrap_err();
        assert!(err.to_string().contains("FGC_TEST_UNSET_BAD"));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());

        let scheme: PasswordScheme = try_load("FGC_TEST_UNSET_SCHEME", "sha512", &mut Vec::new()).unwrap();
        assert_eq!(scheme, PasswordScheme::Sha512);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.min_password_len, 6);
        assert_eq!(config.password_hasher().scheme(), PasswordScheme::Bcrypt);
        assert_eq!(config.session_keys().ttl_secs(), 3600);
    }

    #[test]
    fn test_bcrypt_cost_range() {
        assert_eq!(check_bcrypt_cost(4).unwrap(), 4);
        assert_eq!(check_bcrypt_cost(31).unwrap(), 31);
        for bad in [0, 3, 32, 100] {
            let err = check_bcrypt_cost(bad).unwrap_err();
            assert!(err.to_string().contains("FGC_BCRYPT_COST"));
        }
    }

    #[test]
    fn test_load_records_notices_instead_of_logging() {
        let config = Config::load().expect("config loads");
        if env::var("FGC_JWT_SECRET").is_err() {
            assert!(config
                .notices
                .iter()
                .any(|n| n.contains("FGC_JWT_SECRET not set")));
        }
        if env::var("FGC_DATA_DIR").is_err() {
            assert!(config
                .notices
                .iter()
                .any(|n| n == "FGC_DATA_DIR not set, using default: fgc_data"));
        }
    }
}
