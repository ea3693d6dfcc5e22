//! Environment file selection
//!
//! `APP_ENV=production` loads `.env.production`, anything else loads
//! `.env.development`. Variables already set in the process are kept.

use std::fmt;
use std::path::Path;
use tracing::debug;

pub const APP_ENV_VAR: &str = "APP_ENV";
pub const ENV_FILE_PROD: &str = ".env.production";
pub const ENV_FILE_DEV: &str = ".env.development";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Production,
    Development,
}

impl AppEnv {
    /// Only the exact value `production` selects production
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => AppEnv::Production,
            _ => AppEnv::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::from_value(std::env::var(APP_ENV_VAR).ok().as_deref())
    }

    pub fn env_file(&self) -> &'static str {
        match self {
            AppEnv::Production => ENV_FILE_PROD,
            AppEnv::Development => ENV_FILE_DEV,
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnv::Production => write!(f, "production"),
            AppEnv::Development => write!(f, "development"),
        }
    }
}

/// Load variables from `path`. Returns `Ok(false)` when the file does not
/// exist.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<bool, dotenvy::Error> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded env file");
            Ok(true)
        }
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "No env file");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Load the env file matching `APP_ENV`
pub fn load_app_env() -> Result<AppEnv, dotenvy::Error> {
    let env = AppEnv::from_env();
    load_env_file(env.env_file())?;
    Ok(env)
}
