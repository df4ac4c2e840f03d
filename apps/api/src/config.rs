use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; a present but unparsable value is an error.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Compiler executable, looked up on `PATH` unless absolute.
    pub tectonic_bin: PathBuf,
    pub render_timeout: Duration,
    /// Parent of the per-request working directories.
    pub work_dir: PathBuf,
    /// Extra `*.tex` templates; files override built-ins with the same id.
    pub template_dir: Option<PathBuf>,
    pub warm_up: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            host: env_or("HOST", "127.0.0.1".to_string())?,
            port: env_or("PORT", 3001)?,
            rust_log: env_or("RUST_LOG", "info".to_string())?,
            tectonic_bin: env_or("TECTONIC_BIN", PathBuf::from("tectonic"))?,
            render_timeout: Duration::from_secs(env_or("RENDER_TIMEOUT_SECS", 90)?),
            work_dir: env_or("RENDER_WORK_DIR", std::env::temp_dir())?,
            template_dir: optional_env("TEMPLATE_DIR").map(PathBuf::from),
            warm_up: env_or("WARM_UP", true)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keys are unique per test; the process environment is shared across threads.

    #[test]
    fn test_env_or_default_when_unset() {
        assert_eq!(env_or("RESUME_RENDER_TEST_UNSET", 42u16).unwrap(), 42);
    }

    #[test]
    fn test_env_or_parses_value() {
        std::env::set_var("RESUME_RENDER_TEST_PORT", " 8088 ");
        assert_eq!(env_or("RESUME_RENDER_TEST_PORT", 1u16).unwrap(), 8088);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        std::env::set_var("RESUME_RENDER_TEST_BOOL", "sometimes");
        let err = env_or("RESUME_RENDER_TEST_BOOL", true).unwrap_err();
        assert!(err.to_string().contains("RESUME_RENDER_TEST_BOOL"));
    }

    #[test]
    fn test_blank_value_counts_as_unset() {
        std::env::set_var("RESUME_RENDER_TEST_BLANK", "   ");
        assert_eq!(optional_env("RESUME_RENDER_TEST_BLANK"), None);
    }
}
