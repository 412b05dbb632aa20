use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::web::sessions::DEFAULT_MAX_SESSIONS;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5050";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub static_dir: PathBuf,
    pub session_idle: Duration,
    pub max_sessions: usize,
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var(&get, "PORT", 3000)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid address {}:{}", host, port)))?;

        let api_base_url = get("TTS_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "TTS_API_BASE_URL must be an http(s) URL, got '{}'",
                api_base_url
            )));
        }

        let api_key = get("API_KEY").filter(|key| !key.trim().is_empty());
        let static_dir = get("STATIC_DIR").unwrap_or_else(|| "static".to_string());
        let session_idle = Duration::from_secs(parse_var(&get, "SESSION_IDLE_SECS", 1800)?);
        let max_sessions: usize = parse_var(&get, "MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?;
        if max_sessions == 0 {
            return Err(AppError::Config("MAX_SESSIONS must be at least 1".to_string()));
        }
        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.parse().map_err(|_| {
                AppError::Config(format!("UPSTREAM_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?)),
            None => None,
        };

        Ok(Self {
            addr,
            api_base_url,
            api_key,
            static_dir: static_dir.into(),
            session_idle,
            max_sessions,
            upstream_timeout,
        })
    }
}

fn parse_var<F, T>(get: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.session_idle, Duration::from_secs(1800));
        assert_eq!(config.max_sessions, 1000);
        assert!(config.upstream_timeout.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("TTS_API_BASE_URL", "https://tts.example.com/"),
            ("API_KEY", "secret"),
            ("UPSTREAM_TIMEOUT_SECS", "30"),
            ("MAX_SESSIONS", "50"),
        ]))
        .unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.api_base_url, "https://tts.example.com");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.upstream_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_sessions, 50);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("PORT", "http")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("TTS_API_BASE_URL", "ftp://host")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("SESSION_IDLE_SECS", "-1")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("MAX_SESSIONS", "0")])),
            Err(AppError::Config(_))
        ));
    }
}
