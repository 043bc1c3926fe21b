//! Server configuration read from the environment.

use std::time::Duration;

use branchtale_generation::application::schedule::PollConfig;
use branchtale_http::DEFAULT_BASE_URL;

use crate::background::session_sweeper::DEFAULT_SWEEP_INTERVAL;
use crate::error::AppError;
use crate::state::DEFAULT_SESSION_IDLE_TTL;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Base URL of the story generation service.
    pub story_service_url: String,
    /// Poll schedule tunables applied to every session.
    pub poll: PollConfig,
    /// Idle time after which a session is evicted.
    pub session_idle_ttl: Duration,
    /// Delay between two sweeps for idle sessions.
    pub session_sweep_interval: Duration,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse(&lookup, "PORT")?.unwrap_or(3000);
        let story_service_url =
            lookup("STORY_SERVICE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        let mut poll = PollConfig::default();
        if let Some(interval) = parse_secs(&lookup, "POLL_INTERVAL_SECS")? {
            poll = poll.with_interval(interval);
        }
        if let Some(max) = parse(&lookup, "POLL_MAX_ATTEMPTS")? {
            poll = poll.with_max_attempts(max);
        }
        if let Some(retries) = parse(&lookup, "POLL_TRANSPORT_RETRIES")? {
            poll = poll.with_transport_retries(retries);
        }

        let session_idle_ttl =
            parse_secs(&lookup, "SESSION_IDLE_TTL_SECS")?.unwrap_or(DEFAULT_SESSION_IDLE_TTL);
        let session_sweep_interval = parse_secs(&lookup, "SESSION_SWEEP_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);

        Ok(Self {
            host,
            port,
            story_service_url,
            poll,
            session_idle_ttl,
            session_sweep_interval,
        })
    }
}

/// Reads a whole number of seconds that must be at least one.
fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, AppError> {
    match parse::<u64>(lookup, key)? {
        Some(0) => Err(AppError::Config(format!("{key} must be at least 1"))),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{key} is invalid ({raw}): {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.story_service_url, "http://localhost:8000/api");
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.session_idle_ttl, Duration::from_secs(1800));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_session_settings_are_read() {
        let config = config_from(&[
            ("SESSION_IDLE_TTL_SECS", "600"),
            ("SESSION_SWEEP_INTERVAL_SECS", "15"),
        ])
        .unwrap();

        assert_eq!(config.session_idle_ttl, Duration::from_secs(600));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_zero_idle_ttl_is_rejected() {
        let err = config_from(&[("SESSION_IDLE_TTL_SECS", "0")]).unwrap_err();

        assert!(
            matches!(err, AppError::Config(message) if message == "SESSION_IDLE_TTL_SECS must be at least 1")
        );
    }

    #[test]
    fn test_poll_settings_are_read() {
        // Act
        let config = config_from(&[
            ("POLL_INTERVAL_SECS", "2"),
            ("POLL_MAX_ATTEMPTS", "60"),
            ("POLL_TRANSPORT_RETRIES", "3"),
        ])
        .unwrap();

        // Assert
        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.poll.max_attempts, Some(60));
        assert_eq!(config.poll.transport_retries, 3);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();

        assert!(matches!(err, AppError::Config(message) if message.starts_with("PORT is invalid")));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = config_from(&[("POLL_INTERVAL_SECS", "0")]).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }
}
