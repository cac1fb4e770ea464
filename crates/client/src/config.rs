use std::time::Duration;

use imagejob_core::config::{parse_opt, parse_or, process_env, var_or, ConfigError};

use crate::poller::PollerConfig;
use crate::retry::RetryConfig;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Orchestrator base URL (default: `http://localhost:8000`).
    pub orchestrator_url: String,
    /// Fixed status poll interval (default: 3000 ms).
    pub poll_interval: Duration,
    /// Retries for a failed status request before the job is failed (default: `0`).
    pub poll_transport_retries: u32,
    /// Per-request timeout; `None` leaves it to the platform.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8000".into(),
            poll_interval: PollerConfig::DEFAULT_INTERVAL,
            poll_transport_retries: 0,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `ORCHESTRATOR_URL`       | `http://localhost:8000` |
    /// | `POLL_INTERVAL_MS`       | `3000`                  |
    /// | `POLL_TRANSPORT_RETRIES` | `0`                     |
    /// | `REQUEST_TIMEOUT_SECS`   | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let orchestrator_url = var_or(&lookup, "ORCHESTRATOR_URL", &defaults.orchestrator_url);

        let poll_interval_ms: u64 = parse_or(
            &lookup,
            "POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "POLL_INTERVAL_MS",
                value: "0".into(),
            });
        }

        let poll_transport_retries = parse_or(&lookup, "POLL_TRANSPORT_RETRIES", 0u32)?;
        let request_timeout =
            parse_opt::<u64>(&lookup, "REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            orchestrator_url,
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_transport_retries,
            request_timeout,
        })
    }

    /// Poller settings derived from this configuration.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            retry: RetryConfig {
                max_retries: self.poll_transport_retries,
                ..RetryConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.orchestrator_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(3000));
        assert_eq!(config.poll_transport_retries, 0);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = ClientConfig::from_lookup(|var| match var {
            "ORCHESTRATOR_URL" => Some("http://gpu:9000".into()),
            "POLL_INTERVAL_MS" => Some("500".into()),
            "POLL_TRANSPORT_RETRIES" => Some("2".into()),
            "REQUEST_TIMEOUT_SECS" => Some("20".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.orchestrator_url, "http://gpu:9000");
        let poller = config.poller_config();
        assert_eq!(poller.interval, Duration::from_millis(500));
        assert_eq!(poller.retry.max_retries, 2);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(20)));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ClientConfig::from_lookup(|var| {
            (var == "POLL_INTERVAL_MS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_MS"));
    }
}
