use std::time::Duration;

use imagejob_core::config::{parse_or, process_env, var_or, ConfigError};

/// Relay configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3100`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Upstream calls get
    /// [`RelayConfig::upstream_timeout`].
    pub request_timeout_secs: u64,
    /// Upstream orchestrator base URL (default: `http://localhost:8000`).
    pub orchestrator_url: String,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3100`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `ORCHESTRATOR_URL`     | `http://localhost:8000`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = var_or(&lookup, "HOST", "0.0.0.0");
        let port = parse_or(&lookup, "PORT", 3100u16)?;

        let cors_origins: Vec<String> = var_or(&lookup, "CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let orchestrator_url = var_or(&lookup, "ORCHESTRATOR_URL", "http://localhost:8000");

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            orchestrator_url,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Budget for one upstream call: three quarters of the request timeout,
    /// so a slow orchestrator is answered before the timeout layer fires.
    pub fn upstream_timeout(&self) -> Duration {
        self.request_timeout() * 3 / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RelayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3100);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn upstream_budget_is_shorter_than_request_timeout() {
        let config =
            RelayConfig::from_lookup(|var| (var == "REQUEST_TIMEOUT_SECS").then(|| "1".to_string()))
                .unwrap();
        assert_eq!(config.upstream_timeout(), Duration::from_millis(750));
        assert!(config.upstream_timeout() < config.request_timeout());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = RelayConfig::from_lookup(|var| {
            (var == "CORS_ORIGINS").then(|| "https://a.example, ,https://b.example ".to_string())
        })
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = RelayConfig::from_lookup(|var| (var == "PORT").then(|| "99999".to_string()));
        assert!(result.is_err());
    }
}
