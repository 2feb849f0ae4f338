use std::time::Duration;

use folio_core::versioning::numbering::DEFAULT_WRITE_ATTEMPTS;
use folio_core::versioning::DEFAULT_KEEP_COUNT;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Revision write and retention settings.
    pub versioning: VersioningConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            versioning: VersioningConfig::from_env(),
        }
    }
}

/// Revision write and retention settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersioningConfig {
    /// Attempts for a revision write that keeps hitting number conflicts.
    pub write_attempts: u32,
    /// Revisions kept per document by the retention job and by default on
    /// the cleanup endpoint.
    pub keep_count: i64,
    /// Seconds between retention sweeps.
    pub retention_interval_secs: u64,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
            keep_count: DEFAULT_KEEP_COUNT,
            retention_interval_secs: 3600,
        }
    }
}

impl VersioningConfig {
    /// | Env Var                             | Default |
    /// |-------------------------------------|---------|
    /// | `REVISION_WRITE_ATTEMPTS`           | `3`     |
    /// | `REVISION_KEEP_COUNT`               | `50`    |
    /// | `REVISION_RETENTION_INTERVAL_SECS`  | `3600`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let write_attempts: u32 = std::env::var("REVISION_WRITE_ATTEMPTS")
            .map(|v| v.parse().expect("REVISION_WRITE_ATTEMPTS must be a valid u32"))
            .unwrap_or(defaults.write_attempts);

        let keep_count: i64 = std::env::var("REVISION_KEEP_COUNT")
            .map(|v| v.parse().expect("REVISION_KEEP_COUNT must be a valid i64"))
            .unwrap_or(defaults.keep_count);
        assert!(keep_count >= 1, "REVISION_KEEP_COUNT must be at least 1");

        let retention_interval_secs: u64 = std::env::var("REVISION_RETENTION_INTERVAL_SECS")
            .map(|v| {
                v.parse()
                    .expect("REVISION_RETENTION_INTERVAL_SECS must be a valid u64")
            })
            .unwrap_or(defaults.retention_interval_secs);

        Self {
            write_attempts,
            keep_count,
            retention_interval_secs,
        }
    }

    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioning_defaults() {
        let config = VersioningConfig::default();
        assert_eq!(config.write_attempts, 3);
        assert_eq!(config.keep_count, 50);
        assert_eq!(config.retention_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn retention_interval_is_never_zero() {
        let config = VersioningConfig {
            retention_interval_secs: 0,
            ..VersioningConfig::default()
        };
        assert_eq!(config.retention_interval(), Duration::from_secs(1));
    }
}
