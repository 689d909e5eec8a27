//! Server configuration, loaded from environment variables with defaults.

use std::net::{Ipv4Addr, SocketAddr};

use chrono::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Request body limit in MB (default: 8; base64-encoded images exceed
    /// the decoded-size threshold well before this)
    pub body_limit_mb: usize,
    /// How long targets stay in the processing state, in milliseconds
    /// (default: 500)
    pub processing_delay_ms: u64,
    /// Allowed clock skew for Target API requests, in seconds (default:
    /// 300)
    pub target_skew_tolerance_secs: i64,
    /// Allowed clock skew for Query API requests, in seconds (default:
    /// 3900 - the query service tolerates far more drift)
    pub query_skew_tolerance_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            body_limit_mb: 8,
            processing_delay_ms: 500,
            target_skew_tolerance_secs: 300,
            query_skew_tolerance_secs: 3900,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = match std::env::var("MIRAGE_HOST") {
            Ok(value) => match value.parse::<Ipv4Addr>() {
                Ok(addr) => addr.octets(),
                Err(_) => {
                    tracing::warn!(host = %value, "MIRAGE_HOST is not an IPv4 address, using default");
                    defaults.host
                }
            },
            Err(_) => defaults.host,
        };

        Self {
            port: env_parsed("MIRAGE_PORT", defaults.port),
            host,
            body_limit_mb: env_parsed("MIRAGE_BODY_LIMIT_MB", defaults.body_limit_mb),
            processing_delay_ms: env_parsed(
                "MIRAGE_PROCESSING_DELAY_MS",
                defaults.processing_delay_ms,
            ),
            target_skew_tolerance_secs: env_parsed(
                "MIRAGE_TARGET_SKEW_TOLERANCE_SECS",
                defaults.target_skew_tolerance_secs,
            ),
            query_skew_tolerance_secs: env_parsed(
                "MIRAGE_QUERY_SKEW_TOLERANCE_SECS",
                defaults.query_skew_tolerance_secs,
            ),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::milliseconds(self.processing_delay_ms as i64)
    }

    pub fn target_skew_tolerance(&self) -> Duration {
        Duration::seconds(self.target_skew_tolerance_secs)
    }

    pub fn query_skew_tolerance(&self) -> Duration {
        Duration::seconds(self.query_skew_tolerance_secs)
    }
}
