//! HTTP connection pool settings and request accounting for the Prefect API

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub max_idle_connections: usize,
    pub idle_timeout: Duration,
    pub connection_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 10,
            idle_timeout: Duration::from_secs(90),
            connection_timeout: Duration::from_secs(10),
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// Outcome counts for every request sent through one client
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestStats {
    pub succeeded: u64,
    pub failed: u64,
    pub last_status: Option<u16>,
    pub last_request: Option<Instant>,
}

impl RequestStats {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

pub struct ConnectionPool {
    config: ConnectionPoolConfig,
    stats: RwLock<RequestStats>,
}

impl ConnectionPool {
    pub fn new(config: ConnectionPoolConfig) -> Self {
        Self {
            config,
            stats: RwLock::new(RequestStats::default()),
        }
    }

    /// Count one finished request; `status` is None when no response arrived
    pub async fn record(&self, status: Option<u16>) -> RequestStats {
        let mut stats = self.stats.write().await;
        match status {
            Some(code) if (200..300).contains(&code) => stats.succeeded += 1,
            _ => stats.failed += 1,
        }
        stats.last_status = status;
        stats.last_request = Some(Instant::now());
        stats.clone()
    }

    pub async fn stats(&self) -> RequestStats {
        self.stats.read().await.clone()
    }

    /// Requests carry no overall timeout; cancellation comes from the caller's Context
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.config.connection_timeout)
            .pool_idle_timeout(self.config.idle_timeout)
            .pool_max_idle_per_host(self.config.max_idle_connections);

        if let Some(keepalive) = self.config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_failures_and_error_statuses_both_count_as_failed() {
        let pool = ConnectionPool::new(ConnectionPoolConfig::default());

        pool.record(Some(200)).await;
        pool.record(Some(404)).await;
        let latest = pool.record(None).await;

        assert_eq!(latest.succeeded, 1);
        assert_eq!(latest.failed, 2);
        assert_eq!(latest.last_status, None);
        assert_eq!(pool.stats().await.total(), 3);
    }

    #[test]
    fn builds_client_with_defaults() {
        let pool = ConnectionPool::new(ConnectionPoolConfig::default());
        assert!(pool.build_client().is_ok());
    }
}
