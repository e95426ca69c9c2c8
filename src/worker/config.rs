/**
 * Worker Configuration
 */
use std::time::Duration;

/// Default simulated processing latency per envelope
pub const DEFAULT_PROCESS_DELAY_MS: u64 = 1000;

/// Runtime configuration for the message worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// SQLite URL of the relay queue store
    pub relay_url: String,
    /// WebSocket URL of the notification service's ingest endpoint
    pub notify_ws_url: String,
    /// Simulated processing latency per envelope
    pub process_delay: Duration,
}

impl WorkerConfig {
    /// Load configuration from the environment
    ///
    /// # Environment Variables
    ///
    /// - `RELAY_QUEUE_URL` - relay queue store (default `sqlite://relay.db?mode=rwc`)
    /// - `WS_NOTIFICATION_URL` - ingest endpoint (default `ws://localhost:4000/ingest`)
    /// - `WORKER_PROCESS_DELAY_MS` - simulated latency (default 1000)
    pub fn from_env() -> Self {
        let relay_url = std::env::var("RELAY_QUEUE_URL").unwrap_or_else(|_| {
            tracing::warn!("[Worker] RELAY_QUEUE_URL not set, using sqlite://relay.db");
            "sqlite://relay.db?mode=rwc".to_string()
        });

        let notify_ws_url = std::env::var("WS_NOTIFICATION_URL")
            .unwrap_or_else(|_| "ws://localhost:4000/ingest".to_string());

        let process_delay = std::env::var("WORKER_PROCESS_DELAY_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_PROCESS_DELAY_MS));

        Self {
            relay_url,
            notify_ws_url,
            process_delay,
        }
    }
}
