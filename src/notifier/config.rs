/**
 * Notification Service Configuration
 */

/// Default WebSocket/HTTP port
pub const DEFAULT_WS_PORT: u16 = 4000;

/// Runtime configuration for the notification service
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Port serving the health route and both WebSocket endpoints
    pub ws_port: u16,
    /// SQLite URL of the relay queue store
    pub relay_url: String,
}

impl NotifierConfig {
    /// Load configuration from the environment
    ///
    /// # Environment Variables
    ///
    /// - `WS_PORT` - listen port (default 4000)
    /// - `RELAY_QUEUE_URL` - relay queue store (default `sqlite://relay.db?mode=rwc`)
    pub fn from_env() -> Self {
        let ws_port = std::env::var("WS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_WS_PORT);

        let relay_url = std::env::var("RELAY_QUEUE_URL").unwrap_or_else(|_| {
            tracing::warn!("[Notify] RELAY_QUEUE_URL not set, using sqlite://relay.db");
            "sqlite://relay.db?mode=rwc".to_string()
        });

        Self { ws_port, relay_url }
    }
}
