/**
 * Gateway Configuration
 *
 * This module loads the gateway's configuration from environment
 * variables, with local-development defaults where a value is safe to
 * default and a logged warning where it is not.
 */

/// Default HTTP/WebSocket port
pub const DEFAULT_PORT: u16 = 3003;

/// Runtime configuration for the chat gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port the gateway listens on
    pub port: u16,
    /// SQLite URL of the message store
    pub database_url: String,
    /// SQLite URL of the relay queue store
    pub relay_url: String,
    /// Shared secret credentials are verified against
    pub jwt_secret: String,
}

impl GatewayConfig {
    /// Load configuration from the environment
    ///
    /// # Environment Variables
    ///
    /// - `PORT` - listen port (default 3003)
    /// - `DATABASE_URL` - message store (default `sqlite://chat.db?mode=rwc`)
    /// - `RELAY_QUEUE_URL` - relay queue store (default `sqlite://relay.db?mode=rwc`)
    /// - `JWT_SECRET` - credential signing secret; a development fallback
    ///   is used with a warning when unset
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            tracing::warn!("[Chat Gateway] DATABASE_URL not set, using sqlite://chat.db");
            "sqlite://chat.db?mode=rwc".to_string()
        });

        let relay_url = std::env::var("RELAY_QUEUE_URL").unwrap_or_else(|_| {
            tracing::warn!("[Chat Gateway] RELAY_QUEUE_URL not set, using sqlite://relay.db");
            "sqlite://relay.db?mode=rwc".to_string()
        });

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("[Chat Gateway] Missing JWT_SECRET, using development fallback");
            "your-secret-key-change-in-production".to_string()
        });

        Self {
            port,
            database_url,
            relay_url,
            jwt_secret,
        }
    }
}
