/**
 * Notification Service Entry Point
 *
 * Serves the notification WebSocket endpoints and consumes the relay
 * queue, broadcasting every message to all open connections.
 */

use relaychat::notifier::config::NotifierConfig;
use relaychat::notifier::{consume, routes, NotificationFanout, CONSUMER_GROUP};
use relaychat::relay::{RelayConnection, CHAT_QUEUE};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = NotifierConfig::from_env();
    let fanout = NotificationFanout::new();

    let relay = RelayConnection::connect(config.relay_url.clone(), CHAT_QUEUE).await;
    let consumer = relay.consumer(CONSUMER_GROUP);
    tokio::spawn(consume::run(consumer, fanout.clone()));

    let app = routes::create_router(fanout);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.ws_port));
    tracing::info!("Notification Service listening on port {}", config.ws_port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
