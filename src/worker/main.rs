/**
 * Message Worker Entry Point
 *
 * Consumes the relay queue and forwards each message to the notification
 * service's ingest socket.
 */

use relaychat::relay::{RelayConnection, CHAT_QUEUE};
use relaychat::worker::config::WorkerConfig;
use relaychat::worker::{processor, NotifyForwarder, CONSUMER_GROUP};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = WorkerConfig::from_env();

    let forwarder = NotifyForwarder::connect(config.notify_ws_url.clone());
    let relay = RelayConnection::connect(config.relay_url.clone(), CHAT_QUEUE).await;
    let consumer = relay.consumer(CONSUMER_GROUP);

    processor::run(consumer, forwarder, config.process_delay).await
}
