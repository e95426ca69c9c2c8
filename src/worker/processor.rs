/**
 * Worker Processing Loop
 *
 * One envelope at a time: decode, forward to the ingest socket
 * (best-effort), simulate bounded processing work, acknowledge. A
 * processing error negatively acknowledges with requeue, so the envelope
 * is retried - at-least-once semantics with possible duplicate downstream
 * delivery.
 */
use std::time::Duration;

use thiserror::Error;

use crate::relay::{Consumer, RelayEnvelope, RelayError};
use crate::shared::{Message, NotificationFrame};
use crate::worker::forwarder::NotifyForwarder;

/// Errors that fail the processing of one delivery
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The queued payload did not decode as a relay envelope
    #[error("Malformed relay payload: {0}")]
    MalformedPayload(#[from] RelayError),
}

/// Run the worker loop; never returns under normal operation
pub async fn run(mut consumer: Consumer, forwarder: NotifyForwarder, process_delay: Duration) {
    tracing::info!(
        "[Worker] Waiting for messages as consumer group '{}'",
        consumer.group()
    );
    loop {
        let delivery = consumer.next().await;
        if delivery.is_redelivery() {
            tracing::info!(
                "[Worker] Redelivery of message {} (attempt {})",
                delivery.message_id,
                delivery.attempt
            );
        }
        match process(&delivery.payload, &forwarder, process_delay).await {
            Ok(message) => {
                tracing::info!(
                    "[Worker] Finished processing message from {} in room {}: \"{}\"",
                    message.sender,
                    message.room,
                    message.content
                );
                delivery.ack().await;
            }
            Err(e) => {
                tracing::error!("[Worker] Error processing message from queue: {}", e);
                delivery.nack(true).await;
            }
        }
    }
}

/// Process one queued payload
///
/// An error here means the delivery will be negatively acknowledged and
/// redelivered later.
pub async fn process(
    payload: &str,
    forwarder: &NotifyForwarder,
    process_delay: Duration,
) -> Result<Message, ProcessingError> {
    let envelope = RelayEnvelope::from_payload(payload)?;
    tracing::info!("[Worker] Received message from queue: {}", payload);

    // best-effort forward; the acknowledgement path never blocks on it
    let frame = NotificationFrame::NewMessage(envelope.message().clone());
    match frame.to_frame() {
        Ok(text) => {
            if forwarder.forward(text) {
                tracing::info!("[Worker] Sent notification via WebSocket");
            }
        }
        Err(e) => tracing::error!("[Worker] Failed to encode notification frame: {}", e),
    }

    // simulate bounded processing work
    tokio::time::sleep(process_delay).await;

    Ok(envelope.into_message())
}
