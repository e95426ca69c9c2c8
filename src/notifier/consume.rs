/**
 * Notification Queue Consumer
 *
 * The notification service's own consumer group on the relay queue. Per
 * delivery: acknowledge, then broadcast the payload to every open
 * notification connection. The broadcast is fire-and-forget fan-out; a
 * malformed payload is logged and dropped (acknowledged already, so it is
 * not redelivered to this group).
 */
use crate::notifier::fanout::NotificationFanout;
use crate::relay::{Consumer, RelayEnvelope};
use crate::shared::NotificationFrame;

/// Run the consume/broadcast loop; never returns under normal operation
pub async fn run(mut consumer: Consumer, fanout: NotificationFanout) {
    tracing::info!(
        "[Notify] Waiting for messages as consumer group '{}'",
        consumer.group()
    );
    loop {
        let delivery = consumer.next().await;
        let payload = delivery.payload.clone();
        delivery.ack().await;
        tracing::info!("[Notify] Received message: \"{}\"", payload);

        let envelope = match RelayEnvelope::from_payload(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("[Notify] Discarding malformed payload: {}", e);
                continue;
            }
        };

        let frame = NotificationFrame::NewMessage(envelope.into_message());
        match frame.to_frame() {
            Ok(text) => {
                let delivered = fanout.broadcast(&text);
                tracing::info!(
                    "[Notify] Broadcast NEW_MESSAGE to {} connections",
                    delivered
                );
            }
            Err(e) => tracing::error!("[Notify] Failed to encode notification frame: {}", e),
        }
    }
}
