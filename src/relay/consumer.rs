/**
 * Relay Consumer
 *
 * Pull consumer over the relay connection handle. `next()` yields exactly
 * one unresolved delivery at a time: the store refuses to hand a group a
 * second payload while one is unacknowledged, and the consumer itself only
 * asks again after the caller resolves the previous delivery.
 *
 * While the broker handle is disconnected, `next()` simply keeps waiting;
 * the reconnect loop owned by the connection brings the store back. After
 * every (re)connect the consumer re-binds its group, which returns
 * deliveries left unacknowledged by a dead consumer to the queue.
 */
use std::time::Duration;

use crate::relay::connection::RelayConnection;

/// Interval between polls of the queue store while idle
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pull consumer for one consumer group
pub struct Consumer {
    connection: RelayConnection,
    group: String,
    bound_generation: u64,
}

impl Consumer {
    pub(crate) fn new(connection: RelayConnection, group: String) -> Self {
        Self {
            connection,
            group,
            bound_generation: 0,
        }
    }

    /// The consumer group this consumer delivers for
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Wait for the next delivery
    ///
    /// Never fails: storage errors fault the shared handle (triggering its
    /// reconnect loop) and the consumer keeps waiting.
    pub async fn next(&mut self) -> Delivery {
        loop {
            let Some(store) = self.connection.store_snapshot().await else {
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            };

            let generation = self.connection.generation();
            if generation != self.bound_generation {
                match store.bind(&self.group).await {
                    Ok(recovered) => {
                        if recovered > 0 {
                            tracing::info!(
                                "[Relay] Recovered {} unacknowledged deliveries for group '{}'",
                                recovered,
                                self.group
                            );
                        }
                        self.bound_generation = generation;
                    }
                    Err(e) => {
                        self.connection.fault(&e).await;
                        continue;
                    }
                }
            }

            match store.next(&self.group).await {
                Ok(Some(stored)) => {
                    return Delivery {
                        connection: self.connection.clone(),
                        group: self.group.clone(),
                        message_id: stored.message_id,
                        payload: stored.payload,
                        attempt: stored.attempt,
                    };
                }
                Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(e) => self.connection.fault(&e).await,
            }
        }
    }
}

/// One payload delivered to a consumer group
///
/// Must be resolved with [`Delivery::ack`] or [`Delivery::nack`]. A
/// delivery dropped without resolution stays unacknowledged and is
/// redelivered when the group re-binds.
pub struct Delivery {
    connection: RelayConnection,
    group: String,
    /// Queue-assigned message id
    pub message_id: i64,
    /// The payload as published
    pub payload: String,
    /// Delivery attempt number, starting at 1
    pub attempt: i64,
}

impl Delivery {
    /// Whether this payload was delivered to the group before
    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }

    /// Acknowledge: the payload is done for this group
    ///
    /// Failures are logged and swallowed; an unacknowledged delivery is
    /// recovered on the next bind, yielding a duplicate rather than a
    /// loss.
    pub async fn ack(self) {
        let Some(store) = self.connection.store_snapshot().await else {
            tracing::warn!(
                "[Relay] Channel not available, acknowledgement for message {} dropped",
                self.message_id
            );
            return;
        };
        if let Err(e) = store.ack(&self.group, self.message_id).await {
            self.connection.fault(&e).await;
        }
    }

    /// Negatively acknowledge
    ///
    /// With `requeue` the payload is redelivered to this group later;
    /// without it the payload is discarded from the group's view.
    pub async fn nack(self, requeue: bool) {
        let Some(store) = self.connection.store_snapshot().await else {
            tracing::warn!(
                "[Relay] Channel not available, negative acknowledgement for message {} dropped",
                self.message_id
            );
            return;
        };
        if let Err(e) = store.nack(&self.group, self.message_id, requeue).await {
            self.connection.fault(&e).await;
        }
    }
}
