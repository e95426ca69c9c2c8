/**
 * Relay Connection Handle
 *
 * The swappable broker handle shared by every relay client in the system
 * (gateway publisher, worker consumer, notification consumer). The handle
 * owns an `Option<QueueStore>`:
 *
 * - while connected, publish and consume operate on the live store;
 * - on any storage error the store is dropped and a full reconnect is
 *   scheduled after a fixed delay, repeating indefinitely;
 * - publish calls issued while disconnected fail soft: a warning is
 *   logged and the payload is dropped rather than raised to the caller.
 *
 * A dropped publish only loses the fan-out notification; the room members
 * still receive the message via the gateway's direct broadcast path.
 */
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::relay::consumer::Consumer;
use crate::relay::envelope::RelayEnvelope;
use crate::relay::error::RelayError;
use crate::relay::store::QueueStore;

/// Fixed delay between reconnect attempts
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Cloneable handle to the relay queue
///
/// Cheap to clone; all clones share the same underlying store slot, so a
/// reconnect performed by any task is visible to every holder.
#[derive(Clone)]
pub struct RelayConnection {
    url: Arc<String>,
    queue: Arc<String>,
    store: Arc<RwLock<Option<QueueStore>>>,
    /// Bumped on every successful (re)connect; consumers use this to know
    /// when to re-bind their group.
    generation: Arc<AtomicU64>,
    reconnecting: Arc<AtomicBool>,
}

impl RelayConnection {
    /// Connect to the queue store
    ///
    /// The first attempt happens inline; on failure the handle starts in
    /// the disconnected state and keeps retrying in the background every
    /// [`RECONNECT_DELAY`]. The call itself never fails.
    pub async fn connect(url: impl Into<String>, queue: impl Into<String>) -> Self {
        let connection = Self {
            url: Arc::new(url.into()),
            queue: Arc::new(queue.into()),
            store: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            reconnecting: Arc::new(AtomicBool::new(false)),
        };
        if !connection.try_open().await {
            connection.schedule_reconnect();
        }
        connection
    }

    /// The queue this handle publishes to and consumes from
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Whether the handle currently holds a live store
    pub async fn is_connected(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// Publish an envelope, fire-and-forget
    ///
    /// Failures are logged and swallowed: a broker outage must not fail
    /// the caller's send path.
    pub async fn publish(&self, envelope: &RelayEnvelope) {
        let payload = match envelope.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("[Relay] Failed to serialize envelope: {}", e);
                return;
            }
        };

        let store = self.store.read().await.clone();
        let Some(store) = store else {
            tracing::warn!("[Relay] Channel not available. Message not published to queue.");
            return;
        };

        match store.publish(&payload).await {
            Ok(id) => {
                tracing::debug!("[Relay] Published message {} to queue '{}'", id, self.queue());
            }
            Err(e) => self.fault(&e).await,
        }
    }

    /// Create a pull consumer for a consumer group
    ///
    /// Both fan-out roles bind to the same queue name under different
    /// group names, so each receives every published payload.
    pub fn consumer(&self, group: impl Into<String>) -> Consumer {
        Consumer::new(self.clone(), group.into())
    }

    /// Drop the live store and schedule a reconnect
    pub(crate) async fn fault(&self, error: &RelayError) {
        tracing::warn!("[Relay] Channel error, scheduling reconnect: {}", error);
        *self.store.write().await = None;
        self.schedule_reconnect();
    }

    /// Snapshot of the live store, if any
    pub(crate) async fn store_snapshot(&self) -> Option<QueueStore> {
        self.store.read().await.clone()
    }

    /// Current connect generation (0 while never connected)
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn try_open(&self) -> bool {
        match QueueStore::open(&self.url, &self.queue).await {
            Ok(store) => {
                *self.store.write().await = Some(store);
                self.generation.fetch_add(1, Ordering::SeqCst);
                tracing::info!(
                    "[Relay] Connected to queue store and asserted queue: {}",
                    self.queue()
                );
                true
            }
            Err(e) => {
                tracing::error!("[Relay] Failed to connect to queue store: {}", e);
                false
            }
        }
    }

    fn schedule_reconnect(&self) {
        // one reconnect loop at a time
        if self.reconnecting.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!(
            "[Relay] Connection closed. Reconnecting in {:?}...",
            RECONNECT_DELAY
        );
        let connection = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(RECONNECT_DELAY).await;
                if connection.try_open().await {
                    break;
                }
            }
            connection.reconnecting.store(false, Ordering::SeqCst);
        });
    }
}
