/**
 * Durable Queue Storage
 *
 * This module implements the relay queue's durable storage: an ordered
 * payload log plus per-consumer-group delivery state, both in an SQLite
 * database so queued payloads survive a broker restart.
 *
 * # Delivery Model
 *
 * Consumer groups bind independently to a queue name and each group
 * receives every payload, in publish order. Per group, a payload is in one
 * of four states:
 *
 * - no delivery row yet, or `ready` - eligible for delivery
 * - `unacked` - delivered, awaiting acknowledgement; while one of these
 *   exists the group is offered nothing else (prefetch = 1)
 * - `acked` - acknowledged, removed from the group's view
 * - `discarded` - negatively acknowledged without requeue
 *
 * A payload is never removed from a group's view without an explicit
 * acknowledgement: negative acknowledgement with requeue returns it to
 * `ready`, and `bind` recovers `unacked` rows left behind by a consumer
 * that died mid-processing.
 */
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::relay::error::RelayError;

/// One payload handed to a consumer group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDelivery {
    /// Queue-assigned message id (publish order)
    pub message_id: i64,
    /// The JSON payload as published
    pub payload: String,
    /// How many times this payload has been delivered to the group
    pub attempt: i64,
}

/// SQLite-backed durable named queue
#[derive(Debug, Clone)]
pub struct QueueStore {
    pool: SqlitePool,
    queue: String,
}

impl QueueStore {
    /// Open the queue database and assert the queue schema
    ///
    /// # Arguments
    /// * `url` - SQLite connection URL (e.g. `sqlite://relay.db?mode=rwc`)
    /// * `queue` - The queue name to publish to and consume from
    pub async fn open(url: &str, queue: &str) -> Result<Self, RelayError> {
        // A single connection serializes all queue operations issued
        // through this handle, and is required for in-memory databases.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;
        let store = Self {
            pool,
            queue: queue.to_string(),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// The queue this store is bound to
    pub fn queue(&self) -> &str {
        &self.queue
    }

    async fn ensure_schema(&self) -> Result<(), RelayError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relay_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue TEXT NOT NULL,
                payload TEXT NOT NULL,
                published_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relay_deliveries (
                message_id INTEGER NOT NULL REFERENCES relay_messages(id),
                consumer_group TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'ready',
                attempts INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (message_id, consumer_group)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_relay_messages_queue ON relay_messages (queue, id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a payload to the queue
    ///
    /// # Returns
    /// The queue-assigned message id
    pub async fn publish(&self, payload: &str) -> Result<i64, RelayError> {
        let result =
            sqlx::query("INSERT INTO relay_messages (queue, payload, published_at) VALUES (?, ?, ?)")
                .bind(&self.queue)
                .bind(payload)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Bind a consumer group, recovering deliveries left unacknowledged by
    /// a previous consumer of the same group
    ///
    /// # Returns
    /// The number of deliveries returned to the ready state
    pub async fn bind(&self, group: &str) -> Result<u64, RelayError> {
        let result = sqlx::query(
            r#"
            UPDATE relay_deliveries SET state = 'ready'
            WHERE consumer_group = ?1 AND state = 'unacked'
              AND message_id IN (SELECT id FROM relay_messages WHERE queue = ?2)
            "#,
        )
        .bind(group)
        .bind(&self.queue)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Deliver the next eligible payload to a consumer group
    ///
    /// Returns `None` when the queue holds nothing eligible, or while the
    /// group already has an unacknowledged delivery in flight (prefetch
    /// is 1: one delivery at a time per consumer group).
    pub async fn next(&self, group: &str) -> Result<Option<StoredDelivery>, RelayError> {
        let in_flight: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) FROM relay_deliveries d
            JOIN relay_messages m ON m.id = d.message_id
            WHERE d.consumer_group = ?1 AND d.state = 'unacked' AND m.queue = ?2
            "#,
        )
        .bind(group)
        .bind(&self.queue)
        .fetch_one(&self.pool)
        .await?
        .get(0);
        if in_flight > 0 {
            return Ok(None);
        }

        let candidate = sqlx::query(
            r#"
            SELECT m.id, m.payload, COALESCE(d.attempts, 0)
            FROM relay_messages m
            LEFT JOIN relay_deliveries d
              ON d.message_id = m.id AND d.consumer_group = ?1
            WHERE m.queue = ?2 AND (d.state IS NULL OR d.state = 'ready')
            ORDER BY m.id ASC
            LIMIT 1
            "#,
        )
        .bind(group)
        .bind(&self.queue)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = candidate else {
            return Ok(None);
        };
        let message_id: i64 = row.get(0);
        let payload: String = row.get(1);
        let previous_attempts: i64 = row.get(2);

        sqlx::query(
            r#"
            INSERT INTO relay_deliveries (message_id, consumer_group, state, attempts)
            VALUES (?1, ?2, 'unacked', 1)
            ON CONFLICT (message_id, consumer_group)
            DO UPDATE SET state = 'unacked', attempts = attempts + 1
            "#,
        )
        .bind(message_id)
        .bind(group)
        .execute(&self.pool)
        .await?;

        Ok(Some(StoredDelivery {
            message_id,
            payload,
            attempt: previous_attempts + 1,
        }))
    }

    /// Acknowledge a delivery, removing it from the group's view
    pub async fn ack(&self, group: &str, message_id: i64) -> Result<(), RelayError> {
        let result = sqlx::query(
            r#"
            UPDATE relay_deliveries SET state = 'acked'
            WHERE message_id = ?1 AND consumer_group = ?2 AND state = 'unacked'
            "#,
        )
        .bind(message_id)
        .bind(group)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            tracing::debug!(
                "[Relay] Acknowledgement for message {} in group {} matched no in-flight delivery",
                message_id,
                group
            );
        }
        Ok(())
    }

    /// Negatively acknowledge a delivery
    ///
    /// With `requeue` the payload becomes eligible for redelivery to the
    /// group; without it the payload is discarded from the group's view.
    pub async fn nack(&self, group: &str, message_id: i64, requeue: bool) -> Result<(), RelayError> {
        let state = if requeue { "ready" } else { "discarded" };
        sqlx::query(
            r#"
            UPDATE relay_deliveries SET state = ?1
            WHERE message_id = ?2 AND consumer_group = ?3 AND state = 'unacked'
            "#,
        )
        .bind(state)
        .bind(message_id)
        .bind(group)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Number of payloads a group has not yet resolved (neither acked nor
    /// discarded)
    pub async fn depth(&self, group: &str) -> Result<i64, RelayError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*)
            FROM relay_messages m
            LEFT JOIN relay_deliveries d
              ON d.message_id = m.id AND d.consumer_group = ?1
            WHERE m.queue = ?2
              AND (d.state IS NULL OR d.state IN ('ready', 'unacked'))
            "#,
        )
        .bind(group)
        .bind(&self.queue)
        .fetch_one(&self.pool)
        .await?
        .get(0);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn memory_store() -> QueueStore {
        QueueStore::open("sqlite::memory:", "chat_messages")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_and_consume_in_order() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();
        store.publish("two").await.unwrap();

        let first = store.next("worker").await.unwrap().unwrap();
        assert_eq!(first.payload, "one");
        assert_eq!(first.attempt, 1);
        store.ack("worker", first.message_id).await.unwrap();

        let second = store.next("worker").await.unwrap().unwrap();
        assert_eq!(second.payload, "two");
    }

    #[tokio::test]
    async fn test_one_in_flight_per_group() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();
        store.publish("two").await.unwrap();

        let first = store.next("worker").await.unwrap().unwrap();
        // second delivery refused until the first resolves
        assert!(store.next("worker").await.unwrap().is_none());

        store.ack("worker", first.message_id).await.unwrap();
        assert!(store.next("worker").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_each_group_sees_every_payload() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();

        let to_worker = store.next("worker").await.unwrap().unwrap();
        let to_notify = store.next("notify").await.unwrap().unwrap();
        assert_eq!(to_worker.payload, "one");
        assert_eq!(to_notify.payload, "one");

        // acking in one group does not consume it for the other
        store.ack("worker", to_worker.message_id).await.unwrap();
        assert_eq!(store.depth("worker").await.unwrap(), 0);
        assert_eq!(store.depth("notify").await.unwrap(), 1);
        store.ack("notify", to_notify.message_id).await.unwrap();
        assert_eq!(store.depth("notify").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_nack_requeue_redelivers() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();

        let first = store.next("worker").await.unwrap().unwrap();
        store.nack("worker", first.message_id, true).await.unwrap();

        let again = store.next("worker").await.unwrap().unwrap();
        assert_eq!(again.message_id, first.message_id);
        assert_eq!(again.attempt, 2);
    }

    #[tokio::test]
    async fn test_nack_without_requeue_discards() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();

        let first = store.next("worker").await.unwrap().unwrap();
        store.nack("worker", first.message_id, false).await.unwrap();

        assert!(store.next("worker").await.unwrap().is_none());
        assert_eq!(store.depth("worker").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bind_recovers_unacked() {
        let store = memory_store().await;
        store.publish("one").await.unwrap();

        // consumer takes a delivery and dies without resolving it
        let lost = store.next("worker").await.unwrap().unwrap();
        assert!(store.next("worker").await.unwrap().is_none());

        let recovered = store.bind("worker").await.unwrap();
        assert_eq!(recovered, 1);

        let again = store.next("worker").await.unwrap().unwrap();
        assert_eq!(again.message_id, lost.message_id);
        assert_eq!(again.attempt, 2);
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let store = QueueStore::open("sqlite::memory:", "chat_messages")
            .await
            .unwrap();
        store.publish("one").await.unwrap();

        // a store bound to a different queue name over the same database
        // must not see the payload; simulate by changing the queue field
        let other = QueueStore {
            pool: store.pool.clone(),
            queue: "other_queue".to_string(),
        };
        assert!(other.next("worker").await.unwrap().is_none());
        assert!(store.next("worker").await.unwrap().is_some());
    }
}
