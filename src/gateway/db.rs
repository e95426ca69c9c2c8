/**
 * Message Persistence
 *
 * Database operations for the gateway's message store. A message is
 * written exactly once per accepted send; ordering within a room is the
 * insertion order, exposed to late joiners oldest-first and capped at the
 * most recent entries.
 */
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::shared::Message;

/// Maximum number of messages returned by a history fetch
pub const HISTORY_LIMIT: i64 = 100;

/// Open the message store and assert its schema
///
/// # Arguments
/// * `database_url` - SQLite connection URL
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // SQLite serializes writers anyway; one connection also keeps
    // in-memory databases coherent under test.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender TEXT NOT NULL,
            content TEXT NOT NULL,
            room TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_room ON messages (room, timestamp)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Persist a message
///
/// # Returns
/// The store-assigned row id
pub async fn insert_message(pool: &SqlitePool, message: &Message) -> Result<i64, sqlx::Error> {
    let result =
        sqlx::query("INSERT INTO messages (sender, content, room, timestamp) VALUES (?, ?, ?, ?)")
            .bind(&message.sender)
            .bind(&message.content)
            .bind(&message.room)
            .bind(message.timestamp)
            .execute(pool)
            .await?;
    Ok(result.last_insert_rowid())
}

/// Fetch the most recent messages in a room, oldest first
///
/// # Arguments
/// * `room` - The room to fetch history for
/// * `limit` - Cap on the number of returned messages
pub async fn recent_messages(
    pool: &SqlitePool,
    room: &str,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct MessageRow {
        sender: String,
        content: String,
        room: String,
        timestamp: DateTime<Utc>,
    }

    // take the newest `limit` rows, then flip them oldest-first
    let rows = sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT sender, content, room, timestamp FROM (
            SELECT id, sender, content, room, timestamp
            FROM messages
            WHERE room = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
        )
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(room)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Message {
            sender: row.sender,
            content: row.content,
            room: row.room,
            timestamp: row.timestamp,
        })
        .collect())
}
