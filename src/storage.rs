use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::models::ConversationRecord;

/// SQLite-backed store with the two ingestion tables.
///
/// The pool is capped at one connection; the whole run is sequential and a
/// single handle keeps `sqlite::memory:` databases coherent in tests.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .with_context(|| format!("Failed to open database at {url}"))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER UNIQUE,
                location TEXT,
                size TEXT,
                type TEXT,
                lat TEXT,
                lon TEXT,
                distance_from_campus REAL,
                price INTEGER,
                unread BOOLEAN,
                last_message_time TEXT,
                last_visited TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create chat table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT,
                chat_id INTEGER REFERENCES chat(id),
                message_number INTEGER,
                UNIQUE(chat_id, message_number)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create messages table")?;

        Ok(())
    }

    /// Insert a conversation row and return its rowid for message inserts.
    /// A second run over the same conversation id fails here; rows are
    /// never updated.
    pub async fn insert_conversation(&self, record: &ConversationRecord) -> Result<i64> {
        debug!("Adding chat: {}", record.conversation_id);

        let result = sqlx::query(
            r#"
            INSERT INTO chat (
                conversation_id, location, size, type, lat, lon,
                distance_from_campus, price, unread, last_message_time, last_visited
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(record.conversation_id)
        .bind(&record.location)
        .bind(&record.size)
        .bind(&record.rental_type)
        .bind(&record.lat)
        .bind(&record.lon)
        .bind(record.commute_minutes)
        .bind(record.price)
        .bind(record.unread)
        .bind(record.last_message_time)
        .bind(record.last_visited)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert conversation {}", record.conversation_id))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_message(&self, chat_id: i64, message_number: i64, text: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO messages (text, chat_id, message_number) VALUES (?1, ?2, ?3)",
        )
        .bind(text)
        .bind(chat_id)
        .bind(message_number)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert message {message_number} of chat {chat_id}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sqlx::Row;

    fn record(conversation_id: i64) -> ConversationRecord {
        let timestamp =
            NaiveDateTime::parse_from_str("2024-03-02 18:45:10", "%Y-%m-%d %H:%M:%S").unwrap();

        ConversationRecord {
            conversation_id,
            location: Some("Schwabing, Hohenzollernstraße 11".to_string()),
            size: Some("19".to_string()),
            rental_type: Some("WG-Zimmer".to_string()),
            lat: Some("48.1549958".to_string()),
            lon: Some("11.5418357".to_string()),
            commute_minutes: Some(43.0),
            price: Some(450),
            unread: true,
            last_message_time: timestamp,
            last_visited: timestamp,
        }
    }

    async fn database() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn inserts_conversation_and_messages() {
        let db = database().await;

        let chat_id = db.insert_conversation(&record(81234567)).await.unwrap();
        db.insert_message(chat_id, 0, "Hallo, ist das Zimmer noch frei?")
            .await
            .unwrap();
        db.insert_message(chat_id, 1, "Ja, komm gerne morgen vorbei.")
            .await
            .unwrap();

        let row = sqlx::query("SELECT location, price, unread FROM chat WHERE conversation_id = ?1")
            .bind(81234567i64)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(
            row.get::<String, _>("location"),
            "Schwabing, Hohenzollernstraße 11"
        );
        assert_eq!(row.get::<i64, _>("price"), 450);
        assert!(row.get::<bool, _>("unread"));

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE chat_id = ?1")
            .bind(chat_id)
            .fetch_one(&db.pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn removed_ad_leaves_listing_fields_null() {
        let db = database().await;

        let mut bare = record(81234568);
        bare.location = None;
        bare.size = None;
        bare.rental_type = None;
        bare.lat = None;
        bare.lon = None;
        bare.commute_minutes = None;
        bare.price = None;

        let chat_id = db.insert_conversation(&bare).await.unwrap();

        let row = sqlx::query("SELECT location, price FROM chat WHERE id = ?1")
            .bind(chat_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert!(row.get::<Option<String>, _>("location").is_none());
        assert!(row.get::<Option<i64>, _>("price").is_none());
    }

    #[tokio::test]
    async fn duplicate_conversation_id_is_rejected() {
        let db = database().await;

        db.insert_conversation(&record(81234567)).await.unwrap();
        assert!(db.insert_conversation(&record(81234567)).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_message_number_is_rejected() {
        let db = database().await;

        let chat_id = db.insert_conversation(&record(81234567)).await.unwrap();
        db.insert_message(chat_id, 0, "first").await.unwrap();
        assert!(db.insert_message(chat_id, 0, "again").await.is_err());
    }
}
