//! SQLite persistence for thread transcripts
//!
//! Each message is one row; `sequence_id` is the message's position within
//! its thread and `payload` is the serialized [`Message`].

mod schema;

use schema::SCHEMA;

use crate::transcript::Message;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Corrupt message {sequence_id} in thread {thread_id}: {reason}")]
    Corrupt {
        thread_id: String,
        sequence_id: i64,
        reason: String,
    },
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Append messages to a thread inside one transaction
    pub fn append_messages(&self, thread_id: &str, messages: &[Message]) -> DbResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut sequence_id: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) FROM messages WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO messages (id, thread_id, sequence_id, role, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for message in messages {
                sequence_id += 1;
                let payload = serde_json::to_string(message)?;
                stmt.execute(params![
                    uuid::Uuid::new_v4().to_string(),
                    thread_id,
                    sequence_id,
                    message.role().as_str(),
                    payload,
                    message.timestamp().to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// All messages for a thread in conversational order
    pub fn get_messages(&self, thread_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sequence_id, payload FROM messages WHERE thread_id = ?1 ORDER BY sequence_id",
        )?;

        let rows = stmt
            .query_map(params![thread_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(sequence_id, payload)| {
                serde_json::from_str(&payload).map_err(|e| DbError::Corrupt {
                    thread_id: thread_id.to_string(),
                    sequence_id,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Whether a thread has any stored messages
    pub fn has_messages(&self, thread_id: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE thread_id = ?1)",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
