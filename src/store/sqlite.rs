//! SQLite store: point queries against a `questions` table with a usage
//! counter, plus the append-only `user_activity` audit table.
//!
//! Each operation opens a connection on a blocking thread. Fine for this
//! gateway's request rates; pooling stays outside the store.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use super::{KeyPolicy, QuestionStore, StoreError};
use crate::models::{ActivityRecord, QuestionRecord};

pub struct SqliteStore {
    db_path: PathBuf,
    policy: KeyPolicy,
}

impl SqliteStore {
    /// Open (or create) the database and ensure both tables exist.
    pub fn new(path: impl AsRef<Path>, policy: KeyPolicy) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                usage_count INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS user_activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT NOT NULL DEFAULT 'Guest',
                email TEXT,
                ip_address TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT 'Unknown',
                question TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { db_path, policy })
    }

    // NOCASE collation is how the case policy reaches SQL. Note it only
    // folds ASCII, unlike the file store's to_lowercase().
    fn where_clause(policy: KeyPolicy) -> &'static str {
        match policy {
            KeyPolicy::CaseInsensitive => "question = ?1 COLLATE NOCASE",
            KeyPolicy::CaseSensitive => "question = ?1",
        }
    }

    /// Append one audit row. Used by the activity logger, never by the
    /// resolver.
    pub async fn log_activity(&self, record: ActivityRecord) -> Result<(), StoreError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = Connection::open(&db_path)?;
            conn.execute(
                "INSERT INTO user_activity (user_name, email, ip_address, location, question, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.user_name,
                    record.email,
                    record.ip_address,
                    record.location,
                    record.question,
                    record.timestamp
                ],
            )?;
            Ok(())
        })
        .await?
    }

    #[cfg(test)]
    async fn activity_count(&self) -> Result<usize, StoreError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            let conn = Connection::open(&db_path)?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM user_activity", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await?
    }
}

#[async_trait]
impl QuestionStore for SqliteStore {
    async fn find(&self, question: &str) -> Result<Option<QuestionRecord>, StoreError> {
        let db_path = self.db_path.clone();
        let question = question.to_string();
        let sql = format!(
            "SELECT question, answer, usage_count FROM questions WHERE {}",
            Self::where_clause(self.policy)
        );
        tokio::task::spawn_blocking(move || -> Result<Option<QuestionRecord>, StoreError> {
            let conn = Connection::open(&db_path)?;
            let record = conn
                .query_row(&sql, params![question], |row| {
                    Ok(QuestionRecord {
                        question: row.get(0)?,
                        answer: row.get(1)?,
                        usage_count: row.get::<_, i64>(2)? as u64,
                    })
                })
                .optional()?;
            Ok(record)
        })
        .await?
    }

    async fn upsert(&self, record: QuestionRecord) -> Result<(), StoreError> {
        let db_path = self.db_path.clone();
        let update_sql = format!(
            "UPDATE questions SET answer = ?2, usage_count = ?3 WHERE {}",
            Self::where_clause(self.policy)
        );
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = Connection::open(&db_path)?;
            let changed = conn.execute(
                &update_sql,
                params![record.question, record.answer, record.usage_count as i64],
            )?;
            if changed == 0 {
                conn.execute(
                    "INSERT INTO questions (question, answer, usage_count) VALUES (?1, ?2, ?3)",
                    params![record.question, record.answer, record.usage_count as i64],
                )?;
            }
            Ok(())
        })
        .await?
    }

    async fn increment_usage(&self, question: &str) -> Result<(), StoreError> {
        let db_path = self.db_path.clone();
        let question = question.to_string();
        let sql = format!(
            "UPDATE questions SET usage_count = usage_count + 1 WHERE {}",
            Self::where_clause(self.policy)
        );
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = Connection::open(&db_path)?;
            conn.execute(&sql, params![question])?;
            Ok(())
        })
        .await?
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            let conn = Connection::open(&db_path)?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await?
    }
}
