//! Persistent question/answer stores.
//!
//! Two interchangeable backends: a flat JSON file rewritten wholesale on every
//! write (the original deployment format) and a SQLite database that also
//! tracks per-question usage counts and requester activity.

mod file;
mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::QuestionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// How a question is matched against stored keys. The flat-file deployment
/// compared case-insensitively while the relational one compared exactly, so
/// this stays configurable instead of being unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    CaseInsensitive,
    CaseSensitive,
}

impl KeyPolicy {
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            Self::CaseSensitive
        } else {
            Self::CaseInsensitive
        }
    }

    /// Canonical form of a question for keying in-process maps.
    pub fn canonical(self, question: &str) -> String {
        match self {
            Self::CaseInsensitive => question.to_lowercase(),
            Self::CaseSensitive => question.to_string(),
        }
    }

    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
            Self::CaseSensitive => a == b,
        }
    }
}

/// The contract the resolver depends on. Stores must give read-your-writes
/// within the process; nothing stronger is assumed.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn find(&self, question: &str) -> Result<Option<QuestionRecord>, StoreError>;

    /// Insert or replace the record whose key matches `record.question`.
    async fn upsert(&self, record: QuestionRecord) -> Result<(), StoreError>;

    /// Bump the usage counter for a stored question. No-op for backends
    /// without counters.
    async fn increment_usage(&self, question: &str) -> Result<(), StoreError>;

    async fn len(&self) -> Result<usize, StoreError>;
}
