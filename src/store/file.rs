//! Flat-file store: a pretty-printed JSON array of `{question, answer}`
//! pairs, the same format the original `questions.json` used.
//!
//! The whole table lives in memory behind the store instance - loaded once at
//! construction, rewritten to disk in full on every upsert. No usage counter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::warn;

use super::{KeyPolicy, QuestionStore, StoreError};
use crate::models::QuestionRecord;

// On-disk entry - deliberately has no counter field so existing
// questions.json files load unchanged
#[derive(Serialize, Deserialize, Debug, Clone)]
struct StoredPair {
    question: String,
    answer: String,
}

pub struct FileStore {
    path: PathBuf,
    policy: KeyPolicy,
    pairs: Mutex<Vec<StoredPair>>,
}

impl FileStore {
    /// Load the table from `path`. A missing or corrupt file starts empty
    /// rather than failing startup.
    pub fn new(path: impl Into<PathBuf>, policy: KeyPolicy) -> Self {
        let path = path.into();
        let pairs = Self::load(&path);
        Self {
            path,
            policy,
            pairs: Mutex::new(pairs),
        }
    }

    fn load(path: &Path) -> Vec<StoredPair> {
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(pairs) => pairs,
                Err(e) => {
                    warn!("questions file is corrupt, starting empty: {e}");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("failed to read questions file, starting empty: {e}");
                Vec::new()
            }
        }
    }

    // Whole-file rewrite, synchronous relative to the calling request
    fn flush(&self, pairs: &[StoredPair]) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(pairs)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for FileStore {
    async fn find(&self, question: &str) -> Result<Option<QuestionRecord>, StoreError> {
        let pairs = self.pairs.lock().await;
        Ok(pairs
            .iter()
            .find(|p| self.policy.matches(&p.question, question))
            .map(|p| QuestionRecord {
                question: p.question.clone(),
                answer: p.answer.clone(),
                usage_count: 1,
            }))
    }

    async fn upsert(&self, record: QuestionRecord) -> Result<(), StoreError> {
        let mut pairs = self.pairs.lock().await;
        match pairs
            .iter_mut()
            .find(|p| self.policy.matches(&p.question, &record.question))
        {
            Some(existing) => existing.answer = record.answer,
            None => pairs.push(StoredPair {
                question: record.question,
                answer: record.answer,
            }),
        }
        self.flush(&pairs)
    }

    async fn increment_usage(&self, _question: &str) -> Result<(), StoreError> {
        // the file format carries no counter
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.pairs.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.to_string(),
            answer: answer.to_string(),
            usage_count: 1,
        }
    }

    #[tokio::test]
    async fn test_find_miss_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseInsensitive);
        assert!(store.find("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_find() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseInsensitive);
        store.upsert(record("What is PTO?", "Paid time off.")).await.unwrap();
        let found = store.find("What is PTO?").await.unwrap().unwrap();
        assert_eq!(found.answer, "Paid time off.");
        assert_eq!(found.usage_count, 1);
    }

    #[tokio::test]
    async fn test_case_insensitive_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseInsensitive);
        store.upsert(record("What is PTO policy?", "ans")).await.unwrap();
        assert!(store.find("what is pto policy?").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_case_sensitive_lookup_misses_on_different_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseSensitive);
        store.upsert(record("What is PTO policy?", "ans")).await.unwrap();
        assert!(store.find("what is pto policy?").await.unwrap().is_none());
        assert!(store.find("What is PTO policy?").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_answer() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseInsensitive);
        store.upsert(record("q", "old")).await.unwrap();
        store.upsert(record("Q", "new")).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(store.find("q").await.unwrap().unwrap().answer, "new");
    }

    #[tokio::test]
    async fn test_survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        {
            let store = FileStore::new(&path, KeyPolicy::CaseInsensitive);
            store.upsert(record("q1", "a1")).await.unwrap();
            store.upsert(record("q2", "a2")).await.unwrap();
        }
        let reloaded = FileStore::new(&path, KeyPolicy::CaseInsensitive);
        assert_eq!(reloaded.len().await.unwrap(), 2);
        assert_eq!(reloaded.find("q2").await.unwrap().unwrap().answer, "a2");
    }

    #[tokio::test]
    async fn test_disk_format_is_question_answer_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let store = FileStore::new(&path, KeyPolicy::CaseInsensitive);
        store.upsert(record("q", "a")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed[0]["question"], "q");
        assert_eq!(parsed[0]["answer"], "a");
        // no counter leaks into the file format
        assert!(parsed[0].get("usage_count").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(&path, "not json at all{{{").unwrap();
        let store = FileStore::new(&path, KeyPolicy::CaseInsensitive);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_usage_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("questions.json"), KeyPolicy::CaseInsensitive);
        store.upsert(record("q", "a")).await.unwrap();
        store.increment_usage("q").await.unwrap();
        assert_eq!(store.find("q").await.unwrap().unwrap().usage_count, 1);
    }
}
