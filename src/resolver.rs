//! Cache-or-generate answer resolution.
//!
//! Hit: return the stored answer and bump the usage counter (advisory, not
//! atomic with the read). Miss: call the generation client once, persist the
//! pair, return the text. Downstream failures are absorbed into a canned
//! fallback answer unless the operator disables that policy.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::gemini::{GenerateError, GenerationClient};
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE, RESOLVE_FAILURES};
use crate::models::QuestionRecord;
use crate::store::{KeyPolicy, QuestionStore, StoreError};

pub const FALLBACK_ANSWER: &str = "Sorry, the assistant is taking a break! Try again later.";

pub fn answer_prompt(question: &str) -> String {
    format!(
        "Provide a professional answer. Keep the response short (1-5 sentences). Question: {question}"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Cache,
    Generated,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub answer: String,
    pub source: AnswerSource,
}

// Internal failure - both kinds get the same fallback treatment
#[derive(Debug, Error)]
enum ResolveFailure {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub case_sensitive: bool,
    /// When true (the default), store/generation failures become a 200 with
    /// the fallback answer instead of an error status.
    pub fallback_on_error: bool,
    pub fallback_answer: String,
    /// De-duplicate concurrent misses for the same question so the
    /// generation client is called once. Off by default: the original
    /// deployments accepted the duplicate-generation race.
    pub single_flight: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            fallback_on_error: true,
            fallback_answer: FALLBACK_ANSWER.to_string(),
            single_flight: false,
        }
    }
}

pub struct Resolver {
    store: Arc<dyn QuestionStore>,
    client: Arc<dyn GenerationClient>,
    policy: KeyPolicy,
    fallback_on_error: bool,
    fallback_answer: String,
    inflight: Option<DashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn QuestionStore>,
        client: Arc<dyn GenerationClient>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            client,
            policy: KeyPolicy::from_flag(config.case_sensitive),
            fallback_on_error: config.fallback_on_error,
            fallback_answer: config.fallback_answer,
            inflight: config.single_flight.then(DashMap::new),
        }
    }

    pub async fn resolve(&self, question: &str) -> Result<Resolution, GatewayError> {
        if question.is_empty() {
            return Err(GatewayError::BadRequest(
                "question must not be empty".to_string(),
            ));
        }

        match self.try_resolve(question).await {
            Ok(resolution) => Ok(resolution),
            Err(err) => {
                RESOLVE_FAILURES.inc();
                warn!("resolution failed: {err}");
                if self.fallback_on_error {
                    Ok(Resolution {
                        answer: self.fallback_answer.clone(),
                        source: AnswerSource::Fallback,
                    })
                } else {
                    Err(GatewayError::Downstream(err.to_string()))
                }
            }
        }
    }

    async fn try_resolve(&self, question: &str) -> Result<Resolution, ResolveFailure> {
        if let Some(hit) = self.lookup(question).await? {
            return Ok(hit);
        }

        let Some(inflight) = &self.inflight else {
            return self.generate_and_store(question).await;
        };

        // Single flight: serialize misses per normalized key and re-check the
        // store after the lock, so followers become hits.
        let key = self.policy.canonical(question);
        let gate = {
            let entry = inflight.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        let guard = gate.lock().await;
        let result = match self.lookup(question).await? {
            Some(hit) => Ok(hit),
            None => self.generate_and_store(question).await,
        };
        drop(guard);
        inflight.remove(&key);
        result
    }

    async fn lookup(&self, question: &str) -> Result<Option<Resolution>, ResolveFailure> {
        let Some(record) = self.store.find(question).await? else {
            return Ok(None);
        };
        CACHE_HITS.inc();
        debug!(question, "cache hit");
        // counter is advisory - a failed bump must not eat the answer
        if let Err(e) = self.store.increment_usage(question).await {
            warn!("usage counter update failed: {e}");
        }
        Ok(Some(Resolution {
            answer: record.answer,
            source: AnswerSource::Cache,
        }))
    }

    async fn generate_and_store(&self, question: &str) -> Result<Resolution, ResolveFailure> {
        CACHE_MISSES.inc();
        info!(question, "cache miss, generating answer");
        let answer = self.client.generate(&answer_prompt(question)).await?;
        self.store
            .upsert(QuestionRecord {
                question: question.to_string(),
                answer: answer.clone(),
                usage_count: 1,
            })
            .await?;
        if let Ok(len) = self.store.len().await {
            CACHE_SIZE.set(len as f64);
        }
        Ok(Resolution {
            answer,
            source: AnswerSource::Generated,
        })
    }
}
