use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("workgpt_requests_total", "Total number of requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("workgpt_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("workgpt_cache_misses_total", "Total cache misses").unwrap();
    pub static ref RESOLVE_FAILURES: Counter = register_counter!(
        "workgpt_resolve_failures_total",
        "Total generation or store failures absorbed by the resolver"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "workgpt_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("workgpt_cache_size", "Current number of cached answers").unwrap();
}
