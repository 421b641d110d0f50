mod ask;
mod health;
mod metrics;

pub use ask::ask_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
