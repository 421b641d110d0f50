mod activity;
mod config;
mod error;
mod gemini;
mod handlers;
mod metrics;
mod models;
mod resolver;
mod state;
mod store;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::activity::{ActivityLogger, GeoClient};
use crate::config::{Args, StoreBackend};
use crate::gemini::{GeminiClient, GenerationClient};
use crate::resolver::{Resolver, ResolverConfig};
use crate::state::AppState;
use crate::store::{FileStore, KeyPolicy, QuestionStore, SqliteStore};

// this is main async function with tokio
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();
    let policy = KeyPolicy::from_flag(args.case_sensitive);

    // pick the store backend; the activity log only exists for sqlite
    let mut activity = None;
    let store: Arc<dyn QuestionStore> = match args.store {
        StoreBackend::File => {
            info!("using file store at {}", args.questions_file.display());
            Arc::new(FileStore::new(&args.questions_file, policy))
        }
        StoreBackend::Sqlite => {
            info!("using sqlite store at {}", args.db_path.display());
            let sqlite = Arc::new(
                SqliteStore::new(&args.db_path, policy).expect("failed to open sqlite store"),
            );
            activity = Some(Arc::new(ActivityLogger::new(
                Arc::clone(&sqlite),
                GeoClient::new(args.geo_url.clone()),
            )));
            sqlite
        }
    };

    // without a key the gateway still serves cached answers; every miss
    // degrades to the fallback answer
    let api_key = std::env::var("GEMINI_API_KEY")
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .unwrap_or_default();
    if api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set - generation calls will fail");
    }
    let client: Arc<dyn GenerationClient> = Arc::new(GeminiClient::new(
        args.gemini_url.clone(),
        args.model.clone(),
        api_key,
    ));

    let resolver = Resolver::new(
        store,
        client,
        ResolverConfig {
            case_sensitive: args.case_sensitive,
            fallback_on_error: !args.no_fallback,
            fallback_answer: args.fallback_answer.clone(),
            single_flight: args.single_flight,
        },
    );

    let state = Arc::new(AppState { resolver, activity });

    // creating the router with routes
    let app = Router::new()
        .route("/workgpt", get(handlers::ask_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!("Gateway running on http://localhost:{}", args.port);
    info!("Generation model: {} at {}", args.model, args.gemini_url);
    info!(
        "Lookup policy: {}",
        if args.case_sensitive { "case-sensitive" } else { "case-insensitive" }
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
