use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::GatewayError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{AnswerResponse, AskParams, RequesterContext};
use crate::state::AppState;

// GET /workgpt?question=...&name=...&email=...
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<AskParams>,
) -> Result<Json<AnswerResponse>, GatewayError> {
    REQUEST_TOTAL.inc();
    let start = Instant::now();

    let result = state.resolver.resolve(&params.question).await;
    // observe before propagating so error responses land in the histogram too
    REQUEST_LATENCY.observe(start.elapsed().as_secs_f64());
    let resolution = result?;

    // Audit write is fire-and-forget - it must never delay or fail the response
    if let Some(logger) = &state.activity {
        let logger = Arc::clone(logger);
        let ctx = RequesterContext {
            name: params.name,
            email: params.email,
            ip: client_ip(&headers, peer),
        };
        let question = params.question;
        tokio::spawn(async move {
            logger.record(ctx, question).await;
        });
    }

    Ok(Json(AnswerResponse {
        answer: resolution.answer,
    }))
}

// First X-Forwarded-For hop, falling back to the socket peer
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
