use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

// API Routes - REST API for the approval-gated query lifecycle
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // Schema context
            .route("/context/prepare", post(handlers::api::prepare_context))
            // Approval-gated query lifecycle
            .route("/nl-query", post(handlers::api::nl_query))
            .route("/nl-query/pending", get(handlers::api::list_pending))
            .route(
                "/nl-query/{query_id}/resolve",
                post(handlers::api::resolve_query),
            )
            // Embeddings
            .route("/embed", post(handlers::api::embed))
            // System status
            .route("/status", get(handlers::api::system_status)),
    )
}
