//! Router configuration.

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{query, summary, targets};
use crate::state::AppState;

/// Build the application router over shared state.
pub fn router(state: AppState) -> Router {
    let body_limit = RequestBodyLimitLayer::new(state.config().body_limit_bytes());

    Router::new()
        .route(
            "/targets",
            post(targets::add_target).get(targets::list_targets),
        )
        .route(
            "/targets/{target_id}",
            get(targets::get_target)
                .put(targets::update_target)
                .delete(targets::delete_target),
        )
        .route("/summary", get(summary::database_summary))
        .route("/summary/{target_id}", get(summary::target_summary))
        .route("/duplicates/{target_id}", get(targets::duplicates))
        .route("/v1/query", post(query::query))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
