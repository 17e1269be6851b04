//! Route table for the voice registry API.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

/// Build the full router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::synthesize))
        .route("/voices", get(handlers::list_voices))
        .route("/voices/download", post(handlers::download_voice))
        .route("/voices/:model", delete(handlers::delete_voice))
        .route(
            "/aliases",
            get(handlers::list_aliases).post(handlers::create_alias),
        )
        .route("/aliases/reload", post(handlers::reload_aliases))
        .route("/aliases/:alias", delete(handlers::delete_alias))
        .route("/health", get(handlers::health))
        .with_state(state)
}
