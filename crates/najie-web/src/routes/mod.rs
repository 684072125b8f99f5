pub mod config;
pub mod files;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/config",
            get(config::get_config).post(config::save_config),
        )
        .route("/api/config/test", post(config::test_config))
        .route("/api/files", get(files::list_files))
        .route(
            "/api/files/url",
            get(files::signed_url).delete(files::delete_key_named_url),
        )
        .route("/api/files/{*key}", delete(files::delete_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
