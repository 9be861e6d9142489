//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use docqa_core::config::ServerConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// Build the application router. `/upload` is only mounted when uploads are enabled.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig, upload_enabled: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(api::health))
        .route("/rag", post(api::rag));

    if upload_enabled {
        app = app.route("/upload", post(api::upload));
    }

    app.layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let Some(origins) = server.cors_origins() else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
