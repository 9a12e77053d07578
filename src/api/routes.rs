use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Catalog
        .route(
            "/entries",
            get(handlers::list_entries)
                .post(handlers::create_entry)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/entries/typed", get(handlers::list_typed_entries))
        .route("/keywords", get(handlers::list_keywords))
        // Internal
        .route("/_internal/catalog", get(handlers::catalog_status))
        .route("/_internal/health", get(handlers::health));

    // Locally stored assets are served by this process
    if state.local_assets.is_some() {
        router = router.route("/assets/*key", get(handlers::serve_asset));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
