//! HTTP server setup and routing
//!
//! Sets up the Axum HTTP server with routes for the rating editor read models,
//! edit/selection/bulk operations and the SSE event stream.

use crate::editor::RatingEditor;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub editor: RatingEditor,
}

/// Build the router with all routes attached to `ctx`
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))

        // Read models
        .route("/members", get(super::handlers::list_members))
        .route("/members/:member_id", get(super::handlers::get_member))
        .route("/members/:member_id/history", get(super::handlers::get_history))
        .route("/summary", get(super::handlers::get_summary))

        // Editing
        .route("/members/:member_id/rating", put(super::handlers::set_rating))
        .route("/members/:member_id/retry", post(super::handlers::retry))
        .route("/members/:member_id/discard", post(super::handlers::discard))
        .route("/refresh", post(super::handlers::refresh))

        // Selection and bulk apply
        .route("/selection", get(super::handlers::get_selection))
        .route("/selection/toggle", post(super::handlers::toggle_selection))
        .route("/selection/select_all", post(super::handlers::select_all))
        .route("/selection/clear", post(super::handlers::clear_selection))
        .route("/bulk", post(super::handlers::bulk_apply))

        // SSE event stream
        .route("/events", get(super::sse::event_stream))

        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for the dashboard front-end
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run<F>(ctx: AppContext, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
