//! Virtual Herbal Garden web site.
//!
//! This crate provides the site as a library, allowing it to be tested and
//! reused; `main.rs` only wires configuration, tracing and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::path::Path;

use axum::{Router, middleware::from_fn};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Static assets, relative to the crate root.
pub const STATIC_DIR: &str = "static";

/// Build the application router with its full middleware stack.
///
/// `static_root` is the directory holding the crate's `static/` folder.
pub fn build_router(state: AppState, static_root: &Path) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes::routes(max_upload_bytes))
        .nest_service("/static", ServeDir::new(static_root.join(STATIC_DIR)))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
