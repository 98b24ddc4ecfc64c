//! HTTP route handlers for the garden site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//!
//! # Plants
//! GET  /plants                 - List/search (q, bookmarks, cleared)
//! GET  /plants/{id}            - Plant detail
//! POST /plants/{id}/bookmark   - Toggle bookmark (form return_to)
//! POST /plants/{id}/ask        - Canned AI question (form question)
//!
//! # AI assistant
//! GET  /ai-assistant           - Transcript
//! POST /ai-assistant           - Send message
//!
//! # Identification
//! GET  /identify               - Identification view
//! POST /identify/image         - Select image (multipart)
//! POST /identify               - Run identification
//!
//! # Auth
//! POST /auth/google            - Google Identity Services callback
//! GET  /auth/google            - Cancelled sign-in
//! POST /auth/logout            - Sign out
//! ```

pub mod assistant;
pub mod auth;
pub mod home;
pub mod identify;
pub mod plants;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{CspNonce, ai_rate_limiter, identify_rate_limiter};
use crate::models::Flash;
use crate::services::GardenSession;
use crate::state::AppState;

/// Data every page layout needs.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// CSP nonce for `<script>` tags.
    pub nonce: String,
    /// Name shown in the navigation bar when signed in.
    pub user_name: Option<String>,
    /// OAuth client for the sign-in button.
    pub google_client_id: String,
    /// Where sign-in should return to.
    pub current_path: String,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the layout context, consuming any pending flash message.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie session cannot be read.
    pub async fn load(
        state: &AppState,
        garden: &GardenSession,
        cookie: &Session,
        nonce: CspNonce,
        current_path: &str,
    ) -> Result<Self> {
        Ok(Self {
            nonce: nonce.0,
            user_name: garden.user().map(|u| u.greeting_name().to_string()),
            google_client_id: state.identity().google_client_id().to_string(),
            current_path: current_path.to_string(),
            flash: Flash::take(cookie).await?,
        })
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user_name.is_some()
    }
}

/// A same-site path to return to after a POST, or `fallback`.
#[must_use]
pub fn safe_return_path<'a>(requested: Option<&'a str>, fallback: &'a str) -> &'a str {
    requested
        .map(str::trim)
        .filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .unwrap_or(fallback)
}

/// Create the plant routes router.
pub fn plant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(plants::index))
        .route("/{id}", get(plants::show))
        .route("/{id}/bookmark", post(plants::toggle_bookmark))
        .route(
            "/{id}/ask",
            post(plants::ask).layer(ai_rate_limiter()),
        )
}

/// Create the identification routes router.
pub fn identify_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(identify::show).merge(post(identify::run).layer(identify_rate_limiter())),
        )
        .route(
            "/image",
            post(identify::select).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/google", get(auth::cancelled).post(auth::google))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the garden site.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/plants", plant_routes())
        .route(
            "/ai-assistant",
            get(assistant::show).merge(post(assistant::send).layer(ai_rate_limiter())),
        )
        .nest("/identify", identify_routes(max_upload_bytes))
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/plants?q=neem"), "/"), "/plants?q=neem");
        assert_eq!(safe_return_path(Some("//evil.example"), "/plants"), "/plants");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/plants"), "/plants");
        assert_eq!(safe_return_path(Some("/\\evil"), "/"), "/");
        assert_eq!(safe_return_path(None, "/plants"), "/plants");
    }
}
