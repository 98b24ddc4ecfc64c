//! Session middleware configuration.
//!
//! Sessions live in memory; the cookie carries only the session id. Garden
//! state itself is kept in the `AppState` registry keyed by a value stored
//! in the session.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::GardenConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "herbal_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &GardenConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
