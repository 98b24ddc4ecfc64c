//! Garden session extractor.
//!
//! Resolves the [`GardenSession`] of the requesting browser. The cookie
//! session stores only a random key; the garden itself lives in the
//! `AppState` registry and is created on first use.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session_keys;
use crate::services::GardenSession;
use crate::state::AppState;

/// The requesting browser's garden session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(garden: Garden) -> impl IntoResponse {
///     let user = garden.session.user();
///     // ...
/// }
/// ```
pub struct Garden {
    /// Registry key stored in the cookie session.
    pub key: Uuid,
    /// The garden state.
    pub session: Arc<GardenSession>,
    /// The cookie session, for flash messages and preferences.
    pub cookie: Session,
}

impl FromRequestParts<AppState> for Garden {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer not installed".to_string()))?;

        let key = if let Some(key) = cookie.get::<Uuid>(session_keys::GARDEN_ID).await? {
            key
        } else {
            let key = Uuid::new_v4();
            cookie.insert(session_keys::GARDEN_ID, key).await?;
            tracing::debug!(garden = %key, "New garden session");
            key
        };

        let session = state.garden(key).await;
        if let Some(user) = session.user() {
            tracing::Span::current().record("user_id", user.uid().as_str());
        }

        Ok(Self {
            key,
            session,
            cookie,
        })
    }
}
