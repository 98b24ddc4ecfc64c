//! Bookmark refresh and toggle against the backend.

use herbal_garden_core::{PlantId, ToggleTicket};
use thiserror::Error;

use crate::backend::{BackendClient, BackendError};
use crate::identity::SignedInUser;
use crate::services::session::GardenSession;

/// Rebuild the session's bookmark set for `user`.
///
/// With no user the set is cleared. Any failure leaves the set empty; a
/// refresh superseded by a newer one, or by a sign-out, changes nothing.
pub async fn refresh(session: &GardenSession, backend: &BackendClient, user: Option<&SignedInUser>) {
    let Some(user) = user else {
        session.bookmarks_lock().write().await.clear();
        return;
    };

    let ticket = session.bookmarks_lock().write().await.begin_refresh(user.uid());

    let fetched = match user.id_token().await {
        Ok(token) => backend
            .list_bookmarks(user.uid(), &token)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let mut store = session.bookmarks_lock().write().await;
    let applied = match fetched {
        Ok(ids) => {
            let count = ids.len();
            let applied = store.complete_refresh(ticket, ids);
            tracing::debug!(user = %user.uid(), count, applied, "Bookmarks refreshed");
            applied
        }
        Err(error) => {
            tracing::warn!(user = %user.uid(), error = %error, "Bookmark refresh failed");
            store.fail_refresh(ticket)
        }
    };

    if !applied {
        tracing::debug!(user = %user.uid(), "Discarded superseded bookmark refresh");
    }
}

/// A confirmed bookmark mutation, ready to apply to the session's set.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct ToggleOutcome {
    pub plant: PlantId,
    pub was_bookmarked: bool,
    pub ticket: ToggleTicket,
}

impl ToggleOutcome {
    /// Confirmation shown after the change.
    #[must_use]
    pub fn message(&self, plant_name: &str) -> String {
        if self.was_bookmarked {
            format!("Removed \"{plant_name}\" from your bookmarks.")
        } else {
            format!("Bookmarked \"{plant_name}\".")
        }
    }
}

/// Why a toggle did not happen. Displays as the message shown to the user.
#[derive(Debug, Error)]
pub enum ToggleFailure {
    #[error("Please sign in to bookmark plants!")]
    SignInRequired,

    #[error("Plant \"{name}\" is already bookmarked by you.")]
    AlreadyBookmarked { name: String },

    #[error("Bookmark for \"{name}\" not found. It might already be unbookmarked.")]
    NotFound { name: String },

    #[error("Failed to toggle bookmark for \"{name}\". Error: {detail}")]
    Rejected { name: String, detail: String },

    #[error("Failed to toggle bookmark for \"{name}\". Please try again.")]
    Transport { name: String },
}

impl ToggleFailure {
    fn from_backend(error: &BackendError, was_bookmarked: bool, name: &str) -> Self {
        let name = name.to_string();
        match error.status() {
            Some(409) => Self::AlreadyBookmarked { name },
            Some(404) if was_bookmarked => Self::NotFound { name },
            Some(_) => Self::Rejected {
                name,
                detail: error.detail_or_message(),
            },
            None => Self::Transport { name },
        }
    }
}

/// Create or delete the signed-in user's bookmark on `plant`.
///
/// Deletes when the plant is currently in the session's set, creates
/// otherwise. The set is not touched: on success the caller applies the
/// returned outcome with [`GardenSession::apply_toggle`].
///
/// # Errors
///
/// `ToggleFailure::SignInRequired` without a user (no request is made);
/// the other variants describe a failed backend call.
pub async fn toggle(
    session: &GardenSession,
    backend: &BackendClient,
    plant: PlantId,
    plant_name: &str,
) -> Result<ToggleOutcome, ToggleFailure> {
    let Some(user) = session.user() else {
        return Err(ToggleFailure::SignInRequired);
    };

    let (ticket, was_bookmarked) = {
        let store = session.bookmarks().await;
        (store.begin_toggle(), store.contains(plant))
    };

    let token = user.id_token().await.map_err(|e| {
        tracing::warn!(error = %e, "Could not obtain bearer token for bookmark toggle");
        ToggleFailure::Transport {
            name: plant_name.to_string(),
        }
    })?;

    let result = if was_bookmarked {
        backend.delete_bookmark(user.uid(), plant, &token).await
    } else {
        backend.create_bookmark(user.uid(), plant, &token).await
    };

    match result {
        Ok(()) => Ok(ToggleOutcome {
            plant,
            was_bookmarked,
            ticket,
        }),
        Err(error) => {
            tracing::warn!(plant_id = %plant, error = %error, "Bookmark toggle failed");
            Err(ToggleFailure::from_backend(&error, was_bookmarked, plant_name))
        }
    }
}
