//! Reacts to a session's auth-state changes.
//!
//! For every emission, including the state at subscription time:
//! - signed in: sync the user record with the backend (failure is logged and
//!   ignored), then refresh the bookmark set;
//! - signed out: clear the bookmark set.
//!
//! The task holds only a weak reference to its session. Dropping the
//! session closes the auth channel and ends the task.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::backend::{BackendClient, UserSync};
use crate::identity::SignedInUser;
use crate::services::bookmarks;
use crate::services::session::{AuthState, GardenSession};

/// Spawn the observer for `session`.
pub fn spawn(session: &Arc<GardenSession>, backend: BackendClient) -> JoinHandle<()> {
    let mut auth = session.subscribe();
    let session = Arc::downgrade(session);

    tokio::spawn(
        async move {
            loop {
                let state: AuthState = auth.borrow_and_update().clone();
                let Some(session) = session.upgrade() else {
                    break;
                };

                observe(&session, &backend, state.user.as_ref()).await;
                session.mark_observed(state.version);
                drop(session);

                if auth.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Session observer stopped");
        }
        .instrument(tracing::debug_span!("session_observer")),
    )
}

async fn observe(session: &GardenSession, backend: &BackendClient, user: Option<&SignedInUser>) {
    if let Some(user) = user {
        sync_user(backend, user).await;
    }
    bookmarks::refresh(session, backend, user).await;
}

/// Create or update the backend's user record. Failures are non-fatal.
async fn sync_user(backend: &BackendClient, user: &SignedInUser) {
    let profile = user.profile();
    let email = profile.email.as_ref().map_or("", |email| email.as_str());
    let sync = UserSync::new(&profile.uid, email, profile.display_name.as_deref());

    let result = match user.id_token().await {
        Ok(token) => backend.sync_user(&sync, &token).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if let Err(error) = result {
        tracing::warn!(user = %profile.uid, error = %error, "User sync failed");
    }
}
