//! Plant list loading with last-request-wins semantics.

use std::sync::Arc;

use herbal_garden_core::{Plant, PlantId, SearchTerm};

use crate::backend::{BackendClient, BackendError};
use crate::services::session::GardenSession;

/// How a list load ended for the request that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// This request's fetch settled the list.
    Current,
    /// A newer request took over; the list reflects that one instead.
    Superseded,
}

/// Fetch plants for `term` into the session's list.
///
/// Any fetch still in flight for the session is aborted, and should its
/// result arrive anyway it is discarded. Failures settle the list as failed.
pub async fn load(
    session: &Arc<GardenSession>,
    backend: &BackendClient,
    term: SearchTerm,
) -> ListOutcome {
    let (ticket, handle) = {
        let mut list = session.list().lock().await;
        let mut task = session.list_task().lock().await;

        let query = term.as_query().map(str::to_owned);
        let ticket = list.begin_fetch(term);
        let backend = backend.clone();
        let handle =
            tokio::spawn(async move { backend.list_plants(query.as_deref()).await });

        if let Some(previous) = task.replace(handle.abort_handle()) {
            previous.abort();
        }
        (ticket, handle)
    };

    let result = handle.await;
    if result.as_ref().is_err_and(tokio::task::JoinError::is_cancelled) {
        return ListOutcome::Superseded;
    }

    let mut list = session.list().lock().await;
    let applied = match result {
        Ok(Ok(plants)) => list.complete(ticket, plants),
        Ok(Err(error)) => {
            tracing::warn!(error = %error, "Failed to load plants");
            list.fail(ticket)
        }
        Err(join) => {
            tracing::error!(error = %join, "Plant list task panicked");
            list.fail(ticket)
        }
    };

    if applied {
        ListOutcome::Current
    } else {
        ListOutcome::Superseded
    }
}

/// What a list request does to the session's search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAction<'a> {
    /// Re-show the current term.
    Show,
    /// Submit the given input.
    Submit(&'a str),
    /// The input was emptied without submitting.
    Clear,
}

/// Apply `action` to the search box, then load the resulting term.
pub async fn search(
    session: &Arc<GardenSession>,
    backend: &BackendClient,
    action: SearchAction<'_>,
) -> ListOutcome {
    let term = {
        let mut search = session.search().lock().await;
        match action {
            SearchAction::Show => search.submitted().clone(),
            SearchAction::Submit(input) => {
                search.edit(input);
                search.submit()
            }
            SearchAction::Clear => search
                .edit("")
                .unwrap_or_else(|| search.submitted().clone()),
        }
    };
    tracing::debug!(term = %term, "Loading plant list");
    load(session, backend, term).await
}

/// Fetch one plant for the detail page.
///
/// # Errors
///
/// `BackendError::NotFound` for an unknown id, other errors as returned by
/// the client.
pub async fn plant(backend: &BackendClient, id: PlantId) -> Result<Plant, BackendError> {
    backend.get_plant(id).await
}
