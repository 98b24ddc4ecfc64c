//! Per-browser-session garden state.
//!
//! A [`GardenSession`] owns everything one visitor sees: the signed-in user,
//! their bookmark set, the plant list, the chat transcript and the
//! identification view. Sessions live in the registry held by `AppState`
//! and are dropped after the idle timeout, which also stops their observer.

use std::sync::Arc;

use herbal_garden_core::{
    BookmarkStore, ChatTranscript, IdentifyState, PlantId, PlantList, SearchBox, ToggleTicket,
};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, watch};
use tokio::task::AbortHandle;

use crate::backend::BackendClient;
use crate::identity::SignedInUser;
use crate::services::session_observer;

/// One emission of a session's auth-state stream.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// Incremented on every sign-in and sign-out.
    pub version: u64,
    pub user: Option<SignedInUser>,
}

/// The in-memory state of one browser session.
pub struct GardenSession {
    auth: watch::Sender<AuthState>,
    observed: watch::Sender<u64>,
    bookmarks: RwLock<BookmarkStore>,
    search: Mutex<SearchBox>,
    list: Mutex<PlantList>,
    list_task: Mutex<Option<AbortHandle>>,
    chat: Mutex<ChatTranscript>,
    identify: Mutex<IdentifyState>,
}

impl GardenSession {
    /// Create a session and start its observer.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(backend: BackendClient) -> Arc<Self> {
        let session = Arc::new(Self::detached());
        session_observer::spawn(&session, backend);
        session
    }

    /// A session without an observer.
    fn detached() -> Self {
        let (auth, _) = watch::channel(AuthState::default());
        let (observed, _) = watch::channel(0);
        Self {
            auth,
            observed,
            bookmarks: RwLock::new(BookmarkStore::new()),
            search: Mutex::new(SearchBox::new()),
            list: Mutex::new(PlantList::new()),
            list_task: Mutex::new(None),
            chat: Mutex::new(ChatTranscript::new()),
            identify: Mutex::new(IdentifyState::new()),
        }
    }

    // =========================================================================
    // Auth state
    // =========================================================================

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SignedInUser> {
        self.auth.borrow().user.clone()
    }

    /// Subscribe to auth-state changes. The current state counts as unseen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        let mut rx = self.auth.subscribe();
        rx.mark_changed();
        rx
    }

    /// Publish a sign-in.
    pub fn sign_in(&self, user: SignedInUser) {
        self.publish(Some(user));
    }

    /// Publish a sign-out.
    pub fn sign_out(&self) {
        self.publish(None);
    }

    fn publish(&self, user: Option<SignedInUser>) {
        self.auth.send_modify(|state| {
            state.version += 1;
            state.user = user;
        });
    }

    /// Record that the observer has handled auth state `version`.
    pub(crate) fn mark_observed(&self, version: u64) {
        self.observed.send_replace(version);
    }

    /// Wait until the observer has handled the latest auth state, including
    /// its bookmark refresh.
    pub async fn settled(&self) {
        let target = self.auth.borrow().version;
        let mut observed = self.observed.subscribe();
        // The sender lives in `self`, so this cannot fail while we borrow it.
        let _ = observed.wait_for(|seen| *seen >= target).await;
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Read access to the bookmark set.
    pub async fn bookmarks(&self) -> RwLockReadGuard<'_, BookmarkStore> {
        self.bookmarks.read().await
    }

    pub(crate) const fn bookmarks_lock(&self) -> &RwLock<BookmarkStore> {
        &self.bookmarks
    }

    /// Apply a confirmed toggle. Returns `false` if the user changed since
    /// the toggle started.
    pub async fn apply_toggle(
        &self,
        ticket: ToggleTicket,
        plant: PlantId,
        was_bookmarked: bool,
    ) -> bool {
        self.bookmarks
            .write()
            .await
            .commit_toggle(ticket, plant, was_bookmarked)
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub(crate) const fn search(&self) -> &Mutex<SearchBox> {
        &self.search
    }

    pub(crate) const fn list(&self) -> &Mutex<PlantList> {
        &self.list
    }

    pub(crate) const fn list_task(&self) -> &Mutex<Option<AbortHandle>> {
        &self.list_task
    }

    pub(crate) const fn chat(&self) -> &Mutex<ChatTranscript> {
        &self.chat
    }

    pub(crate) const fn identify(&self) -> &Mutex<IdentifyState> {
        &self.identify
    }

    /// Snapshot of the plant list.
    pub async fn plant_list(&self) -> PlantList {
        self.list.lock().await.clone()
    }

    /// Snapshot of the search box.
    pub async fn search_box(&self) -> SearchBox {
        self.search.lock().await.clone()
    }

    /// Snapshot of the chat transcript.
    pub async fn transcript(&self) -> ChatTranscript {
        self.chat.lock().await.clone()
    }

    /// Snapshot of the identification view.
    pub async fn identification(&self) -> IdentifyState {
        self.identify.lock().await.clone()
    }
}

impl std::fmt::Debug for GardenSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GardenSession")
            .field("version", &self.auth.borrow().version)
            .finish_non_exhaustive()
    }
}
