//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError};
use crate::config::GardenConfig;
use crate::identity::{FirebaseIdentity, IdentityError};
use crate::services::GardenSession;

/// Garden sessions are dropped after this long without a request (7 days,
/// matching the session cookie).
pub const GARDEN_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Upper bound on live garden sessions.
const MAX_GARDENS: u64 = 10_000;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the outbound clients and the garden session registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GardenConfig,
    backend: BackendClient,
    identity: FirebaseIdentity,
    gardens: Cache<Uuid, Arc<GardenSession>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: GardenConfig) -> Result<Self, StateError> {
        let backend = BackendClient::new(&config.backend)?;
        let identity = FirebaseIdentity::new(&config.firebase, &config.base_url)?;

        let gardens = Cache::builder()
            .max_capacity(MAX_GARDENS)
            .time_to_idle(GARDEN_IDLE_TIMEOUT)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                identity,
                gardens,
            }),
        })
    }

    /// Get a reference to the garden configuration.
    #[must_use]
    pub fn config(&self) -> &GardenConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the identity client.
    #[must_use]
    pub fn identity(&self) -> &FirebaseIdentity {
        &self.inner.identity
    }

    /// The garden session for `key`, created on first use.
    pub async fn garden(&self, key: Uuid) -> Arc<GardenSession> {
        let backend = self.inner.backend.clone();
        self.inner
            .gardens
            .get_with(key, async move { GardenSession::start(backend) })
            .await
    }
}
