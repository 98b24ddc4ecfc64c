//! Backend REST client implementation.

use std::sync::Arc;

use herbal_garden_core::{Plant, PlantId, Prediction, SelectedImage, UserId};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    BookmarkRecord, ChatRequest, ChatResponse, NewBookmark, PlantRecord, UserSync,
};
use super::{ApiErrorBody, BackendError};
use crate::config::BackendConfig;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the plant REST backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Base URL all paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| BackendError::Parse(format!("invalid backend path {path}: {e}")))
    }

    /// Send a request and decode a JSON success body.
    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e.to_string())
        })
    }

    /// Send a request whose success body is ignored.
    async fn send_empty(request: RequestBuilder) -> Result<(), BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        Ok(())
    }

    // =========================================================================
    // Plants
    // =========================================================================

    /// List plants, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_plants(&self, query: Option<&str>) -> Result<Vec<Plant>, BackendError> {
        let mut url = self.url("plants/")?;
        if let Some(q) = query {
            url.query_pairs_mut().append_pair("q", q);
        }

        let records: Vec<PlantRecord> = Self::send_json(self.inner.client.get(url)).await?;
        debug!(count = records.len(), "Fetched plants");
        Ok(records.into_iter().map(Plant::from).collect())
    }

    /// Fetch one plant.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown id, or another error
    /// if the request fails.
    #[instrument(skip(self), fields(plant_id = %id))]
    pub async fn get_plant(&self, id: PlantId) -> Result<Plant, BackendError> {
        let url = self.url(&format!("plants/{id}"))?;

        match Self::send_json::<PlantRecord>(self.inner.client.get(url)).await {
            Ok(record) => Ok(record.into()),
            Err(BackendError::Api { status: 404, .. }) => {
                Err(BackendError::NotFound(format!("Plant {id}")))
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Bookmarks
    // =========================================================================

    /// Plant ids bookmarked by `user`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self, token), fields(user = %user))]
    pub async fn list_bookmarks(
        &self,
        user: &UserId,
        token: &str,
    ) -> Result<Vec<PlantId>, BackendError> {
        let url = self.url(&format!(
            "bookmarks/user/{}",
            urlencoding::encode(user.as_str())
        ))?;

        let records: Vec<BookmarkRecord> =
            Self::send_json(self.inner.client.get(url).bearer_auth(token)).await?;
        Ok(records.into_iter().map(|record| record.plant_id).collect())
    }

    /// Bookmark `plant` for `user`.
    ///
    /// # Errors
    ///
    /// `BackendError::Api` with status 409 when the bookmark already exists.
    #[instrument(skip(self, token), fields(user = %user, plant_id = %plant))]
    pub async fn create_bookmark(
        &self,
        user: &UserId,
        plant: PlantId,
        token: &str,
    ) -> Result<(), BackendError> {
        let url = self.url("bookmarks/")?;
        let body = NewBookmark {
            plant_id: plant,
            user_google_id: user.as_str(),
        };

        Self::send_empty(self.inner.client.post(url).bearer_auth(token).json(&body)).await
    }

    /// Remove `user`'s bookmark on `plant`.
    ///
    /// # Errors
    ///
    /// `BackendError::Api` with status 404 when there is no such bookmark.
    #[instrument(skip(self, token), fields(user = %user, plant_id = %plant))]
    pub async fn delete_bookmark(
        &self,
        user: &UserId,
        plant: PlantId,
        token: &str,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!(
            "bookmarks/{}/{plant}",
            urlencoding::encode(user.as_str())
        ))?;

        Self::send_empty(self.inner.client.delete(url).bearer_auth(token)).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create or update the backend's record of a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, sync, token), fields(user = %sync.google_id))]
    pub async fn sync_user(&self, sync: &UserSync, token: &str) -> Result<(), BackendError> {
        let url = self.url("users/sync")?;
        Self::send_empty(self.inner.client.post(url).bearer_auth(token).json(sync)).await
    }

    // =========================================================================
    // AI
    // =========================================================================

    /// Send one message to the AI assistant and return its reply.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self, message), fields(len = message.len()))]
    pub async fn chat(&self, message: &str) -> Result<String, BackendError> {
        let url = self.url("ai/chat")?;
        let response: ChatResponse =
            Self::send_json(self.inner.client.post(url).json(&ChatRequest { message })).await?;
        Ok(response.response)
    }

    /// Classify a plant photo.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self, image), fields(file = image.file_name(), bytes = image.bytes().len()))]
    pub async fn identify_plant(&self, image: &SelectedImage) -> Result<Prediction, BackendError> {
        let url = self.url("identify-plant/")?;

        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.content_type())?;
        let form = Form::new().part("image", part);

        Self::send_json(self.inner.client.post(url).multipart(form)).await
    }
}

fn api_error(status: StatusCode, text: &str) -> BackendError {
    debug!(
        status = %status,
        body = %text.chars().take(200).collect::<String>(),
        "Backend returned non-success status"
    );
    BackendError::Api {
        status: status.as_u16(),
        body: ApiErrorBody::parse(text),
    }
}
