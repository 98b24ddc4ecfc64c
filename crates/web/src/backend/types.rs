//! Wire types for the backend's JSON bodies.
//!
//! Records are decoded leniently (missing optional fields default) and
//! converted into the core domain types before leaving this module.

use herbal_garden_core::{BookmarkId, Plant, PlantId, UserId};
use serde::{Deserialize, Serialize};

/// A plant as returned by `GET /plants/` and `GET /plants/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantRecord {
    pub plant_id: i32,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uses: Option<Vec<String>>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub plant_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<PlantRecord> for Plant {
    fn from(record: PlantRecord) -> Self {
        Self {
            id: PlantId::new(record.plant_id),
            common_name: record.common_name.unwrap_or_default(),
            scientific_name: record.scientific_name,
            description: record.description,
            uses: record.uses.unwrap_or_default(),
            region: record.region,
            plant_type: record.plant_type,
            image_url: record.image_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

/// A bookmark as returned by `GET /bookmarks/user/{uid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkRecord {
    #[serde(default)]
    pub bookmark_id: Option<BookmarkId>,
    #[serde(default)]
    pub user_google_id: Option<String>,
    pub plant_id: PlantId,
    #[serde(default)]
    pub bookmarked_at: Option<String>,
}

/// Body of `POST /bookmarks/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBookmark<'a> {
    pub plant_id: PlantId,
    pub user_google_id: &'a str,
}

/// Body of `POST /ai/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Response of `POST /ai/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Body of `POST /users/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSync {
    pub google_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserSync {
    /// Sync body for a signed-in user. The display name doubles as the
    /// first name, falling back to the email.
    #[must_use]
    pub fn new(uid: &UserId, email: &str, display_name: Option<&str>) -> Self {
        let first_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(email);
        Self {
            google_id: uid.as_str().to_string(),
            email: email.to_string(),
            first_name: Some(first_name.to_string()),
            last_name: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_record_defaults() {
        let record: PlantRecord =
            serde_json::from_str(r#"{"plant_id": 4, "common_name": "Aloe Vera", "uses": null}"#)
                .unwrap();
        let plant = Plant::from(record);
        assert_eq!(plant.id, PlantId::new(4));
        assert!(plant.uses.is_empty());
        assert_eq!(plant.image_url, None);
    }

    #[test]
    fn test_bookmark_record() {
        let record: BookmarkRecord = serde_json::from_str(
            r#"{"bookmark_id": 1, "user_google_id": "u1", "plant_id": 7,
                "bookmarked_at": "2025-06-01T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(record.plant_id, PlantId::new(7));
    }

    #[test]
    fn test_new_bookmark_body() {
        let body = NewBookmark {
            plant_id: PlantId::new(5),
            user_google_id: "u1",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"plant_id": 5, "user_google_id": "u1"})
        );
    }

    #[test]
    fn test_user_sync_first_name_fallback() {
        let uid = UserId::new("u1");
        let sync = UserSync::new(&uid, "grower@garden.org", None);
        assert_eq!(sync.first_name.as_deref(), Some("grower@garden.org"));
        assert_eq!(sync.last_name, None);

        let sync = UserSync::new(&uid, "grower@garden.org", Some("Asha Rao"));
        assert_eq!(sync.first_name.as_deref(), Some("Asha Rao"));
    }
}
