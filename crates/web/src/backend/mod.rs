//! Client for the plant REST backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend owns plants, bookmarks,
//!   the AI assistant and the identification model
//! - No caching: plant snapshots are fetched on every navigation
//! - Bookmark and user-sync calls carry the signed-in user's bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! use herbal_garden_web::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//! let plants = client.list_plants(Some("neem")).await?;
//! let reply = client.chat("What is neem used for?").await?;
//! ```

mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use herbal_garden_core::identify::UNKNOWN_ERROR;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {}", .body.describe().unwrap_or_default())]
    Api { status: u16, body: ApiErrorBody },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Whether the request never got an HTTP response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// The `detail` field of an error response, else a generic status
    /// message, else the error text.
    #[must_use]
    pub fn detail_or_message(&self) -> String {
        match self {
            Self::Api {
                body: body @ ApiErrorBody::Detail(_),
                ..
            } => body.describe().unwrap_or_default(),
            Self::Api { status, .. } => format!("Request failed with status code {status}"),
            Self::Http(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Parse(msg) => msg.clone(),
        }
    }

    /// Readable detail for any failure.
    ///
    /// Error bodies go through [`ApiErrorBody::describe`]; transport and
    /// parse errors use their own message; anything left is
    /// `"Unknown error occurred."`.
    #[must_use]
    pub fn describe(&self) -> String {
        let detail = match self {
            Self::Api { body, .. } => body.describe(),
            Self::Http(err) => Some(err.to_string()),
            Self::NotFound(what) => Some(format!("{what} not found")),
            Self::Parse(msg) => Some(msg.clone()),
        };
        detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}

/// Decoded body of a backend error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorBody {
    /// JSON object with a non-empty `detail` member.
    Detail(Value),
    /// Body was a JSON string, or not JSON at all.
    Text(String),
    /// Any other JSON.
    Json(Value),
    /// No body.
    Empty,
}

impl ApiErrorBody {
    /// Decode a raw response body.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(mut map)) => match map.remove("detail") {
                Some(detail) if is_truthy(&detail) => Self::Detail(detail),
                Some(detail) => {
                    map.insert("detail".to_string(), detail);
                    Self::Json(Value::Object(map))
                }
                None => Self::Json(Value::Object(map)),
            },
            Ok(Value::String(text)) => Self::Text(text),
            Ok(other) => Self::Json(other),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Text shown to the user: a string `detail` as is, any other `detail`
    /// or JSON as its JSON text, plain text as is.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::Detail(Value::String(text)) | Self::Text(text) => Some(text.clone()),
            Self::Detail(value) | Self::Json(value) => Some(value.to_string()),
            Self::Empty => None,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
