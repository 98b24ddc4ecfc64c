//! Request-level errors.
//!
//! Most garden failures never reach [`AppError`]: list, chat, identification
//! and bookmark failures become view state or a flash message. What is left
//! (an unknown plant, a forged sign-in, a broken session store) turns into a
//! plain status response here, and anything 5xx is reported to Sentry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::identity::{IdentityError, SignedInUser};

/// Error returned by route handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Malformed form or upload.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Backend(_) | Self::Identity(IdentityError::Http(_) | IdentityError::Parse(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Identity(IdentityError::Rejected(_) | IdentityError::CsrfMismatch) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Identity(IdentityError::Cancelled) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the visitor.
    fn public_message(&self) -> String {
        match self {
            Self::Backend(BackendError::NotFound(what)) => format!("{what} not found"),
            Self::Backend(_) => "The plant service is unavailable".to_string(),
            Self::Identity(IdentityError::Cancelled) => "Sign-in was cancelled".to_string(),
            Self::Identity(_) => "Sign-in failed".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in user to subsequent Sentry events.
pub fn set_sentry_user(user: &SignedInUser) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user.uid().to_string()),
            email: user.email().map(|email| email.as_str().to_string()),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a visitor action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| {
            (
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            )
        })
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_unknown_plant_is_not_found() {
        let err = AppError::Backend(BackendError::NotFound("Plant 3".to_string()));
        assert_eq!(err.public_message(), "Plant 3 not found");
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_of(AppError::Backend(BackendError::Parse("bad".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AppError::Identity(IdentityError::CsrfMismatch)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Identity(IdentityError::Cancelled)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Backend(BackendError::Parse("missing field `plant_id`".to_string()));
        assert_eq!(err.public_message(), "The plant service is unavailable");
    }
}
