//! Sign-in and sign-out route handlers.
//!
//! Google Identity Services hands the page a credential; the page script
//! posts it here together with a `g_csrf_token` that must equal the cookie
//! of the same name (double-submit).

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header::COOKIE},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::cookie::Cookie;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::identity::IdentityError;
use crate::middleware::Garden;
use crate::models::Flash;
use crate::routes::safe_return_path;
use crate::state::AppState;

/// Name of the double-submit cookie and form field.
pub const CSRF_COOKIE: &str = "g_csrf_token";

/// Sign-in callback form data.
#[derive(Debug, Default, Deserialize)]
pub struct GoogleCallbackForm {
    pub credential: Option<String>,
    pub g_csrf_token: Option<String>,
    pub return_to: Option<String>,
}

/// Value of the `g_csrf_token` cookie, if sent.
fn csrf_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .find(|cookie| cookie.name() == CSRF_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Check the double-submit token.
///
/// # Errors
///
/// `IdentityError::CsrfMismatch` when the cookie or field is missing or
/// they differ.
fn verify_csrf(headers: &HeaderMap, field: Option<&str>) -> std::result::Result<(), IdentityError> {
    match (csrf_cookie(headers), field) {
        (Some(cookie), Some(field)) if !cookie.is_empty() && cookie == field => Ok(()),
        _ => Err(IdentityError::CsrfMismatch),
    }
}

/// Complete a Google sign-in.
///
/// A missing credential means the user closed the popup and is ignored.
#[tracing::instrument(skip_all)]
pub async fn google(
    State(state): State<AppState>,
    garden: Garden,
    headers: HeaderMap,
    Form(form): Form<GoogleCallbackForm>,
) -> Result<Redirect> {
    let return_to = safe_return_path(form.return_to.as_deref(), "/").to_string();

    let Some(credential) = form.credential.as_deref().filter(|c| !c.trim().is_empty()) else {
        tracing::debug!("Sign-in cancelled");
        return Ok(Redirect::to(&return_to));
    };

    verify_csrf(&headers, form.g_csrf_token.as_deref()).map_err(|e| {
        tracing::warn!("Sign-in CSRF token mismatch");
        AppError::from(e)
    })?;

    match state.identity().sign_in_with_google(credential).await {
        Ok(user) => {
            set_sentry_user(&user);
            add_breadcrumb("auth", "Signed in", None);
            tracing::info!(user_id = %user.uid(), garden = %garden.key, "User signed in");

            let greeting = format!("Signed in as {}.", user.greeting_name());
            garden.session.sign_in(user);
            // Render the next page with the user's bookmarks in place.
            garden.session.settled().await;
            Flash::info(greeting).set(&garden.cookie).await?;
        }
        Err(IdentityError::Cancelled) => {
            tracing::debug!("Sign-in cancelled");
        }
        Err(error) => {
            tracing::warn!(error = %error, "Sign-in failed");
            Flash::error("Sign-in failed. Please try again.")
                .set(&garden.cookie)
                .await?;
        }
    }

    Ok(Redirect::to(&return_to))
}

/// A sign-in that never produced a credential lands here.
pub async fn cancelled() -> Redirect {
    Redirect::to("/")
}

/// Sign out.
#[tracing::instrument(skip_all)]
pub async fn logout(garden: Garden) -> Result<Redirect> {
    if let Some(user) = garden.session.user() {
        tracing::info!(user_id = %user.uid(), "User signed out");
    }
    garden.session.sign_out();
    garden.session.settled().await;
    clear_sentry_user();
    add_breadcrumb("auth", "Signed out", None);

    Flash::info("Signed out.").set(&garden.cookie).await?;
    Ok(Redirect::to("/"))
}
