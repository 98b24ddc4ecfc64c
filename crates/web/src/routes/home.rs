//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, Garden};
use crate::routes::PageContext;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
}

/// Display the home page.
#[tracing::instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let page = PageContext::load(&state, &garden.session, &garden.cookie, nonce, "/").await?;
    Ok(HomeTemplate { page })
}
