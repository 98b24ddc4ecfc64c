//! AI assistant route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use herbal_garden_core::{ChatMessage, ChatRejection};

use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, Garden};
use crate::models::Flash;
use crate::routes::PageContext;
use crate::services::chat;
use crate::state::AppState;

/// AI assistant page template.
#[derive(Template, WebTemplate)]
#[template(path = "assistant.html")]
pub struct AssistantTemplate {
    pub page: PageContext,
    pub messages: Vec<ChatMessage>,
    pub busy: bool,
    pub error: Option<&'static str>,
}

/// Display the transcript.
#[tracing::instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let transcript = garden.session.transcript().await;
    let page =
        PageContext::load(&state, &garden.session, &garden.cookie, nonce, "/ai-assistant").await?;

    Ok(AssistantTemplate {
        page,
        messages: transcript.messages().to_vec(),
        busy: transcript.is_busy(),
        error: transcript.error(),
    })
}

/// Chat form data.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

/// Send a message and wait for the reply.
#[tracing::instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    garden: Garden,
    Form(form): Form<ChatForm>,
) -> Result<Redirect> {
    match chat::send(&garden.session, state.backend(), &form.message).await {
        Ok(()) | Err(ChatRejection::Empty) => {}
        Err(ChatRejection::Busy) => {
            Flash::info("Still waiting for the previous reply.")
                .set(&garden.cookie)
                .await?;
        }
    }
    Ok(Redirect::to("/ai-assistant"))
}
