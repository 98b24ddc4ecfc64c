//! AI assistant command.

use std::io::Write;

use herbal_garden_core::{ChatRejection, ChatTranscript};
use herbal_garden_web::backend::BackendClient;

use super::CommandError;

/// Send one message and print the assistant's Markdown reply.
pub async fn run(
    backend: &BackendClient,
    message: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let mut transcript = ChatTranscript::new();
    let turn = transcript.submit(message).map_err(|e| match e {
        ChatRejection::Empty => CommandError::Rejected("Message is empty.".to_string()),
        ChatRejection::Busy => CommandError::Rejected(e.to_string()),
    })?;

    match backend.chat(turn.message()).await {
        Ok(reply) => transcript.answer(turn, reply),
        Err(error) => {
            tracing::warn!(error = %error, "AI chat failed");
            transcript.fail(turn);
        }
    }

    if let Some(reply) = transcript.messages().last() {
        writeln!(out, "{}", reply.text)?;
    }
    match transcript.error() {
        Some(message) => Err(CommandError::Rejected(message.to_string())),
        None => Ok(()),
    }
}
