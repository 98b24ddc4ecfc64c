//! AI assistant turns.

use std::sync::Arc;

use herbal_garden_core::ChatRejection;

use crate::backend::BackendClient;
use crate::services::session::GardenSession;

/// Send `text` as the next user turn and append the reply.
///
/// The user turn is appended before the call; a failed call appends the
/// fallback reply and sets the transcript's error. The call runs in its own
/// task, so the transcript settles even if the caller is dropped.
///
/// # Errors
///
/// Blank input, or a reply still pending for this session.
pub async fn send(
    session: &Arc<GardenSession>,
    backend: &BackendClient,
    text: &str,
) -> Result<(), ChatRejection> {
    let turn = session.chat().lock().await.submit(text)?;

    let session = Arc::clone(session);
    let backend = backend.clone();
    let settle = tokio::spawn(async move {
        let reply = backend.chat(turn.message()).await;

        let mut chat = session.chat().lock().await;
        match reply {
            Ok(reply) => chat.answer(turn, reply),
            Err(error) => {
                tracing::warn!(error = %error, "AI chat failed");
                chat.fail(turn);
            }
        }
    });

    if let Err(error) = settle.await {
        tracing::error!(error = %error, "AI chat task panicked");
    }
    Ok(())
}
