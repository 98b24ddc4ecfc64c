//! Image identification uploads.

use herbal_garden_core::{IdentifyError, SelectedImage};

use crate::backend::BackendClient;
use crate::services::session::GardenSession;

/// Record an image selection.
///
/// A rejected upload clears any previous selection.
///
/// # Errors
///
/// The rejection reason, passed through.
pub async fn select(
    session: &GardenSession,
    image: Result<SelectedImage, IdentifyError>,
) -> Result<(), IdentifyError> {
    let mut state = session.identify().lock().await;
    match image {
        Ok(image) => {
            state.select(image);
            Ok(())
        }
        Err(error) => {
            state.deselect();
            Err(error)
        }
    }
}

/// Upload the selected image and record the prediction or failure.
///
/// A result for an upload superseded by a newer selection is discarded.
///
/// # Errors
///
/// `IdentifyError::NoImage` when nothing is selected; no request is made.
pub async fn identify(session: &GardenSession, backend: &BackendClient) -> Result<(), IdentifyError> {
    let (ticket, image) = session.identify().lock().await.begin_upload()?;

    let result = backend.identify_plant(&image).await;

    let mut state = session.identify().lock().await;
    let applied = match result {
        Ok(prediction) => state.succeed(ticket, prediction),
        Err(error) => {
            tracing::warn!(error = %error, "Plant identification failed");
            state.fail(ticket, &error.describe())
        }
    };

    if !applied {
        tracing::debug!("Discarded superseded identification result");
    }
    Ok(())
}
