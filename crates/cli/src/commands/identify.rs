//! Image identification command.

use std::io::Write;
use std::path::Path;

use herbal_garden_core::identify::UNKNOWN_ERROR;
use herbal_garden_core::{IdentifyPhase, IdentifyState, SelectedImage};
use herbal_garden_web::backend::BackendClient;

use super::CommandError;

/// Content type for an image file, from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Identify the plant in the image at `path`.
pub async fn run(
    backend: &BackendClient,
    path: &Path,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let image = SelectedImage::new(file_name, content_type_for(path), bytes)
        .map_err(|e| CommandError::Rejected(e.to_string()))?;

    let mut state = IdentifyState::new();
    state.select(image);
    let (ticket, image) = state
        .begin_upload()
        .map_err(|e| CommandError::Rejected(e.to_string()))?;

    match backend.identify_plant(&image).await {
        Ok(prediction) => {
            state.succeed(ticket, prediction);
        }
        Err(error) => {
            state.fail(ticket, &error.describe());
        }
    }

    match state.phase() {
        IdentifyPhase::Identified(prediction) => {
            writeln!(out, "Plant: {}", prediction.plant_name_or_na())?;
            if let Some(confidence) = prediction.confidence_percent() {
                writeln!(out, "Confidence: {confidence}")?;
            }
            writeln!(out, "Description: {}", prediction.description_or_na())?;
            writeln!(out, "Usage: {}", prediction.usage_or_default())?;
            Ok(())
        }
        IdentifyPhase::Failed(message) => Err(CommandError::Rejected(message.clone())),
        _ => Err(CommandError::Rejected(UNKNOWN_ERROR.to_string())),
    }
}
