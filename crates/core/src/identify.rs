//! Image identification state.
//!
//! `Idle -> Selected -> Uploading -> Identified | Failed`. Selecting a new
//! image from any state starts over, and a result that arrives for an
//! upload superseded by a newer selection or upload is ignored.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Rendered for a missing plant name or description.
pub const NOT_AVAILABLE: &str = "N/A";

/// Rendered for a missing usage text.
pub const NO_USAGE_MESSAGE: &str = "No usage information available.";

/// Fallback detail when a failure carries nothing readable.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred.";

/// Selection-time and upload-time rejections.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    #[error("Please select an image first.")]
    NoImage,
    #[error("{content_type} is not an image")]
    NotAnImage { content_type: String },
}

/// An image chosen for identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl SelectedImage {
    /// Accept an uploaded file.
    ///
    /// # Errors
    ///
    /// [`IdentifyError::NoImage`] for an empty upload (no file chosen) and
    /// [`IdentifyError::NotAnImage`] when the content type is not `image/*`.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, IdentifyError> {
        let content_type = content_type.into();
        if bytes.is_empty() {
            return Err(IdentifyError::NoImage);
        }
        if !content_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        {
            return Err(IdentifyError::NotAnImage { content_type });
        }

        Ok(Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Inline `data:` URL used as the preview.
    #[must_use]
    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Classification returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub plant_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
    /// Fraction in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: Option<f64>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

impl Prediction {
    #[must_use]
    pub fn plant_name_or_na(&self) -> &str {
        non_empty(self.plant_name.as_deref()).unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn description_or_na(&self) -> &str {
        non_empty(self.description.as_deref()).unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn usage_or_default(&self) -> &str {
        non_empty(self.usage.as_deref()).unwrap_or(NO_USAGE_MESSAGE)
    }

    /// Confidence as a percentage with two decimals, e.g. `87.00%`.
    #[must_use]
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.2}%", c * 100.0))
    }
}

/// Where identification stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IdentifyPhase {
    #[default]
    Idle,
    Selected,
    Uploading,
    Identified(Prediction),
    Failed(String),
}

/// Captured by [`IdentifyState::begin_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct UploadTicket(u64);

/// The identification view of one session.
#[derive(Debug, Clone, Default)]
pub struct IdentifyState {
    image: Option<SelectedImage>,
    phase: IdentifyPhase,
    issued: u64,
}

impl IdentifyState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub const fn phase(&self) -> &IdentifyPhase {
        &self.phase
    }

    /// Choose a new image, clearing any previous result or error.
    pub fn select(&mut self, image: SelectedImage) {
        self.image = Some(image);
        self.phase = IdentifyPhase::Selected;
        self.issued += 1;
    }

    /// Forget the selection after a rejected upload.
    pub fn deselect(&mut self) {
        self.image = None;
        self.phase = IdentifyPhase::Idle;
        self.issued += 1;
    }

    /// Start uploading the selected image.
    ///
    /// # Errors
    ///
    /// [`IdentifyError::NoImage`] when nothing is selected; the message is
    /// also recorded as the view's error.
    pub fn begin_upload(&mut self) -> Result<(UploadTicket, SelectedImage), IdentifyError> {
        let Some(image) = self.image.clone() else {
            self.phase = IdentifyPhase::Failed(IdentifyError::NoImage.to_string());
            return Err(IdentifyError::NoImage);
        };

        self.issued += 1;
        self.phase = IdentifyPhase::Uploading;
        Ok((UploadTicket(self.issued), image))
    }

    /// Record a prediction. Superseded uploads are ignored.
    pub fn succeed(&mut self, ticket: UploadTicket, prediction: Prediction) -> bool {
        if ticket.0 != self.issued {
            return false;
        }
        self.phase = IdentifyPhase::Identified(prediction);
        true
    }

    /// Record a failure with a readable detail. Superseded uploads are
    /// ignored.
    pub fn fail(&mut self, ticket: UploadTicket, detail: &str) -> bool {
        if ticket.0 != self.issued {
            return false;
        }
        let detail = if detail.trim().is_empty() {
            UNKNOWN_ERROR
        } else {
            detail
        };
        self.phase = IdentifyPhase::Failed(format!("Failed to identify plant: {detail}"));
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jpeg() -> SelectedImage {
        SelectedImage::new("leaf.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff]).unwrap()
    }

    #[test]
    fn test_rejects_non_images() {
        assert_eq!(
            SelectedImage::new("notes.txt", "text/plain", b"hi".to_vec()),
            Err(IdentifyError::NotAnImage {
                content_type: "text/plain".to_string()
            })
        );
        assert_eq!(
            SelectedImage::new("", "application/octet-stream", Vec::new()),
            Err(IdentifyError::NoImage)
        );
        assert!(SelectedImage::new("a.PNG", "IMAGE/PNG", vec![1]).is_ok());
    }

    #[test]
    fn test_preview_data_url() {
        assert_eq!(jpeg().preview_data_url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_upload_without_image() {
        let mut state = IdentifyState::new();
        assert_eq!(state.begin_upload().unwrap_err(), IdentifyError::NoImage);
        assert_eq!(
            state.phase(),
            &IdentifyPhase::Failed("Please select an image first.".to_string())
        );
    }

    #[test]
    fn test_successful_identification() {
        let mut state = IdentifyState::new();
        state.select(jpeg());
        let (ticket, image) = state.begin_upload().unwrap();
        assert_eq!(image.file_name(), "leaf.jpg");
        assert_eq!(state.phase(), &IdentifyPhase::Uploading);

        let prediction = Prediction {
            plant_name: Some("Neem".to_string()),
            confidence: Some(0.87),
            ..Prediction::default()
        };
        assert!(state.succeed(ticket, prediction));

        let IdentifyPhase::Identified(prediction) = state.phase() else {
            panic!("expected a prediction");
        };
        assert_eq!(prediction.plant_name_or_na(), "Neem");
        assert_eq!(prediction.description_or_na(), NOT_AVAILABLE);
        assert_eq!(prediction.usage_or_default(), NO_USAGE_MESSAGE);
        assert_eq!(prediction.confidence_percent().as_deref(), Some("87.00%"));
    }

    #[test]
    fn test_new_selection_supersedes_upload() {
        let mut state = IdentifyState::new();
        state.select(jpeg());
        let (ticket, _) = state.begin_upload().unwrap();

        state.select(jpeg());
        assert!(!state.fail(ticket, "timeout"));
        assert_eq!(state.phase(), &IdentifyPhase::Selected);
    }

    #[test]
    fn test_failure_message() {
        let mut state = IdentifyState::new();
        state.select(jpeg());
        let (ticket, _) = state.begin_upload().unwrap();
        assert!(state.fail(ticket, "Invalid image"));
        assert_eq!(
            state.phase(),
            &IdentifyPhase::Failed("Failed to identify plant: Invalid image".to_string())
        );
    }

    #[test]
    fn test_deselect_clears_image() {
        let mut state = IdentifyState::new();
        state.select(jpeg());
        state.deselect();
        assert!(state.image().is_none());
        assert!(state.begin_upload().is_err());
    }
}
