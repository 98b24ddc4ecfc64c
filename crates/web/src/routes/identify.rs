//! Image identification route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect},
};

use herbal_garden_core::{IdentifyError, IdentifyPhase, Prediction, SelectedImage};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, Garden};
use crate::models::Flash;
use crate::routes::PageContext;
use crate::services::identify;
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Identification page template.
#[derive(Template, WebTemplate)]
#[template(path = "identify.html")]
pub struct IdentifyTemplate {
    pub page: PageContext,
    pub preview: Option<String>,
    pub file_name: Option<String>,
    pub uploading: bool,
    pub prediction: Option<Prediction>,
    pub error: Option<String>,
}

/// Display the identification view.
#[tracing::instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let view = garden.session.identification().await;
    let page =
        PageContext::load(&state, &garden.session, &garden.cookie, nonce, "/identify").await?;

    let (uploading, prediction, error) = match view.phase() {
        IdentifyPhase::Idle | IdentifyPhase::Selected => (false, None, None),
        IdentifyPhase::Uploading => (true, None, None),
        IdentifyPhase::Identified(prediction) => (false, Some(prediction.clone()), None),
        IdentifyPhase::Failed(message) => (false, None, Some(message.clone())),
    };

    Ok(IdentifyTemplate {
        page,
        preview: view.image().map(SelectedImage::preview_data_url),
        file_name: view.image().map(|image| image.file_name().to_string()),
        uploading,
        prediction,
        error,
    })
}

/// Read the `image` field of a selection form.
async fn read_image(
    multipart: &mut Multipart,
) -> Result<std::result::Result<SelectedImage, IdentifyError>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        return Ok(SelectedImage::new(file_name, content_type, bytes.to_vec()));
    }
    Ok(Err(IdentifyError::NoImage))
}

/// Select an image, replacing any previous selection and result.
#[tracing::instrument(skip_all)]
pub async fn select(garden: Garden, mut multipart: Multipart) -> Result<Redirect> {
    let image = read_image(&mut multipart).await?;

    if let Err(error) = identify::select(&garden.session, image).await {
        tracing::debug!(error = %error, "Rejected image selection");
        Flash::error(error.to_string()).set(&garden.cookie).await?;
    }
    Ok(Redirect::to("/identify"))
}

/// Identify the selected image.
#[tracing::instrument(skip_all)]
pub async fn run(State(state): State<AppState>, garden: Garden) -> Result<Redirect> {
    add_breadcrumb("identify", "Identification requested", None);
    // A missing image is recorded as the view's error.
    if let Err(error) = identify::identify(&garden.session, state.backend()).await {
        tracing::debug!(error = %error, "Identification not started");
    }
    Ok(Redirect::to("/identify"))
}
