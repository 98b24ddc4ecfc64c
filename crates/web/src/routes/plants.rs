//! Plant list, detail, bookmark and question route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use herbal_garden_core::catalog::{LOAD_FAILED_MESSAGE, NO_MATCHES_MESSAGE};
use herbal_garden_core::{ListPhase, Plant, PlantId, PlantQuestion};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, Garden};
use crate::models::{Flash, session_keys};
use crate::routes::{PageContext, safe_return_path};
use crate::services::bookmarks::{self, ToggleFailure};
use crate::services::catalog::{self, SearchAction};
use crate::services::questions::{self, QuestionAnswer};
use crate::state::AppState;

// =============================================================================
// View models
// =============================================================================

/// Plant card display data.
#[derive(Debug, Clone)]
pub struct PlantCardView {
    pub id: PlantId,
    pub name: String,
    pub scientific_name: Option<String>,
    pub image_url: Option<String>,
    pub uses: Option<String>,
    pub bookmarked: bool,
}

impl PlantCardView {
    fn new(plant: &Plant, bookmarked: bool) -> Self {
        Self {
            id: plant.id,
            name: plant.display_name().to_string(),
            scientific_name: plant.scientific_name.clone(),
            image_url: plant.image_url.clone(),
            uses: plant.uses_line(),
            bookmarked,
        }
    }
}

/// Plant detail display data.
#[derive(Debug, Clone)]
pub struct PlantDetailView {
    pub card: PlantCardView,
    pub description: Option<String>,
    pub region: Option<String>,
    pub plant_type: Option<String>,
    pub uses: Vec<String>,
}

/// Question button display data.
#[derive(Debug, Clone, Copy)]
pub struct QuestionButton {
    pub key: &'static str,
    pub label: &'static str,
}

fn question_buttons() -> Vec<QuestionButton> {
    PlantQuestion::OFFERED
        .iter()
        .map(|q| QuestionButton {
            key: q.key(),
            label: q.label(),
        })
        .collect()
}

/// Answer display data.
#[derive(Debug, Clone)]
pub struct AnswerView {
    pub label: &'static str,
    pub markdown: Option<String>,
    pub error: Option<String>,
}

impl From<QuestionAnswer> for AnswerView {
    fn from(answer: QuestionAnswer) -> Self {
        let label = answer.question().label();
        match answer {
            QuestionAnswer::Answered { markdown, .. } => Self {
                label,
                markdown: Some(markdown),
                error: None,
            },
            QuestionAnswer::Failed { message, .. } => Self {
                label,
                markdown: None,
                error: Some(message),
            },
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Plant listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "plants/index.html")]
pub struct PlantsIndexTemplate {
    pub page: PageContext,
    pub search_input: String,
    pub bookmarked_only: bool,
    pub loading: bool,
    pub error: Option<&'static str>,
    pub empty_message: Option<&'static str>,
    pub plants: Vec<PlantCardView>,
}

/// Plant detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "plants/show.html")]
pub struct PlantShowTemplate {
    pub page: PageContext,
    pub plant: PlantDetailView,
    pub questions: Vec<QuestionButton>,
    pub answer: Option<AnswerView>,
}

// =============================================================================
// List
// =============================================================================

/// Plant list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PlantsQuery {
    /// Submitted search input.
    pub q: Option<String>,
    /// `1` to show only bookmarked plants, `0` to show all.
    pub bookmarks: Option<String>,
    /// Set by the page script when the search input is emptied.
    pub cleared: Option<String>,
}

impl PlantsQuery {
    fn action(&self) -> SearchAction<'_> {
        if self.cleared.is_some() {
            SearchAction::Clear
        } else if let Some(q) = &self.q {
            SearchAction::Submit(q)
        } else {
            SearchAction::Show
        }
    }

    fn bookmarked_only(&self) -> Option<bool> {
        self.bookmarks
            .as_deref()
            .map(|value| matches!(value, "1" | "true" | "on"))
    }
}

/// Display the plant list, applying the search and filter parameters.
#[tracing::instrument(skip(state, garden, nonce))]
pub async fn index(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
    Query(query): Query<PlantsQuery>,
) -> Result<impl IntoResponse> {
    let bookmarked_only = match query.bookmarked_only() {
        Some(flag) => {
            garden
                .cookie
                .insert(session_keys::BOOKMARKED_ONLY, flag)
                .await?;
            flag
        }
        None => garden
            .cookie
            .get::<bool>(session_keys::BOOKMARKED_ONLY)
            .await?
            .unwrap_or(false),
    };

    catalog::search(&garden.session, state.backend(), query.action()).await;

    let list = garden.session.plant_list().await;
    let search = garden.session.search_box().await;
    let user = garden.session.user();
    let store = garden.session.bookmarks().await;

    let plants: Vec<PlantCardView> = list
        .visible(user.as_ref().map(|_| &*store), bookmarked_only)
        .into_iter()
        .map(|plant| PlantCardView::new(plant, store.contains(plant.id)))
        .collect();
    drop(store);

    let (loading, error) = match list.phase() {
        ListPhase::Loading => (true, None),
        ListPhase::Loaded(_) => (false, None),
        ListPhase::Failed => (false, Some(LOAD_FAILED_MESSAGE)),
    };
    let empty_message = (!loading && error.is_none() && plants.is_empty()).then_some(NO_MATCHES_MESSAGE);

    let page = PageContext::load(&state, &garden.session, &garden.cookie, nonce, "/plants").await?;

    Ok(PlantsIndexTemplate {
        page,
        search_input: search.input().to_string(),
        bookmarked_only: bookmarked_only && user.is_some(),
        loading,
        error,
        empty_message,
        plants,
    })
}

// =============================================================================
// Detail
// =============================================================================

async fn render_show(
    state: &AppState,
    garden: Garden,
    nonce: CspNonce,
    plant: &Plant,
    answer: Option<QuestionAnswer>,
) -> Result<PlantShowTemplate> {
    let bookmarked = garden.session.bookmarks().await.contains(plant.id);
    let path = format!("/plants/{}", plant.id);
    let page = PageContext::load(state, &garden.session, &garden.cookie, nonce, &path).await?;

    Ok(PlantShowTemplate {
        page,
        plant: PlantDetailView {
            card: PlantCardView::new(plant, bookmarked),
            description: plant.description.clone(),
            region: plant.region.clone(),
            plant_type: plant.plant_type.clone(),
            uses: plant.uses.clone(),
        },
        questions: question_buttons(),
        answer: answer.map(AnswerView::from),
    })
}

/// Display a plant's detail page.
#[tracing::instrument(skip(state, garden, nonce))]
pub async fn show(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
    Path(id): Path<PlantId>,
) -> Result<impl IntoResponse> {
    let plant = catalog::plant(state.backend(), id).await?;
    render_show(&state, garden, nonce, &plant, None).await
}

/// Question form data.
#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

/// Ask a canned question and show the answer on the detail page.
#[tracing::instrument(skip(state, garden, nonce))]
pub async fn ask(
    State(state): State<AppState>,
    garden: Garden,
    nonce: CspNonce,
    Path(id): Path<PlantId>,
    Form(form): Form<AskForm>,
) -> Result<impl IntoResponse> {
    let plant = catalog::plant(state.backend(), id).await?;
    let question = PlantQuestion::from_key(&form.question);

    let plant_id = id.to_string();
    add_breadcrumb(
        "questions",
        "Asked about plant",
        Some(&[("plant_id", plant_id.as_str()), ("question", question.key())]),
    );

    let answer = questions::ask(state.backend(), &plant, question).await;
    render_show(&state, garden, nonce, &plant, Some(answer)).await
}

// =============================================================================
// Bookmarks
// =============================================================================

/// Bookmark toggle form data.
#[derive(Debug, Deserialize)]
pub struct BookmarkForm {
    /// Plant name used in messages.
    pub name: Option<String>,
    /// Page to return to.
    pub return_to: Option<String>,
}

/// Toggle a bookmark and return to the originating page with a message.
#[tracing::instrument(skip(state, garden, form))]
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    garden: Garden,
    Path(id): Path<PlantId>,
    Form(form): Form<BookmarkForm>,
) -> Result<Redirect> {
    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(herbal_garden_core::plant::UNKNOWN_PLANT_NAME);
    let fallback = format!("/plants/{id}");
    let return_to = safe_return_path(form.return_to.as_deref(), &fallback).to_string();

    let flash = match bookmarks::toggle(&garden.session, state.backend(), id, name).await {
        Ok(outcome) => {
            let message = outcome.message(name);
            if !garden
                .session
                .apply_toggle(outcome.ticket, outcome.plant, outcome.was_bookmarked)
                .await
            {
                tracing::debug!(plant_id = %id, "Discarded toggle confirmed for a previous user");
            }
            let plant_id = id.to_string();
            add_breadcrumb(
                "bookmarks",
                "Toggled bookmark",
                Some(&[("plant_id", plant_id.as_str())]),
            );
            Flash::info(message)
        }
        Err(failure @ ToggleFailure::SignInRequired) => Flash::info(failure.to_string()),
        Err(failure) => Flash::error(failure.to_string()),
    };
    flash.set(&garden.cookie).await?;

    Ok(Redirect::to(&return_to))
}
