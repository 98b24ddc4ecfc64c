//! Canned AI questions about one plant.
//!
//! Answers are rendered on the plant page and do not enter the chat
//! transcript.

use herbal_garden_core::questions::NAME_UNAVAILABLE_MESSAGE;
use herbal_garden_core::{Plant, PlantQuestion};

use crate::backend::BackendClient;

/// Result of asking a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionAnswer {
    /// Markdown reply from the assistant.
    Answered {
        question: PlantQuestion,
        markdown: String,
    },
    /// Message explaining why there is no reply.
    Failed {
        question: PlantQuestion,
        message: String,
    },
}

impl QuestionAnswer {
    #[must_use]
    pub const fn question(&self) -> PlantQuestion {
        match self {
            Self::Answered { question, .. } | Self::Failed { question, .. } => *question,
        }
    }
}

/// Ask `question` about `plant`.
pub async fn ask(backend: &BackendClient, plant: &Plant, question: PlantQuestion) -> QuestionAnswer {
    let Some(prompt) = question.prompt_for(plant) else {
        return QuestionAnswer::Failed {
            question,
            message: NAME_UNAVAILABLE_MESSAGE.to_string(),
        };
    };

    match backend.chat(&prompt).await {
        Ok(markdown) => QuestionAnswer::Answered { question, markdown },
        Err(error) => {
            tracing::warn!(plant_id = %plant.id, error = %error, "AI question failed");
            QuestionAnswer::Failed {
                question,
                message: format!("Failed to get AI response: {}", error.detail_or_message()),
            }
        }
    }
}
