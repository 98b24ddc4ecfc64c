//! Canned AI questions offered on a plant's detail page.

use core::fmt;
use core::str::FromStr;

use crate::plant::Plant;

/// Shown when a plant has no common name to ask about.
pub const NAME_UNAVAILABLE_MESSAGE: &str = "Plant name not available. Cannot ask AI.";

/// A question about one plant, answered by the chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlantQuestion {
    Combinations,
    Allergies,
    AllergenicMixtures,
    /// Anything unrecognised falls back to a general question.
    General,
}

impl PlantQuestion {
    /// The questions offered as buttons, in display order.
    pub const OFFERED: [Self; 3] = [Self::Combinations, Self::Allergies, Self::AllergenicMixtures];

    /// Form value identifying the question.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Combinations => "combinations",
            Self::Allergies => "allergies",
            Self::AllergenicMixtures => "allergenic_mixtures",
            Self::General => "general",
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Combinations => "Combinations & Usage",
            Self::Allergies => "Allergies",
            Self::AllergenicMixtures => "Allergenic Mixtures",
            Self::General => "Tell me more",
        }
    }

    /// Parse a form value; unknown values mean [`PlantQuestion::General`].
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "combinations" => Self::Combinations,
            "allergies" => Self::Allergies,
            "allergenic_mixtures" => Self::AllergenicMixtures,
            _ => Self::General,
        }
    }

    /// Message sent to the chat endpoint, or `None` when the plant has no
    /// common name.
    #[must_use]
    pub fn prompt_for(self, plant: &Plant) -> Option<String> {
        let name = plant.common_name.trim();
        (!name.is_empty()).then(|| self.prompt(name))
    }

    /// Message sent to the chat endpoint for a plant called `name`.
    #[must_use]
    pub fn prompt(self, name: &str) -> String {
        match self {
            Self::Combinations => format!(
                "For the plant \"{name}\", explain its common uses when combined with other herbs \
                 or ingredients. Provide examples of beneficial combinations and their \
                 traditional/medicinal purposes."
            ),
            Self::Allergies => format!(
                "For the plant \"{name}\", list known allergens, common allergic reactions, and \
                 who might be particularly susceptible to allergies from it."
            ),
            Self::AllergenicMixtures => format!(
                "For the plant \"{name}\", describe any known mixtures or combinations with other \
                 substances (plants, drugs, chemicals) that could potentially cause or worsen \
                 allergic reactions. Be specific if possible."
            ),
            Self::General => {
                format!("Tell me more about the medicinal uses and properties of \"{name}\".")
            }
        }
    }
}

impl FromStr for PlantQuestion {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

impl fmt::Display for PlantQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
