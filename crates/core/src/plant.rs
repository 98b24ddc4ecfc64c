//! Plant records.

use serde::{Deserialize, Serialize};

use crate::types::PlantId;

/// Name shown when a plant has neither a common nor a scientific name.
pub const UNKNOWN_PLANT_NAME: &str = "Unknown Plant";

/// A medicinal plant as served by the backend.
///
/// Snapshots are immutable and never cached across navigations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub description: Option<String>,
    /// Use tags; an absent list is stored as empty.
    pub uses: Vec<String>,
    pub region: Option<String>,
    pub plant_type: Option<String>,
    pub image_url: Option<String>,
}

impl Plant {
    /// Name to show for the plant: common name, then scientific name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [Some(self.common_name.as_str()), self.scientific_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_PLANT_NAME)
    }

    /// Use tags joined for display, or `None` when there are none.
    #[must_use]
    pub fn uses_line(&self) -> Option<String> {
        (!self.uses.is_empty()).then(|| self.uses.join(", "))
    }
}

#[cfg(test)]
pub(crate) fn sample(id: i32, name: &str) -> Plant {
    Plant {
        id: PlantId::new(id),
        common_name: name.to_string(),
        scientific_name: None,
        description: None,
        uses: Vec::new(),
        region: None,
        plant_type: None,
        image_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_common_name() {
        let mut plant = sample(1, "Neem");
        plant.scientific_name = Some("Azadirachta indica".to_string());
        assert_eq!(plant.display_name(), "Neem");
    }

    #[test]
    fn test_display_name_falls_back() {
        let mut plant = sample(1, "  ");
        plant.scientific_name = Some("Azadirachta indica".to_string());
        assert_eq!(plant.display_name(), "Azadirachta indica");

        plant.scientific_name = None;
        assert_eq!(plant.display_name(), UNKNOWN_PLANT_NAME);
    }

    #[test]
    fn test_uses_line() {
        let mut plant = sample(2, "Tulsi");
        assert_eq!(plant.uses_line(), None);
        plant.uses = vec!["cough".to_string(), "fever".to_string()];
        assert_eq!(plant.uses_line().as_deref(), Some("cough, fever"));
    }
}
