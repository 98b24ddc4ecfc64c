//! Plant listing and detail commands.

use std::io::Write;

use herbal_garden_core::catalog::NO_MATCHES_MESSAGE;
use herbal_garden_core::{Plant, PlantId, SearchTerm};
use herbal_garden_web::backend::BackendClient;

use super::CommandError;

/// One line per plant: id, name, scientific name and uses.
pub fn write_row(out: &mut impl Write, plant: &Plant) -> std::io::Result<()> {
    write!(out, "{:>5}  {}", plant.id, plant.display_name())?;
    if let Some(scientific) = plant.scientific_name.as_deref().filter(|s| !s.is_empty()) {
        write!(out, " ({scientific})")?;
    }
    if let Some(uses) = plant.uses_line() {
        write!(out, ": {uses}")?;
    }
    writeln!(out)
}

/// List plants, optionally filtered by `query`.
pub async fn list(
    backend: &BackendClient,
    query: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let term = SearchTerm::new(query.unwrap_or_default());
    let plants = backend.list_plants(term.as_query()).await?;
    tracing::debug!(count = plants.len(), term = %term, "Fetched plants");

    if plants.is_empty() {
        writeln!(out, "{NO_MATCHES_MESSAGE}")?;
    }
    for plant in &plants {
        write_row(out, plant)?;
    }
    Ok(())
}

/// Show every field of one plant.
pub async fn show(
    backend: &BackendClient,
    id: PlantId,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let plant = backend.get_plant(id).await?;

    writeln!(out, "{}", plant.display_name())?;
    let fields = [
        ("Scientific name", plant.scientific_name.as_deref()),
        ("Region", plant.region.as_deref()),
        ("Type", plant.plant_type.as_deref()),
        ("Image", plant.image_url.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            writeln!(out, "  {label}: {value}")?;
        }
    }
    if let Some(uses) = plant.uses_line() {
        writeln!(out, "  Uses: {uses}")?;
    }
    if let Some(description) = plant.description.as_deref() {
        writeln!(out, "\n{description}")?;
    }
    Ok(())
}
