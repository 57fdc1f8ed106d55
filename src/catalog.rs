// 📚 Materials Catalog - distinct (material_id, description) pairs

use std::collections::HashSet;

use crate::error::{InsightsError, InsightsResult};
use crate::records::MaterialCatalogEntry;

/// Drop repeated pairs, keeping first-seen order. An empty catalog is
/// NotFound.
pub fn distinct_materials(entries: Vec<MaterialCatalogEntry>) -> InsightsResult<Vec<MaterialCatalogEntry>> {
    if entries.is_empty() {
        return Err(InsightsError::NotFound("No materials found".to_string()));
    }

    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect())
}
