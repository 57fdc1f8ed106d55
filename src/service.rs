// 🧭 Insights Service - one call per request
// validate → connect → fetch → NotFound check → transform
//
// The fetcher (and its connection) lives only inside each method and is
// dropped on every exit path, including transformation failures.

use tracing::{debug, info, warn};

use crate::averages::{breakdown_series, consumption_series};
use crate::catalog::distinct_materials;
use crate::classify::{InventoryClassification, InventoryClassifier};
use crate::error::{InsightsError, InsightsResult};
use crate::fetch::{RecordFetcher, RecordSource, MAX_MATERIAL_IDS};
use crate::pivot::build_monthly_pivot;
use crate::shape::{
    MaterialDataResponse, MaterialsResponse, MonthlyBreakdownsResponse,
    MonthlyConsumptionResponse,
};

/// Split a comma-separated id list, trimming blanks and keeping the first
/// `MAX_MATERIAL_IDS`. An empty result is a validation error.
pub fn parse_material_ids(raw: Option<&str>) -> InsightsResult<Vec<String>> {
    let ids: Vec<String> = raw
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .take(MAX_MATERIAL_IDS)
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(InsightsError::Validation(
            "No material IDs provided".to_string(),
        ));
    }

    Ok(ids)
}

fn require_key(value: &str, name: &str) -> InsightsResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InsightsError::Validation(format!("No {} provided", name)));
    }
    Ok(trimmed.to_string())
}

pub struct InsightsService<S: RecordSource> {
    source: S,
    classifier: InventoryClassifier,
}

impl<S: RecordSource> InsightsService<S> {
    pub fn new(source: S) -> Self {
        Self::with_classifier(source, InventoryClassifier::default())
    }

    pub fn with_classifier(source: S, classifier: InventoryClassifier) -> Self {
        InsightsService { source, classifier }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// GET /materials
    pub fn materials(&self) -> InsightsResult<MaterialsResponse> {
        let fetcher = self.source.connect()?;
        let entries = fetcher.fetch_distinct_materials()?;
        let materials = distinct_materials(entries)?;

        debug!(count = materials.len(), "listed materials");
        Ok(MaterialsResponse { materials })
    }

    /// GET /materials/data?material_ids=...
    pub fn material_data(&self, raw_ids: Option<&str>) -> InsightsResult<MaterialDataResponse> {
        let ids = parse_material_ids(raw_ids)?;

        let fetcher = self.source.connect()?;
        let records = fetcher.fetch_consumption(&ids)?;
        if records.is_empty() {
            warn!(ids = ?ids, "no consumption rows");
            return Err(InsightsError::NotFound(
                "No data found for given material IDs".to_string(),
            ));
        }

        let data = build_monthly_pivot(&records);
        info!(ids = ?ids, records = records.len(), rows = data.len(), "built monthly pivot");
        Ok(MaterialDataResponse { data })
    }

    pub fn monthly_consumption(&self, material_id: &str) -> InsightsResult<MonthlyConsumptionResponse> {
        let material_id = require_key(material_id, "material ID")?;

        let fetcher = self.source.connect()?;
        let buckets = fetcher.fetch_monthly_consumption(&material_id)?;
        if buckets.is_empty() {
            return Err(InsightsError::NotFound(format!(
                "No consumption data found for material {}",
                material_id
            )));
        }

        let monthly_consumption = consumption_series(&buckets)?;
        debug!(material_id = %material_id, months = buckets.len(), "averaged consumption");
        Ok(MonthlyConsumptionResponse {
            material_id,
            monthly_consumption,
        })
    }

    pub fn monthly_breakdowns(&self, equipment: &str) -> InsightsResult<MonthlyBreakdownsResponse> {
        let equipment = require_key(equipment, "equipment")?;

        let fetcher = self.source.connect()?;
        let buckets = fetcher.fetch_monthly_breakdowns(&equipment)?;
        if buckets.is_empty() {
            return Err(InsightsError::NotFound(format!(
                "No breakdowns found for equipment {}",
                equipment
            )));
        }

        let monthly_breakdowns = breakdown_series(&buckets)?;
        debug!(equipment = %equipment, months = buckets.len(), "counted breakdowns");
        Ok(MonthlyBreakdownsResponse {
            equipment,
            monthly_breakdowns,
        })
    }

    pub fn inventory_status(&self) -> InsightsResult<InventoryClassification> {
        let fetcher = self.source.connect()?;
        let snapshot = fetcher.fetch_stock_and_turnover()?;
        if snapshot.stock.is_empty() {
            return Err(InsightsError::NotFound(
                "No stock data found".to_string(),
            ));
        }

        let result = self.classifier.classify(&snapshot);
        info!(
            over = result.over_stocked.len(),
            under = result.under_stocked.len(),
            fast = result.fast_moving.len(),
            slow = result.slow_moving.len(),
            "classified inventory"
        );
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================
