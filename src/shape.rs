// 🧾 Response Shaper - caller-facing field names and envelopes
//
// Pivot rows serialize flat:
// {"material_id", "year", "quantity_Jan" .. "quantity_Dec", "last_price", "base_unit_of_measure"}

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::averages::AverageSeriesEntry;
use crate::calendar::MONTH_ABBREVIATIONS;
use crate::classify::InventoryClassification;
use crate::error::InsightsError;
use crate::pivot::MonthlyPivotRow;
use crate::records::MaterialCatalogEntry;

/// Field name for a pivot month column
pub fn quantity_field(month: &str) -> String {
    format!("quantity_{}", month)
}

impl Serialize for MonthlyPivotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(16))?;
        map.serialize_entry("material_id", &self.material_id)?;
        map.serialize_entry("year", &self.year)?;
        for (month, quantity) in MONTH_ABBREVIATIONS.iter().zip(self.quantities.iter()) {
            map.serialize_entry(&quantity_field(month), quantity)?;
        }
        map.serialize_entry("last_price", &self.last_price)?;
        map.serialize_entry("base_unit_of_measure", &self.base_unit_of_measure)?;
        map.end()
    }
}

// ============================================================================
// ENVELOPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MaterialDataResponse {
    pub data: Vec<MonthlyPivotRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterialsResponse {
    pub materials: Vec<MaterialCatalogEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyConsumptionResponse {
    pub material_id: String,
    pub monthly_consumption: Vec<AverageSeriesEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyBreakdownsResponse {
    pub equipment: String,
    pub monthly_breakdowns: Vec<AverageSeriesEntry>,
}

pub type InventoryStatusResponse = InventoryClassification;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&InsightsError> for ErrorResponse {
    fn from(err: &InsightsError) -> Self {
        ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}
