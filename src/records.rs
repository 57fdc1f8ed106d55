// 📦 Typed records decoded at the fetch boundary
// Nothing past the fetcher sees an untyped row.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// One consumption/purchase row for a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub date: NaiveDate,
    pub material_id: String,
    pub unit: String,
    pub quantity: f64,
    pub price: f64,
}

impl ConsumptionRecord {
    pub fn new(date: NaiveDate, material_id: &str, unit: &str, quantity: f64, price: f64) -> Self {
        ConsumptionRecord {
            date,
            material_id: material_id.to_string(),
            unit: unit.to_string(),
            quantity,
            price,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// 1-based month
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// One breakdown event for a piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRecord {
    pub malfunction_start: NaiveDate,
    pub equipment: String,
}

/// A month-grouped aggregate as returned by the store, before reindexing.
/// `value` is None when the store aggregated only nulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyBucket {
    pub month: i64,
    pub value: Option<f64>,
}

impl MonthlyBucket {
    pub fn new(month: i64, value: Option<f64>) -> Self {
        MonthlyBucket { month, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialCatalogEntry {
    pub material_id: String,
    pub material_description: String,
}

/// Per-material inputs of the inventory classifier, keyed by material_id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockTurnover {
    /// All-time average consumption quantity
    pub turnover: BTreeMap<String, f64>,
    /// Highest observed unrestricted stock
    pub stock: BTreeMap<String, f64>,
}
