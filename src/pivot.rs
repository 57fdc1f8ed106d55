// 📊 Monthly Pivot Builder
// Consumption rows → one row per (material_id, year) with twelve month
// quantities, the material's latest price and its unit of measure.
//
// Three derived tables, joined on material_id:
// 1. quantities: (material_id, year) → [Jan..Dec] sums, absent months = 0
// 2. latest price: material_id → price of the chronologically last record
//    across ALL years, broadcast to every year row of that material
// 3. unit: material_id → unit of the first record seen

use std::collections::{BTreeMap, HashMap};

use crate::calendar::MONTH_ABBREVIATIONS;
use crate::records::ConsumptionRecord;

// ============================================================================
// PIVOT ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPivotRow {
    pub material_id: String,
    pub year: i32,

    /// Summed quantity per month, index 0 = January
    pub quantities: [f64; 12],

    /// None only when the price join found no match
    pub last_price: Option<f64>,

    /// None only when the unit join found no match
    pub base_unit_of_measure: Option<String>,
}

impl MonthlyPivotRow {
    /// Quantity for a three-letter month label ("Jan".."Dec")
    pub fn quantity(&self, month: &str) -> Option<f64> {
        MONTH_ABBREVIATIONS
            .iter()
            .position(|m| *m == month)
            .map(|slot| self.quantities[slot])
    }

    pub fn total_quantity(&self) -> f64 {
        self.quantities.iter().sum()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Build the pivot. Rows come out ordered by (material_id, year) so the same
/// input always yields the same output.
pub fn build_monthly_pivot(records: &[ConsumptionRecord]) -> Vec<MonthlyPivotRow> {
    let quantities = sum_quantities(records);
    let prices = latest_prices(records);
    let units = first_units(records);

    quantities
        .into_iter()
        .map(|((material_id, year), quantities)| MonthlyPivotRow {
            last_price: prices.get(&material_id).copied(),
            base_unit_of_measure: units.get(&material_id).cloned(),
            material_id,
            year,
            quantities,
        })
        .collect()
}

fn sum_quantities(records: &[ConsumptionRecord]) -> BTreeMap<(String, i32), [f64; 12]> {
    let mut grouped: BTreeMap<(String, i32), [f64; 12]> = BTreeMap::new();

    for record in records {
        let slot = record.month() as usize - 1;
        let months = grouped
            .entry((record.material_id.clone(), record.year()))
            .or_insert([0.0; 12]);
        months[slot] += record.quantity;
    }

    grouped
}

/// Latest price per material. The sort is stable, so among records sharing
/// a (year, month) the one appearing later in the input wins.
fn latest_prices(records: &[ConsumptionRecord]) -> HashMap<String, f64> {
    let mut ordered: Vec<&ConsumptionRecord> = records.iter().collect();
    ordered.sort_by_key(|r| (r.year(), r.month()));

    let mut prices = HashMap::new();
    for record in ordered {
        prices.insert(record.material_id.clone(), record.price);
    }

    prices
}

/// First-wins unit per material; consistency across records is not checked
fn first_units(records: &[ConsumptionRecord]) -> HashMap<String, String> {
    let mut units = HashMap::new();

    for record in records {
        units
            .entry(record.material_id.clone())
            .or_insert_with(|| record.unit.clone());
    }

    units
}

// ============================================================================
// TESTS
// ============================================================================
