// 🏷️ Inventory Classifier - stock vs turnover health buckets
//
// Two independent splits per material:
// - stock:    over-stocked (stock > turnover × cover) / under-stocked (<);
//             exact equality lands in neither
// - turnover: fast-moving (turnover ≥ threshold) / slow-moving (<);
//             always exactly one

use serde::{Deserialize, Serialize};

use crate::records::StockTurnover;

// ============================================================================
// THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    /// Stock is compared against turnover_rate × this multiplier
    pub stock_cover_multiplier: f64,

    /// Minimum turnover_rate counted as fast-moving
    pub fast_moving_rate: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        ClassificationThresholds {
            stock_cover_multiplier: 2.0,
            fast_moving_rate: 2.0,
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub material_id: String,
    pub current_stock: f64,
    pub turnover_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryClassification {
    pub over_stocked: Vec<ClassificationRecord>,
    pub under_stocked: Vec<ClassificationRecord>,
    pub fast_moving: Vec<ClassificationRecord>,
    pub slow_moving: Vec<ClassificationRecord>,
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct InventoryClassifier {
    thresholds: ClassificationThresholds,
}

impl InventoryClassifier {
    pub fn new(thresholds: ClassificationThresholds) -> Self {
        InventoryClassifier { thresholds }
    }

    pub fn thresholds(&self) -> ClassificationThresholds {
        self.thresholds
    }

    /// Classify every material that has a stock figure. Materials without a
    /// turnover figure get a turnover_rate of 0. Output order follows the
    /// stock mapping (material_id ascending).
    pub fn classify(&self, input: &StockTurnover) -> InventoryClassification {
        let mut result = InventoryClassification::default();

        for (material_id, &stock) in &input.stock {
            let turnover_rate = input.turnover.get(material_id).copied().unwrap_or(0.0);
            let record = ClassificationRecord {
                material_id: material_id.clone(),
                current_stock: stock,
                turnover_rate,
            };

            let cover = turnover_rate * self.thresholds.stock_cover_multiplier;
            if stock > cover {
                result.over_stocked.push(record.clone());
            } else if stock < cover {
                result.under_stocked.push(record.clone());
            }

            if turnover_rate >= self.thresholds.fast_moving_rate {
                result.fast_moving.push(record);
            } else {
                result.slow_moving.push(record);
            }
        }

        result
    }
}

// ============================================================================
// TESTS
// ============================================================================
