// 📈 Time-Bucketed Averager
// Month-grouped aggregates → exactly twelve entries, January first,
// zero for every month without data.
//
// Two instantiations of the same reindexing:
// - consumption: average quantity, rounded, labelled "January".."December"
// - breakdowns:  event count, labelled "Jan".."Dec"

use serde::{Deserialize, Serialize};

use crate::calendar::{month_slot, MONTH_ABBREVIATIONS, MONTH_NAMES};
use crate::error::{InsightsError, InsightsResult};
use crate::records::MonthlyBucket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AverageSeriesEntry {
    pub month_name: String,
    pub avg_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthLabels {
    FullNames,
    Abbreviations,
}

impl MonthLabels {
    fn label(self, slot: usize) -> &'static str {
        match self {
            MonthLabels::FullNames => MONTH_NAMES[slot],
            MonthLabels::Abbreviations => MONTH_ABBREVIATIONS[slot],
        }
    }
}

/// Average consumption per month for one material
pub fn consumption_series(buckets: &[MonthlyBucket]) -> InsightsResult<Vec<AverageSeriesEntry>> {
    series(buckets, MonthLabels::FullNames)
}

/// Breakdown count per month for one piece of equipment
pub fn breakdown_series(buckets: &[MonthlyBucket]) -> InsightsResult<Vec<AverageSeriesEntry>> {
    series(buckets, MonthLabels::Abbreviations)
}

/// Reindex buckets onto Jan..Dec. Null aggregates become 0, values round to
/// the nearest integer (half away from zero). A repeated month keeps the
/// last bucket.
pub fn series(buckets: &[MonthlyBucket], labels: MonthLabels) -> InsightsResult<Vec<AverageSeriesEntry>> {
    let mut values = [0.0_f64; 12];

    for bucket in buckets {
        let month = u32::try_from(bucket.month).map_err(|_| {
            InsightsError::Transformation(format!("month {} outside 1..=12", bucket.month))
        })?;
        values[month_slot(month)?] = bucket.value.unwrap_or(0.0);
    }

    Ok(values
        .iter()
        .enumerate()
        .map(|(slot, value)| AverageSeriesEntry {
            month_name: labels.label(slot).to_string(),
            avg_value: value.round() as i64,
        })
        .collect())
}

// ============================================================================
// GROUPING FROM RAW RECORDS
// ============================================================================
