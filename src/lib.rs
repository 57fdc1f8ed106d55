// Material Insights - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod logging;
pub mod calendar;
pub mod records;
pub mod db;        // Store setup + CSV import
pub mod fetch;     // Record Fetcher
pub mod pivot;     // Monthly Pivot Builder
pub mod averages;  // Time-Bucketed Averager
pub mod classify;  // Inventory Classifier
pub mod catalog;   // Materials Catalog Lister
pub mod shape;     // Response Shaper
pub mod service;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{InsightsError, InsightsResult};
pub use config::AppConfig;
pub use records::{
    BreakdownRecord, ConsumptionRecord, MaterialCatalogEntry, MonthlyBucket, StockTurnover,
};
pub use db::{
    BreakdownRow, MaterialRow, Table,
    setup_database, load_material_csv, load_breakdown_csv,
    insert_material_rows, insert_breakdowns, verify_count,
};
pub use fetch::{RecordFetcher, RecordSource, SqliteFetcher, SqliteStore, MAX_MATERIAL_IDS};
pub use pivot::{build_monthly_pivot, MonthlyPivotRow};
pub use averages::{AverageSeriesEntry, MonthLabels, breakdown_series, consumption_series};
pub use classify::{
    ClassificationRecord, ClassificationThresholds, InventoryClassification, InventoryClassifier,
};
pub use catalog::distinct_materials;
pub use shape::{
    ErrorResponse, InventoryStatusResponse, MaterialDataResponse, MaterialsResponse,
    MonthlyBreakdownsResponse, MonthlyConsumptionResponse,
};
pub use service::{parse_material_ids, InsightsService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
