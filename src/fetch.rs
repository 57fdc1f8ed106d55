// 🔌 Record Fetcher - parameterized queries against the store
// Rows are decoded into typed records right here; a row that does not
// decode is a TransformationError, never a defaulted value.

use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::calendar::parse_record_date;
use crate::error::{InsightsError, InsightsResult};
use crate::records::{ConsumptionRecord, MaterialCatalogEntry, MonthlyBucket, StockTurnover};

/// Upper bound on material ids per consumption query
pub const MAX_MATERIAL_IDS: usize = 4;

// ============================================================================
// CONTRACTS
// ============================================================================

/// Queries the core needs from the store. Rows come back in no
/// guaranteed order; empty results are returned as empty, the caller
/// decides whether that is NotFound.
pub trait RecordFetcher {
    fn fetch_consumption(&self, material_ids: &[String]) -> InsightsResult<Vec<ConsumptionRecord>>;

    fn fetch_stock_and_turnover(&self) -> InsightsResult<StockTurnover>;

    /// (month, average quantity) for one material
    fn fetch_monthly_consumption(&self, material_id: &str) -> InsightsResult<Vec<MonthlyBucket>>;

    /// (month, breakdown count) for one piece of equipment
    fn fetch_monthly_breakdowns(&self, equipment: &str) -> InsightsResult<Vec<MonthlyBucket>>;

    fn fetch_distinct_materials(&self) -> InsightsResult<Vec<MaterialCatalogEntry>>;
}

/// Hands out one fetcher per request. The fetcher owns its connection,
/// which is released when it is dropped.
pub trait RecordSource {
    type Fetcher: RecordFetcher;

    fn connect(&self) -> InsightsResult<Self::Fetcher>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for SqliteStore {
    type Fetcher = SqliteFetcher;

    fn connect(&self) -> InsightsResult<SqliteFetcher> {
        // No CREATE flag: a missing database is unavailable, not empty
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            warn!(path = ?self.path, error = %e, "database connection failed");
            InsightsError::ConnectionFailure(e.to_string())
        })?;

        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| InsightsError::ConnectionFailure(e.to_string()))?;

        Ok(SqliteFetcher::new(conn))
    }
}

pub struct SqliteFetcher {
    conn: Connection,
}

impl SqliteFetcher {
    pub fn new(conn: Connection) -> Self {
        SqliteFetcher { conn }
    }

    fn monthly_buckets(&self, sql: &str, key: &str) -> InsightsResult<Vec<MonthlyBucket>> {
        let mut stmt = self.conn.prepare(sql)?;

        let rows = stmt
            .query_map(params![key], |row| {
                let month: Option<i64> = row.get(0)?;
                let value: Option<f64> = row.get(1)?;
                Ok((month, value))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(month, value)| match month {
                Some(month) => Ok(MonthlyBucket::new(month, value)),
                None => Err(InsightsError::Transformation(format!(
                    "rows for '{}' carry dates the store cannot bucket by month",
                    key
                ))),
            })
            .collect()
    }
}

impl RecordFetcher for SqliteFetcher {
    fn fetch_consumption(&self, material_ids: &[String]) -> InsightsResult<Vec<ConsumptionRecord>> {
        if material_ids.is_empty() {
            return Err(InsightsError::Query(
                "material id filter must not be empty".to_string(),
            ));
        }

        let placeholders = vec!["?"; material_ids.len()].join(", ");
        let sql = format!(
            "SELECT date, material_id, base_unit_of_measure, quantity, price
             FROM material_data
             WHERE material_id IN ({})",
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(material_ids.iter()), |row| {
                let date: String = row.get(0)?;
                let material_id: String = row.get(1)?;
                let unit: String = row.get(2)?;
                let quantity: f64 = row.get(3)?;
                let price: f64 = row.get(4)?;
                Ok((date, material_id, unit, quantity, price))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(ids = ?material_ids, rows = rows.len(), "fetched consumption rows");

        rows.into_iter()
            .map(|(date, material_id, unit, quantity, price)| {
                Ok(ConsumptionRecord {
                    date: parse_record_date(&date)?,
                    material_id,
                    unit,
                    quantity,
                    price,
                })
            })
            .collect()
    }

    fn fetch_stock_and_turnover(&self) -> InsightsResult<StockTurnover> {
        let mut stmt = self.conn.prepare(
            "SELECT material_id, AVG(quantity)
             FROM material_data
             GROUP BY material_id
             ORDER BY material_id",
        )?;
        let turnover: BTreeMap<String, f64> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<Result<_, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT material_id, MAX(unrestricted)
             FROM material_data
             WHERE unrestricted IS NOT NULL
             GROUP BY material_id
             ORDER BY material_id",
        )?;
        let stock: BTreeMap<String, f64> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<Result<_, _>>()?;

        debug!(
            turnover = turnover.len(),
            stock = stock.len(),
            "fetched stock and turnover"
        );

        Ok(StockTurnover { turnover, stock })
    }

    fn fetch_monthly_consumption(&self, material_id: &str) -> InsightsResult<Vec<MonthlyBucket>> {
        self.monthly_buckets(
            "SELECT CAST(strftime('%m', date) AS INTEGER) AS month, AVG(quantity)
             FROM material_data
             WHERE material_id = ?1
             GROUP BY month
             ORDER BY month",
            material_id,
        )
    }

    fn fetch_monthly_breakdowns(&self, equipment: &str) -> InsightsResult<Vec<MonthlyBucket>> {
        self.monthly_buckets(
            "SELECT CAST(strftime('%m', malfunction_start) AS INTEGER) AS month,
                    CAST(COUNT(*) AS REAL)
             FROM breakdown_data
             WHERE equipment = ?1
             GROUP BY month
             ORDER BY month",
            equipment,
        )
    }

    fn fetch_distinct_materials(&self) -> InsightsResult<Vec<MaterialCatalogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT material_id, material_description
             FROM material_data
             ORDER BY material_id",
        )?;

        let materials = stmt
            .query_map([], |row| {
                Ok(MaterialCatalogEntry {
                    material_id: row.get(0)?,
                    material_description: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_breakdowns, insert_material_rows, setup_database, BreakdownRow, MaterialRow};

    fn material(date: &str, id: &str, quantity: f64, price: f64, stock: Option<f64>) -> MaterialRow {
        MaterialRow {
            date: date.to_string(),
            material_id: id.to_string(),
            material_description: format!("{} description", id),
            base_unit_of_measure: "kg".to_string(),
            quantity,
            price,
            unrestricted: stock,
        }
    }

    fn seeded_fetcher() -> SqliteFetcher {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        insert_material_rows(
            &conn,
            &[
                material("2023-01-10", "M1", 10.0, 5.0, Some(30.0)),
                material("2023-01-20", "M1", 20.0, 5.5, Some(12.0)),
                material("2023-03-05", "M1", 6.0, 6.0, None),
                material("2023-02-01", "M2", 1.0, 2.0, Some(4.0)),
                material("2023-02-01", "M3", 1.0, 2.0, None),
            ],
        )
        .unwrap();

        insert_breakdowns(
            &conn,
            &[
                BreakdownRow {
                    malfunction_start: "2023-07-01".to_string(),
                    equipment: "PUMP-1".to_string(),
                },
                BreakdownRow {
                    malfunction_start: "2023-07-19".to_string(),
                    equipment: "PUMP-1".to_string(),
                },
                BreakdownRow {
                    malfunction_start: "2023-03-02".to_string(),
                    equipment: "PUMP-1".to_string(),
                },
            ],
        )
        .unwrap();

        SqliteFetcher::new(conn)
    }

    #[test]
    fn test_fetch_consumption_filters_by_ids() {
        let fetcher = seeded_fetcher();

        let records = fetcher
            .fetch_consumption(&["M1".to_string(), "M2".to_string()])
            .unwrap();

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.material_id != "M3"));
        assert!(records.iter().any(|r| r.date.to_string() == "2023-03-05"));
    }

    #[test]
    fn test_empty_id_filter_is_query_error() {
        let fetcher = seeded_fetcher();
        let err = fetcher.fetch_consumption(&[]).unwrap_err();
        assert!(matches!(err, InsightsError::Query(_)));
    }

    #[test]
    fn test_unparseable_stored_date_is_transformation_error() {
        let fetcher = seeded_fetcher();
        fetcher
            .conn
            .execute(
                "INSERT INTO material_data (idempotency_hash, date, material_id,
                    material_description, base_unit_of_measure, quantity, price)
                 VALUES ('bad', 'someday', 'M9', 'broken', 'kg', 1, 1)",
                [],
            )
            .unwrap();

        let err = fetcher.fetch_consumption(&["M9".to_string()]).unwrap_err();
        assert!(matches!(err, InsightsError::Transformation(_)));

        let err = fetcher.fetch_monthly_consumption("M9").unwrap_err();
        assert!(matches!(err, InsightsError::Transformation(_)));
    }

    #[test]
    fn test_stock_and_turnover() {
        let fetcher = seeded_fetcher();
        let snapshot = fetcher.fetch_stock_and_turnover().unwrap();

        assert_eq!(snapshot.turnover.get("M1"), Some(&12.0));
        assert_eq!(snapshot.turnover.len(), 3);
        // Max stock, not latest
        assert_eq!(snapshot.stock.get("M1"), Some(&30.0));
        assert_eq!(snapshot.stock.get("M2"), Some(&4.0));
        assert!(!snapshot.stock.contains_key("M3"));
    }

    #[test]
    fn test_monthly_buckets() {
        let fetcher = seeded_fetcher();

        let consumption = fetcher.fetch_monthly_consumption("M1").unwrap();
        assert_eq!(
            consumption,
            vec![
                MonthlyBucket::new(1, Some(15.0)),
                MonthlyBucket::new(3, Some(6.0)),
            ]
        );

        let breakdowns = fetcher.fetch_monthly_breakdowns("PUMP-1").unwrap();
        assert_eq!(
            breakdowns,
            vec![
                MonthlyBucket::new(3, Some(1.0)),
                MonthlyBucket::new(7, Some(2.0)),
            ]
        );

        assert!(fetcher.fetch_monthly_breakdowns("FAN-9").unwrap().is_empty());
    }

    #[test]
    fn test_distinct_materials() {
        let fetcher = seeded_fetcher();
        let materials = fetcher.fetch_distinct_materials().unwrap();

        let ids: Vec<&str> = materials.iter().map(|m| m.material_id.as_str()).collect();
        assert_eq!(ids, vec!["M1", "M2", "M3"]);
    }

    #[test]
    fn test_missing_database_is_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("absent.db"));

        match store.connect() {
            Err(InsightsError::ConnectionFailure(_)) => {}
            Err(other) => panic!("expected ConnectionFailure, got {:?}", other),
            Ok(_) => panic!("expected ConnectionFailure, got a connection"),
        }
    }
}
