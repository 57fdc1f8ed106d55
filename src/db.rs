use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

use crate::calendar::parse_record_date;

/// Raw material_data row as it appears in import CSVs
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MaterialRow {
    pub date: String,
    pub material_id: String,
    pub material_description: String,
    pub base_unit_of_measure: String,
    pub quantity: f64,
    pub price: f64,

    /// Unrestricted stock on hand at `date` (optional in older exports)
    #[serde(default)]
    pub unrestricted: Option<f64>,
}

impl MaterialRow {
    /// Compute idempotency hash for duplicate detection
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}|{}|{}|{:?}",
            self.date,
            self.material_id,
            self.material_description,
            self.base_unit_of_measure,
            self.quantity,
            self.price,
            self.unrestricted
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Raw breakdown_data row as it appears in import CSVs
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BreakdownRow {
    pub malfunction_start: String,
    pub equipment: String,
}

impl BreakdownRow {
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}", self.malfunction_start, self.equipment));
        format!("{:x}", hasher.finalize())
    }
}

/// Tables a caller may count with `verify_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    MaterialData,
    BreakdownData,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::MaterialData => "material_data",
            Table::BreakdownData => "breakdown_data",
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Material Data (consumption, price and stock snapshots)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS material_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            material_id TEXT NOT NULL,
            material_description TEXT NOT NULL,
            base_unit_of_measure TEXT NOT NULL,
            quantity REAL NOT NULL,
            price REAL NOT NULL,
            unrestricted REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Breakdown Data (one row per malfunction event)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS breakdown_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            malfunction_start TEXT NOT NULL,
            equipment TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_material_id ON material_data(material_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_material_date ON material_data(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_breakdown_equipment ON breakdown_data(equipment)",
        [],
    )?;

    Ok(())
}

pub fn load_material_csv(csv_path: &Path) -> Result<Vec<MaterialRow>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open material CSV: {:?}", csv_path))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: MaterialRow = result.context("Failed to deserialize material row")?;
        rows.push(row);
    }

    debug!(count = rows.len(), path = ?csv_path, "loaded material rows");
    Ok(rows)
}

pub fn load_breakdown_csv(csv_path: &Path) -> Result<Vec<BreakdownRow>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open breakdown CSV: {:?}", csv_path))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: BreakdownRow = result.context("Failed to deserialize breakdown row")?;
        rows.push(row);
    }

    debug!(count = rows.len(), path = ?csv_path, "loaded breakdown rows");
    Ok(rows)
}

/// Import material rows in one transaction; any bad row leaves the store untouched
pub fn insert_material_rows(conn: &Connection, rows: &[MaterialRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    let mut duplicates = 0;

    for raw in rows {
        // Dates are stored as ISO text so the store can group by month
        let date = match parse_record_date(&raw.date) {
            Ok(date) => date.format("%Y-%m-%d").to_string(),
            Err(_) => bail!("material {} has an unparseable date '{}'", raw.material_id, raw.date),
        };
        let row = MaterialRow {
            date,
            ..raw.clone()
        };

        let result = tx.execute(
            "INSERT INTO material_data (
                idempotency_hash, date, material_id, material_description,
                base_unit_of_measure, quantity, price, unrestricted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.compute_idempotency_hash(),
                row.date,
                row.material_id,
                row.material_description,
                row.base_unit_of_measure,
                row.quantity,
                row.price,
                row.unrestricted,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    info!(inserted, duplicates, "material rows imported");
    Ok(inserted)
}

pub fn insert_breakdowns(conn: &Connection, rows: &[BreakdownRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0;
    let mut duplicates = 0;

    for raw in rows {
        let malfunction_start = match parse_record_date(&raw.malfunction_start) {
            Ok(date) => date.format("%Y-%m-%d").to_string(),
            Err(_) => bail!(
                "equipment {} has an unparseable malfunction_start '{}'",
                raw.equipment,
                raw.malfunction_start
            ),
        };
        let row = BreakdownRow {
            malfunction_start,
            equipment: raw.equipment.clone(),
        };

        let result = tx.execute(
            "INSERT INTO breakdown_data (idempotency_hash, malfunction_start, equipment)
             VALUES (?1, ?2, ?3)",
            params![
                row.compute_idempotency_hash(),
                row.malfunction_start,
                row.equipment,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    info!(inserted, duplicates, "breakdown rows imported");
    Ok(inserted)
}

pub fn verify_count(conn: &Connection, table: Table) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Helper function to create test material rows with all required fields
    fn create_test_row(
        date: &str,
        material_id: &str,
        quantity: f64,
        price: f64,
    ) -> MaterialRow {
        MaterialRow {
            date: date.to_string(),
            material_id: material_id.to_string(),
            material_description: format!("{} description", material_id),
            base_unit_of_measure: "kg".to_string(),
            quantity,
            price,
            unrestricted: None,
        }
    }

    #[test]
    fn test_idempotency_import_twice() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let rows = vec![
            create_test_row("2023-01-15", "M1", 10.0, 5.0),
            create_test_row("2023-02-15", "M1", 20.0, 6.0),
            create_test_row("2023-02-20", "M2", 3.0, 1.5),
        ];

        let inserted1 = insert_material_rows(&conn, &rows).unwrap();
        let count1 = verify_count(&conn, Table::MaterialData).unwrap();

        let inserted2 = insert_material_rows(&conn, &rows).unwrap();
        let count2 = verify_count(&conn, Table::MaterialData).unwrap();

        assert_eq!(inserted1, 3, "First import should insert 3 rows");
        assert_eq!(count1, 3);
        assert_eq!(inserted2, 0, "Second import should insert 0 rows (all duplicates)");
        assert_eq!(count2, 3);

        println!("✅ Idempotency test PASSED: 0 duplicates inserted on second import");
    }

    #[test]
    fn test_compute_idempotency_hash() {
        let row = create_test_row("2023-01-15", "M1", 10.0, 5.0);

        let hash1 = row.compute_idempotency_hash();
        let hash2 = row.compute_idempotency_hash();
        let other = create_test_row("2023-01-15", "M1", 11.0, 5.0).compute_idempotency_hash();

        assert_eq!(hash1, hash2, "Same row should produce same hash");
        assert_ne!(hash1, other);
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_rejects_unparseable_dates() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let rows = vec![
            create_test_row("2023-01-15", "M1", 10.0, 5.0),
            create_test_row("last tuesday", "M1", 1.0, 1.0),
        ];
        assert!(insert_material_rows(&conn, &rows).is_err());

        // The good row before the bad one is rolled back with it
        assert_eq!(verify_count(&conn, Table::MaterialData).unwrap(), 0);

        let breakdowns = vec![
            BreakdownRow {
                malfunction_start: "2023-03-01".to_string(),
                equipment: "PUMP-1".to_string(),
            },
            BreakdownRow {
                malfunction_start: "someday".to_string(),
                equipment: "PUMP-1".to_string(),
            },
        ];
        assert!(insert_breakdowns(&conn, &breakdowns).is_err());
        assert_eq!(verify_count(&conn, Table::BreakdownData).unwrap(), 0);
    }

    #[test]
    fn test_stock_snapshots_are_distinct_rows() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let low = MaterialRow {
            unrestricted: Some(5.0),
            ..create_test_row("2023-01-15", "M1", 10.0, 5.0)
        };
        let high = MaterialRow {
            unrestricted: Some(50.0),
            ..low.clone()
        };
        let unknown = MaterialRow {
            unrestricted: None,
            ..low.clone()
        };

        assert_eq!(insert_material_rows(&conn, &[low, high, unknown]).unwrap(), 3);

        let max_stock: f64 = conn
            .query_row("SELECT MAX(unrestricted) FROM material_data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(max_stock, 50.0);
    }

    #[test]
    fn test_breakdown_import() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let rows = vec![
            BreakdownRow {
                malfunction_start: "2023-03-01".to_string(),
                equipment: "PUMP-1".to_string(),
            },
            BreakdownRow {
                malfunction_start: "2023-03-01".to_string(),
                equipment: "PUMP-1".to_string(),
            },
        ];

        assert_eq!(insert_breakdowns(&conn, &rows).unwrap(), 1);
        assert_eq!(verify_count(&conn, Table::BreakdownData).unwrap(), 1);
    }

    #[test]
    fn test_dates_are_normalized_on_insert() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let rows = vec![
            create_test_row("01/15/2023", "M1", 10.0, 5.0),
            create_test_row("2023-01-15", "M1", 10.0, 5.0),
        ];

        // Same row in two date spellings is one row
        assert_eq!(insert_material_rows(&conn, &rows).unwrap(), 1);

        let stored: String = conn
            .query_row("SELECT date FROM material_data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2023-01-15");
    }

    #[test]
    fn test_load_material_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "date,material_id,material_description,base_unit_of_measure,quantity,price,unrestricted"
        )
        .unwrap();
        writeln!(file, "2023-01-15,M1,Steel bolts,EA,10,5.0,40").unwrap();
        writeln!(file, "2023-02-15,M1,Steel bolts,EA,20,6.0,").unwrap();

        let rows = load_material_csv(file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].unrestricted, Some(40.0));
        assert_eq!(rows[1].unrestricted, None);
        assert_eq!(rows[1].price, 6.0);
    }
}
