use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::{Path, PathBuf};

use material_insights::{
    insert_breakdowns, insert_material_rows, load_breakdown_csv, load_material_csv, logging,
    setup_database, verify_count, AppConfig, InsightsService, SqliteStore, Table,
};

const USAGE: &str = "usage:
  material-insights import-materials <csv> [db]
  material-insights import-breakdowns <csv> [db]
  material-insights report <material_ids> [db]";

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env();

    let command = args.get(1).map(String::as_str);
    let target = args.get(2);
    let db_path = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.database_path.clone());

    match (command, target) {
        (Some("import-materials"), Some(csv)) => run_import_materials(Path::new(csv), &db_path),
        (Some("import-breakdowns"), Some(csv)) => run_import_breakdowns(Path::new(csv), &db_path),
        (Some("report"), Some(ids)) => run_report(ids, &db_path),
        _ => {
            eprintln!("{}", USAGE);
            bail!("missing or unknown command");
        }
    }
}

fn run_import_materials(csv_path: &Path, db_path: &Path) -> Result<()> {
    println!("🗄️  Material import - CSV → SQLite + WAL");

    let rows = load_material_csv(csv_path)?;
    println!("✓ Loaded {} rows from CSV", rows.len());

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;

    let inserted = insert_material_rows(&conn, &rows)?;
    let count = verify_count(&conn, Table::MaterialData)?;

    println!("✓ Inserted: {} rows", inserted);
    println!("✓ Skipped duplicates: {}", rows.len() - inserted);
    println!("✓ Database contains {} material rows", count);

    Ok(())
}

fn run_import_breakdowns(csv_path: &Path, db_path: &Path) -> Result<()> {
    println!("🗄️  Breakdown import - CSV → SQLite + WAL");

    let rows = load_breakdown_csv(csv_path)?;
    println!("✓ Loaded {} rows from CSV", rows.len());

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;

    let inserted = insert_breakdowns(&conn, &rows)?;
    let count = verify_count(&conn, Table::BreakdownData)?;

    println!("✓ Inserted: {} rows", inserted);
    println!("✓ Skipped duplicates: {}", rows.len() - inserted);
    println!("✓ Database contains {} breakdown rows", count);

    Ok(())
}

fn run_report(material_ids: &str, db_path: &Path) -> Result<()> {
    let service = InsightsService::new(SqliteStore::new(db_path));

    let response = service
        .material_data(Some(material_ids))
        .with_context(|| format!("Failed to build report for {}", material_ids))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
