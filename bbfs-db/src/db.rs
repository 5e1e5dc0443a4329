use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::{DrawRecord, Weekday};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    date     TEXT NOT NULL,
    weekday  TEXT NOT NULL,
    result   TEXT NOT NULL,
    PRIMARY KEY (date, result)
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("bbfs.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

/// Retourne `false` si le couple (date, résultat) existe déjà.
pub fn insert_record(conn: &Connection, record: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (date, weekday, result) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            record.date.format("%Y-%m-%d").to_string(),
            record.weekday.name(),
            record.result,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DrawRecord> {
    let raw_date: String = row.get(0)?;
    let weekday: String = row.get(1)?;
    let result: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DrawRecord {
        date,
        weekday: Weekday::standardize(&weekday, date),
        result,
    })
}

/// Tous les tirages, du plus ancien au plus récent.
pub fn fetch_all_records(conn: &Connection) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, weekday, result FROM draws ORDER BY date ASC, rowid ASC"
    )?;
    let records = stmt.query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Les `limit` derniers tirages, du plus récent au plus ancien.
pub fn fetch_last_records(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, weekday, result FROM draws ORDER BY date DESC, rowid DESC LIMIT ?1"
    )?;
    let records = stmt.query_map([limit], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

pub fn count_records(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
