use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use bbfs_db::db::insert_record;
use bbfs_db::models::{parse_result, DrawRecord, Weekday};
use bbfs_db::rusqlite::Connection;

const DATE_FORMATS: [&str; 3] = ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    bail!("Format de date invalide: '{}'", raw)
}

/// Colonnes attendues : `date;jour;résultat` ou `date;résultat`.
/// Un jour vide ou inconnu est déduit de la date.
fn parse_record(record: &csv::StringRecord) -> Result<DrawRecord> {
    let get = |idx: usize| -> Result<String> {
        record
            .get(idx)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };

    let date = parse_date(&get(0)?)?;
    let (day, result) = match record.len() {
        0..=1 => bail!("Ligne incomplète ({} champ)", record.len()),
        2 => (String::new(), get(1)?),
        _ => (get(1)?, get(2)?),
    };

    Ok(DrawRecord::new(date, Weekday::standardize(&day, date), result))
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    /// Insérés, mais résultat différent de 4 chiffres : ignorés par le moteur.
    pub malformed: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path, delimiter: u8) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;

        let record = match record_result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", line, e);
                result.errors += 1;
                continue;
            }
        };

        let draw = match parse_record(&record) {
            Ok(draw) => draw,
            Err(e) => {
                log::warn!("Erreur parsing ligne {}: {}", line, e);
                result.errors += 1;
                continue;
            }
        };

        if parse_result(&draw.result).is_none() {
            log::warn!("Ligne {} : résultat '{}' invalide, conservé tel quel", line, draw.result);
            result.malformed += 1;
        }

        match insert_record(&tx, &draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                log::warn!("Erreur insertion ligne {}: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "Import {:?} : {} insérés, {} doublons, {} erreurs",
        path,
        result.inserted,
        result.skipped,
        result.errors
    );
    Ok(result)
}
