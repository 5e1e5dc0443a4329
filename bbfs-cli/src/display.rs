use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use bbfs_db::models::{parse_result, DrawRecord};

pub fn display_records(records: &[DrawRecord]) {
    if records.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Jour", "Résultat"]);

    for record in records {
        let result = if parse_result(&record.result).is_some() {
            Cell::new(&record.result)
        } else {
            Cell::new(&record.result).fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(record.date.format("%d/%m/%Y")),
            Cell::new(record.weekday),
            result,
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.malformed > 0 {
        println!("  Résultats invalides : {}", result.malformed);
    }
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}
