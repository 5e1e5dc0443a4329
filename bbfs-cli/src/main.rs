mod display;
mod import;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bbfs_db::db::{count_records, db_path, fetch_last_records, insert_record, migrate, open_db};
use bbfs_db::models::{format_digits, validate_result, DrawRecord, Weekday};
use bbfs_db::rusqlite::Connection;
use crate::display::{display_import_summary, display_records};

#[derive(Parser)]
#[command(name = "bbfs-cli", about = "Gestion de l'historique des tirages 4D")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV (date;jour;résultat)
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long)]
        file: PathBuf,

        /// Séparateur de colonnes
        #[arg(short, long, default_value = ";")]
        delimiter: char,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Ajouter un tirage manuellement
    Add,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file, delimiter } => cmd_import(&conn, &file, delimiter),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Add => cmd_add(&conn),
    }
}

fn cmd_import(conn: &Connection, file: &PathBuf, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() {
        anyhow::bail!("Séparateur non ASCII: '{}'", delimiter);
    }
    let result = import::import_csv(conn, file, delimiter as u8)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_records(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : bbfs-cli import");
        return Ok(());
    }
    let records = fetch_last_records(conn, last)?;
    display_records(&records);
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let date = loop {
        let raw = prompt("Date (JJ/MM/AAAA) : ")?;
        match import::parse_date(&raw) {
            Ok(date) => break date,
            Err(e) => println!("{}. Réessayez.", e),
        }
    };

    let day = prompt("Jour (ex: senin, vide = d'après la date) : ")?;
    let weekday = Weekday::standardize(&day, date);

    let digits = loop {
        let raw = prompt("Résultat (4 chiffres) : ")?;
        match validate_result(&raw) {
            Ok(digits) => break digits,
            Err(e) => println!("{}. Réessayez.", e),
        }
    };

    let record = DrawRecord::new(date, weekday, format_digits(&digits));

    println!("\nTirage à insérer :");
    display_records(std::slice::from_ref(&record));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_record(conn, &record)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}
