use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use bbfs_db::db;
use bbfs_db::models::{DrawRecord, Weekday};

use bbfs_engine::analysis::AnalysisWindow;
use bbfs_engine::config::{load_config, save_config, EngineConfig};
use bbfs_engine::display;
use bbfs_engine::engine::Engine;
use bbfs_engine::strategies::Strategy;

#[derive(Parser)]
#[command(name = "bbfs-engine", about = "Générateur et backtest BBFS 6 chiffres pour le 4D")]
struct Cli {
    /// Fichier de configuration JSON (valeurs par défaut si absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rejouer tout l'historique pour chaque stratégie
    Backtest,

    /// Générer un BBFS
    Predict {
        /// Résultat d'entrée (4 chiffres) ; par défaut le dernier tirage
        #[arg(short, long)]
        input: Option<String>,

        /// Jour de l'entrée (senin..minggu ou monday..sunday)
        #[arg(short, long)]
        day: Option<String>,

        /// Stratégie ; la meilleure si absente
        #[arg(short, long)]
        strategy: Option<Strategy>,
    },

    /// Série de pertes en cours
    Streak {
        #[arg(short, long, default_value = "v2")]
        strategy: Strategy,

        /// Nombre de pertes à détailler
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Répartition historique des séries de pertes
    Breakdown {
        /// Stratégie ; la meilleure si absente
        #[arg(short, long)]
        strategy: Option<Strategy>,
    },

    /// Détail des prédictions passées sur une fenêtre
    Analysis {
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Nombre de jours, ou "all"
        #[arg(short, long, default_value = "7")]
        window: AnalysisWindow,

        /// Dernières lignes du backtest au lieu d'une fenêtre calendaire
        #[arg(long)]
        last: Option<usize>,
    },

    /// Meilleure stratégie (plus petite série maximale)
    Best,

    /// Vérifier la cohérence des séries et des pertes
    Validate,

    /// Qualité et période des données
    Info {
        /// Nombre de derniers tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Statistiques de transition
    Stats,

    /// Écrire la configuration par défaut
    InitConfig {
        #[arg(short, long, default_value = "bbfs_config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::InitConfig { output } = &cli.command {
        save_config(&EngineConfig::default(), output)
            .with_context(|| format!("Impossible d'écrire {:?}", output))?;
        println!("Configuration par défaut écrite dans {}", output.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("Impossible de lire {:?}", path))?,
        None => EngineConfig::default(),
    };

    let records = load_history()?;
    println!("{} tirages chargés", records.len());

    let mut engine = Engine::new(config);
    engine.load_records(records);

    match cli.command {
        Command::Backtest => {
            run_backtests(&mut engine);
            display::display_pattern_summary(&engine.pattern_summary());
        }
        Command::Predict { input, day, strategy } => cmd_predict(&mut engine, input, day, strategy)?,
        Command::Streak { strategy, limit } => {
            run_backtests(&mut engine);
            display::display_active_streak(&engine.active_streak(strategy), limit);
        }
        Command::Breakdown { strategy } => {
            let strategy = resolve_strategy(&mut engine, strategy);
            match engine.historical_breakdown(strategy) {
                Some(breakdown) => display::display_breakdown(&breakdown),
                None => println!("Aucune série de pertes pour {}.", strategy),
            }
        }
        Command::Analysis { strategy, window, last } => {
            let strategy = resolve_strategy(&mut engine, strategy);
            match last {
                Some(limit) => {
                    let rows = engine.realtime_analysis(strategy, limit);
                    display::display_analysis(&rows, &format!("{} - {} dernières prédictions", strategy, limit));
                }
                None => {
                    let rows = engine.filtered_analysis(strategy, window);
                    let label = match window {
                        AnalysisWindow::Days(days) => format!("{} - {} derniers jours", strategy, days),
                        AnalysisWindow::All => format!("{} - tout l'historique", strategy),
                    };
                    display::display_analysis(&rows, &label);
                }
            }
        }
        Command::Best => {
            run_backtests(&mut engine);
            match engine.best_strategy() {
                Some(best) => {
                    println!("\nMeilleure stratégie : {} - {}", best, best.description());
                    let summary: Vec<_> = engine
                        .pattern_summary()
                        .into_iter()
                        .filter(|s| s.strategy == best)
                        .collect();
                    display::display_pattern_summary(&summary);
                }
                None => println!("Pas assez de tirages pour comparer les stratégies."),
            }
        }
        Command::Validate => {
            run_backtests(&mut engine);
            let report = engine.validation_report();
            display::display_validation(&report);
            if report.iter().any(|e| !e.is_accurate()) {
                log::warn!("Incohérence détectée entre séries et pertes");
            }
        }
        Command::Info { last } => {
            if let Some(info) = engine.data_info() {
                display::display_data_info(&info);
            }
            display::display_records(&engine.latest_records(last));
        }
        Command::Stats => display::display_stats(&engine.stats()),
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

fn load_history() -> Result<Vec<DrawRecord>> {
    let path = db::db_path();
    let conn = db::open_db(&path)?;
    db::migrate(&conn)?;

    if db::count_records(&conn)? == 0 {
        anyhow::bail!("Aucun tirage en base. Lancez d'abord : bbfs-cli import");
    }
    db::fetch_all_records(&conn)
}

fn run_backtests(engine: &mut Engine) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Backtest des stratégies V1, V2, V3...");
    pb.enable_steady_tick(Duration::from_millis(100));

    engine.run_all_backtests();

    pb.finish_and_clear();
}

fn resolve_strategy(engine: &mut Engine, strategy: Option<Strategy>) -> Strategy {
    match strategy {
        Some(s) => s,
        None => {
            run_backtests(engine);
            engine.best_strategy().unwrap_or(Strategy::Precision)
        }
    }
}

fn cmd_predict(
    engine: &mut Engine,
    input: Option<String>,
    day: Option<String>,
    strategy: Option<Strategy>,
) -> Result<()> {
    let Some(input) = input else {
        let strategy = resolve_strategy(engine, strategy);
        match engine.next_prediction(strategy) {
            Some((latest, set)) => {
                display::display_prediction(strategy, &latest.result, latest.weekday, &set);
            }
            None => println!("Aucun résultat valide pour prédire."),
        }
        return Ok(());
    };

    let weekday = match day {
        Some(name) => Weekday::from_name(&name)
            .with_context(|| format!("Jour inconnu '{}'", name))?,
        None => {
            let today = chrono::Local::now().date_naive();
            Weekday::from_date(today)
        }
    };

    let (strategy, set) = match strategy {
        Some(s) => (s, engine.generate_prediction(&input, weekday, s)?),
        None => {
            run_backtests(engine);
            engine.generate_auto_prediction(&input, weekday)?
        }
    };
    display::display_prediction(strategy, input.trim(), weekday, &set);
    Ok(())
}
