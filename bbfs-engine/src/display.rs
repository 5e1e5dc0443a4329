use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use bbfs_db::models::{DrawRecord, Weekday};
use crate::analysis::{AnalysisRow, DataInfo, PatternSummary, ValidationEntry};
use crate::patterns::TransitionStats;
use crate::strategies::{CandidateSet, Strategy};
use crate::streaks::{ActiveSeverity, ActiveStreak, HistoricalSeverity, StreakBreakdown};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn outcome_cell(is_win: bool) -> Cell {
    if is_win {
        Cell::new("GAGNÉ").fg(Color::Green)
    } else {
        Cell::new("PERDU").fg(Color::Red)
    }
}

fn historical_color(severity: HistoricalSeverity) -> Color {
    match severity {
        HistoricalSeverity::Normal => Color::Green,
        HistoricalSeverity::Attention => Color::Yellow,
        HistoricalSeverity::High => Color::DarkYellow,
        HistoricalSeverity::Critical | HistoricalSeverity::Dangerous => Color::Red,
    }
}

fn active_color(severity: ActiveSeverity) -> Color {
    match severity {
        ActiveSeverity::None | ActiveSeverity::Normal => Color::Green,
        ActiveSeverity::Attention => Color::Yellow,
        ActiveSeverity::High => Color::DarkYellow,
        ActiveSeverity::Critical | ActiveSeverity::Dangerous => Color::Red,
    }
}

pub fn display_pattern_summary(summary: &[PatternSummary]) {
    println!("\n== Performances des stratégies ==\n");

    let mut table = new_table(vec!["Stratégie", "Tests", "Taux de gain", "Série max", "Conforme"]);
    for s in summary {
        let conform = if s.meets_criteria {
            Cell::new("oui").fg(Color::Green)
        } else {
            Cell::new("non").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(s.total_tests),
            Cell::new(format!("{:.2}%", s.win_rate)),
            Cell::new(s.max_loss_streak),
            conform,
        ]);
    }
    println!("{table}");
}

pub fn display_prediction(strategy: Strategy, input: &str, weekday: Weekday, set: &CandidateSet) {
    println!("\n🎯 BBFS {} pour {} ({})\n", strategy, input, weekday);
    println!("  {}", set);
    println!("  {}", strategy.description());
}

pub fn display_active_streak(streak: &ActiveStreak, limit: usize) {
    println!(
        "\nSérie en cours ({}) : {} perte(s) - {}",
        streak.strategy, streak.count, streak.severity
    );
    if let Some(total) = streak.total_losses {
        println!("Pertes totales sur l'historique : {}", total);
    }
    println!(
        "Paires valides : {} sur {} tirages ({:.1}%)",
        streak.valid_pairs,
        streak.total_records,
        streak.data_quality()
    );
    if streak.steps.is_empty() {
        return;
    }

    let color = active_color(streak.severity);
    let mut table = new_table(vec!["#", "Date", "Entrée", "Résultat", "BBFS"]);
    for step in streak.steps.iter().take(limit) {
        table.add_row(vec![
            Cell::new(step.loss_number).fg(color),
            Cell::new(step.date.format("%d/%m/%Y")),
            Cell::new(&step.input),
            Cell::new(&step.actual),
            Cell::new(&step.candidates),
        ]);
    }
    println!("{table}");
}

pub fn display_breakdown(breakdown: &StreakBreakdown) {
    let summary = &breakdown.summary;
    println!("\n== Répartition des séries de pertes ({}) ==\n", summary.strategy);

    let mut table = new_table(vec!["Longueur", "Occurrences", "Part", "Gravité"]);
    for bucket in &breakdown.buckets {
        table.add_row(vec![
            Cell::new(format!("{}x", bucket.length)),
            Cell::new(bucket.count),
            Cell::new(format!("{:.1}%", bucket.percentage)),
            Cell::new(bucket.severity).fg(historical_color(bucket.severity)),
        ]);
    }
    println!("{table}");

    println!(
        "\n{} séries, max {}, moyenne {:.2} | {} tests, {} pertes, {:.2}% de gains",
        summary.total_streaks,
        summary.max_streak,
        summary.avg_streak,
        summary.total_tests,
        summary.total_losses,
        summary.win_rate
    );
}

pub fn display_analysis(rows: &[AnalysisRow], title: &str) {
    if rows.is_empty() {
        println!("Aucune ligne à afficher.");
        return;
    }
    println!("\n== {} ==\n", title);

    let mut table = new_table(vec!["Date", "Jour", "Entrée", "Résultat", "BBFS", "Issue"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.date.format("%d/%m/%Y")),
            Cell::new(row.weekday),
            Cell::new(&row.input),
            Cell::new(&row.actual),
            Cell::new(&row.candidates),
            outcome_cell(row.is_win),
        ]);
    }
    println!("{table}");

    let wins = rows.iter().filter(|r| r.is_win).count();
    println!(
        "\n{} gains sur {} ({:.1}%)",
        wins,
        rows.len(),
        wins as f64 / rows.len() as f64 * 100.0
    );
}

pub fn display_validation(report: &[ValidationEntry]) {
    println!("\n== Validation des calculs ==\n");

    let mut table = new_table(vec!["Stratégie", "Séries", "Somme", "Pertes", "Qualité", "Statut"]);
    for entry in report {
        let status = if entry.is_accurate() {
            Cell::new("EXACT").fg(Color::Green)
        } else {
            Cell::new("À VÉRIFIER").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(entry.strategy),
            Cell::new(entry.streaks.total_streaks),
            Cell::new(entry.streaks.sum_of_streaks),
            Cell::new(entry.streaks.reported_losses),
            Cell::new(format!("{:.1}%", entry.completeness.quality)),
            status,
        ]);
    }
    println!("{table}");
}

pub fn display_data_info(info: &DataInfo) {
    println!("\n📊 Données\n");
    println!("  Tirages         : {}", info.total_records);
    println!("  Valides         : {}", info.valid_records);
    println!("  Invalides       : {}", info.invalid_records);
    println!("  Qualité         : {:.1}% ({})", info.quality, info.completeness);
    println!("  Période         : {} → {}", info.first_date, info.last_date);
}

pub fn display_records(records: &[DrawRecord]) {
    let mut table = new_table(vec!["Date", "Jour", "Résultat"]);
    for r in records {
        table.add_row(vec![
            Cell::new(r.date.format("%d/%m/%Y")),
            Cell::new(r.weekday),
            Cell::new(&r.result),
        ]);
    }
    println!("{table}");
}

fn digit_list(digits: &[u8]) -> String {
    if digits.is_empty() {
        return "—".to_string();
    }
    digits
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn display_stats(stats: &TransitionStats) {
    println!("\n== Statistiques de transition ==\n");
    println!("  Paires analysées     : {}", stats.pairs_scanned);
    println!("  Entrées distinctes   : {}", stats.by_input.len());
    println!("  Contextes dangereux  : {}", stats.danger_contexts.len());
    println!("  Combinaisons sûres   : {}", stats.safe_combinations.len());
    println!("  Casseurs de série    : {}", digit_list(&stats.proven_streak_breakers));
    println!("  Chiffres en tendance : {}", digit_list(&stats.trending_digits));
    println!("  Compléments optimaux : {}", digit_list(&stats.optimal_fillers));

    let total: u32 = stats.global_digit_frequency.iter().sum();
    let mut table = new_table(vec!["Chiffre", "Fréquence", "Part"]);
    for (digit, &count) in stats.global_digit_frequency.iter().enumerate() {
        let share = if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(digit),
            Cell::new(count),
            Cell::new(format!("{:.1}%", share)),
        ]);
    }
    println!();
    println!("{table}");
}
