use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bbfs_db::models::{format_digits, DrawRecord, Weekday};
use crate::patterns::Digits;
use crate::rules::is_win_digits;
use crate::strategies::{CandidateSet, Strategy, BBFS_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStep {
    /// Date du tirage d'entrée.
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub input: String,
    pub actual: String,
    pub candidates: CandidateSet,
    pub is_win: bool,
    /// Série de pertes en cours après cette étape.
    pub consecutive_losses: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataCompleteness {
    pub valid_pairs: usize,
    pub total_records: usize,
    pub quality: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub total_tests: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub max_consecutive_loss: u32,
    pub loss_streaks: Vec<u32>,
    pub steps: Vec<BacktestStep>,
    pub threshold: u32,
    pub meets_criteria: bool,
    pub completeness: DataCompleteness,
}

impl BacktestResult {
    pub fn streaks_consistent(&self) -> bool {
        self.loss_streaks.iter().sum::<u32>() == self.losses
    }
}

/// Rejoue chaque paire consécutive de l'historique ; toujours un passage complet.
/// Entraînement et évaluation portent sur le même historique.
pub fn run_backtest<F>(
    records: &[DrawRecord],
    strategy: Strategy,
    threshold: u32,
    mut score: F,
) -> BacktestResult
where
    F: FnMut(&Digits, Weekday) -> CandidateSet,
{
    let mut steps = Vec::with_capacity(records.len().saturating_sub(1));
    let mut loss_streaks = Vec::new();
    let mut consecutive = 0u32;
    let mut max_consecutive = 0u32;
    let mut wins = 0u32;
    let mut total_tests = 0u32;
    let mut valid_pairs = 0usize;

    for pair in records.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let (Some(input), Some(actual)) = (current.digits(), next.digits()) else {
            continue;
        };
        valid_pairs += 1;

        let candidates = score(&input, current.weekday);
        if candidates.len() != BBFS_SIZE {
            continue;
        }

        let is_win = is_win_digits(candidates.digits(), &actual);
        total_tests += 1;

        if is_win {
            wins += 1;
            if consecutive > 0 {
                loss_streaks.push(consecutive);
                consecutive = 0;
            }
        } else {
            consecutive += 1;
            max_consecutive = max_consecutive.max(consecutive);
        }

        steps.push(BacktestStep {
            date: current.date,
            weekday: current.weekday,
            input: format_digits(&input),
            actual: format_digits(&actual),
            candidates,
            is_win,
            consecutive_losses: consecutive,
        });
    }

    // Série encore active en fin d'historique
    if consecutive > 0 {
        loss_streaks.push(consecutive);
    }

    let losses = total_tests - wins;
    let win_rate = if total_tests > 0 {
        wins as f64 / total_tests as f64 * 100.0
    } else {
        0.0
    };
    let quality = if records.is_empty() {
        0.0
    } else {
        valid_pairs as f64 / records.len() as f64 * 100.0
    };

    log::info!(
        "Backtest {} : {} tests, {:.2}% de gains, série max {}, {} séries",
        strategy,
        total_tests,
        win_rate,
        max_consecutive,
        loss_streaks.len()
    );

    BacktestResult {
        strategy,
        total_tests,
        wins,
        losses,
        win_rate,
        max_consecutive_loss: max_consecutive,
        loss_streaks,
        steps,
        threshold,
        meets_criteria: max_consecutive <= threshold,
        completeness: DataCompleteness {
            valid_pairs,
            total_records: records.len(),
            quality,
        },
    }
}
