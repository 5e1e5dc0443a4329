use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use bbfs_db::models::{format_digits, DrawRecord, Weekday};
use crate::backtest::BacktestResult;
use crate::patterns::Digits;
use crate::rules::is_win_digits;
use crate::strategies::{CandidateSet, Strategy};

/// Gravité de la série de pertes en cours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ActiveSeverity {
    None,
    Normal,
    Attention,
    High,
    Critical,
    Dangerous,
}

impl ActiveSeverity {
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => ActiveSeverity::None,
            1..=2 => ActiveSeverity::Normal,
            3..=5 => ActiveSeverity::Attention,
            6..=10 => ActiveSeverity::High,
            11..=20 => ActiveSeverity::Critical,
            _ => ActiveSeverity::Dangerous,
        }
    }
}

impl std::fmt::Display for ActiveSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActiveSeverity::None => "Gagné",
            ActiveSeverity::Normal => "Normal",
            ActiveSeverity::Attention => "Attention",
            ActiveSeverity::High => "Élevé",
            ActiveSeverity::Critical => "Critique",
            ActiveSeverity::Dangerous => "Dangereux",
        };
        write!(f, "{}", label)
    }
}

/// Gravité d'une longueur de série passée. Bornes plus strictes que [`ActiveSeverity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HistoricalSeverity {
    Normal,
    Attention,
    High,
    Critical,
    Dangerous,
}

impl HistoricalSeverity {
    pub fn from_length(length: u32) -> Self {
        match length {
            0..=2 => HistoricalSeverity::Normal,
            3..=5 => HistoricalSeverity::Attention,
            6..=10 => HistoricalSeverity::High,
            11..=15 => HistoricalSeverity::Critical,
            _ => HistoricalSeverity::Dangerous,
        }
    }
}

impl std::fmt::Display for HistoricalSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HistoricalSeverity::Normal => "Normal",
            HistoricalSeverity::Attention => "Attention",
            HistoricalSeverity::High => "Élevé",
            HistoricalSeverity::Critical => "Critique",
            HistoricalSeverity::Dangerous => "Dangereux",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakStep {
    /// Date du tirage d'entrée.
    pub date: NaiveDate,
    pub input: String,
    pub actual: String,
    pub candidates: CandidateSet,
    /// Rang dans la série, 1 pour la perte la plus ancienne.
    pub loss_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveStreak {
    pub strategy: Strategy,
    pub count: u32,
    /// De la plus récente à la plus ancienne.
    pub steps: Vec<StreakStep>,
    pub severity: ActiveSeverity,
    /// Pertes totales du backtest, si celui-ci a déjà été calculé.
    pub total_losses: Option<u32>,
    /// Paires valides de tout l'historique, pas seulement celles de la série.
    pub valid_pairs: usize,
    pub total_records: usize,
}

impl ActiveStreak {
    pub fn data_quality(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.valid_pairs as f64 / self.total_records as f64 * 100.0
    }
}

/// Remonte l'historique depuis la paire la plus récente jusqu'au premier gain.
pub fn active_streak<F>(records: &[DrawRecord], strategy: Strategy, mut score: F) -> ActiveStreak
where
    F: FnMut(&Digits, Weekday) -> CandidateSet,
{
    let mut steps = Vec::new();
    let mut valid_pairs = 0;
    let mut broken = false;

    for pair in records.windows(2).rev() {
        let (previous, current) = (&pair[0], &pair[1]);
        let (Some(input), Some(actual)) = (previous.digits(), current.digits()) else {
            continue;
        };
        valid_pairs += 1;
        if broken {
            continue;
        }

        let candidates = score(&input, previous.weekday);
        if is_win_digits(candidates.digits(), &actual) {
            broken = true;
            continue;
        }
        steps.push(StreakStep {
            date: previous.date,
            input: format_digits(&input),
            actual: format_digits(&actual),
            candidates,
            loss_number: 0,
        });
    }

    let count = steps.len() as u32;
    for (i, step) in steps.iter_mut().enumerate() {
        step.loss_number = count - i as u32;
    }

    ActiveStreak {
        strategy,
        count,
        steps,
        severity: ActiveSeverity::from_count(count),
        total_losses: None,
        valid_pairs,
        total_records: records.len(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakBucket {
    pub length: u32,
    pub count: usize,
    pub percentage: f64,
    pub severity: HistoricalSeverity,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownSummary {
    pub strategy: Strategy,
    pub total_streaks: usize,
    pub max_streak: u32,
    pub avg_streak: f64,
    pub total_tests: u32,
    pub total_losses: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakBreakdown {
    /// Par longueur croissante.
    pub buckets: Vec<StreakBucket>,
    pub summary: BreakdownSummary,
}

pub fn historical_breakdown(result: &BacktestResult) -> Option<StreakBreakdown> {
    let streaks = &result.loss_streaks;
    if streaks.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &length in streaks {
        *counts.entry(length).or_insert(0) += 1;
    }

    let total = streaks.len();
    let buckets = counts
        .into_iter()
        .map(|(length, count)| StreakBucket {
            length,
            count,
            percentage: count as f64 / total as f64 * 100.0,
            severity: HistoricalSeverity::from_length(length),
        })
        .collect();

    Some(StreakBreakdown {
        buckets,
        summary: BreakdownSummary {
            strategy: result.strategy,
            total_streaks: total,
            max_streak: streaks.iter().copied().max().unwrap_or(0),
            avg_streak: streaks.iter().sum::<u32>() as f64 / total as f64,
            total_tests: result.total_tests,
            total_losses: result.losses,
            win_rate: result.win_rate,
        },
    })
}
