use chrono::NaiveDate;
use serde::Serialize;

use bbfs_db::models::{DrawRecord, Weekday};
use crate::backtest::{BacktestResult, BacktestStep, DataCompleteness};
use crate::strategies::{CandidateSet, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisWindow {
    /// Jours calendaires, le dernier tirage inclus.
    Days(u32),
    All,
}

impl std::str::FromStr for AnalysisWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("tout") {
            return Ok(AnalysisWindow::All);
        }
        match s.parse::<u32>() {
            Ok(0) => anyhow::bail!("La fenêtre doit contenir au moins un jour"),
            Ok(days) => Ok(AnalysisWindow::Days(days)),
            Err(_) => anyhow::bail!("Fenêtre invalide '{}' : nombre de jours ou 'all'", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub input: String,
    pub actual: String,
    pub candidates: CandidateSet,
    pub is_win: bool,
}

impl From<&BacktestStep> for AnalysisRow {
    fn from(step: &BacktestStep) -> Self {
        Self {
            date: step.date,
            weekday: step.weekday,
            input: step.input.clone(),
            actual: step.actual.clone(),
            candidates: step.candidates.clone(),
            is_win: step.is_win,
        }
    }
}

fn newest_first(steps: &[&BacktestStep]) -> Vec<AnalysisRow> {
    let mut rows: Vec<AnalysisRow> = steps.iter().map(|s| AnalysisRow::from(*s)).collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

/// Lignes de backtest dans `[latest - (n - 1), latest]`, les plus récentes d'abord.
/// Si des dates manquent, retombe sur les `n` lignes les plus récentes.
pub fn filtered_analysis(result: &BacktestResult, window: AnalysisWindow, latest: Option<NaiveDate>) -> Vec<AnalysisRow> {
    let all: Vec<&BacktestStep> = result.steps.iter().collect();

    let (AnalysisWindow::Days(days), Some(latest)) = (window, latest) else {
        return newest_first(&all);
    };

    let cutoff = latest - chrono::Duration::days(days.saturating_sub(1) as i64);
    let in_range: Vec<&BacktestStep> = all.iter().copied().filter(|s| s.date >= cutoff).collect();

    let wanted = (days as usize).min(all.len());
    if in_range.len() >= wanted {
        return newest_first(&in_range);
    }

    log::debug!(
        "Fenêtre de {} jours incomplète ({} lignes), repli sur les {} plus récentes",
        days,
        in_range.len(),
        wanted
    );
    let mut rows = newest_first(&all);
    rows.truncate(days as usize);
    rows
}

/// Les `limit` dernières lignes du backtest, les plus récentes d'abord.
pub fn realtime_analysis(result: &BacktestResult, limit: usize) -> Vec<AnalysisRow> {
    let start = result.steps.len().saturating_sub(limit);
    result.steps[start..].iter().rev().map(AnalysisRow::from).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Completeness {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Completeness {
    pub fn from_quality(quality: f64) -> Self {
        if quality >= 95.0 {
            Completeness::Excellent
        } else if quality >= 85.0 {
            Completeness::Good
        } else if quality >= 70.0 {
            Completeness::Fair
        } else {
            Completeness::Poor
        }
    }
}

impl std::fmt::Display for Completeness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Completeness::Excellent => "Excellente",
            Completeness::Good => "Bonne",
            Completeness::Fair => "Correcte",
            Completeness::Poor => "Faible",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataInfo {
    pub total_records: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    pub quality: f64,
    pub completeness: Completeness,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

pub fn data_info(records: &[DrawRecord]) -> Option<DataInfo> {
    let first = records.first()?;
    let last = records.last()?;
    let valid = records.iter().filter(|r| r.digits().is_some()).count();
    let quality = valid as f64 / records.len() as f64 * 100.0;
    Some(DataInfo {
        total_records: records.len(),
        valid_records: valid,
        invalid_records: records.len() - valid,
        quality,
        completeness: Completeness::from_quality(quality),
        first_date: first.date,
        last_date: last.date,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakValidation {
    pub total_streaks: usize,
    pub sum_of_streaks: u32,
    pub reported_losses: u32,
    pub matches: bool,
    pub max_streak: u32,
    pub avg_streak: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationEntry {
    pub strategy: Strategy,
    pub completeness: DataCompleteness,
    pub streaks: StreakValidation,
    pub win_rate: f64,
    pub total_tests: u32,
}

impl ValidationEntry {
    pub fn from_result(result: &BacktestResult) -> Self {
        let sum: u32 = result.loss_streaks.iter().sum();
        let total = result.loss_streaks.len();
        let avg = if total > 0 { sum as f64 / total as f64 } else { 0.0 };
        if sum != result.losses {
            log::warn!(
                "{} : somme des séries ({}) différente des pertes ({})",
                result.strategy,
                sum,
                result.losses
            );
        }
        Self {
            strategy: result.strategy,
            completeness: result.completeness.clone(),
            streaks: StreakValidation {
                total_streaks: total,
                sum_of_streaks: sum,
                reported_losses: result.losses,
                matches: sum == result.losses,
                max_streak: result.loss_streaks.iter().copied().max().unwrap_or(0),
                avg_streak: avg,
            },
            win_rate: result.win_rate,
            total_tests: result.total_tests,
        }
    }

    pub fn is_accurate(&self) -> bool {
        self.streaks.matches
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternSummary {
    pub strategy: Strategy,
    pub name: String,
    pub win_rate: f64,
    pub max_loss_streak: u32,
    pub total_tests: u32,
    pub meets_criteria: bool,
}

impl PatternSummary {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            strategy: result.strategy,
            name: format!("{} - {}", result.strategy.code(), result.strategy.description()),
            win_rate: result.win_rate,
            max_loss_streak: result.max_consecutive_loss,
            total_tests: result.total_tests,
            meets_criteria: result.meets_criteria,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::run_backtest;
    use crate::patterns::Digits;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn record(date: NaiveDate, result: &str) -> DrawRecord {
        DrawRecord::new(date, Weekday::from_date(date), result)
    }

    fn fixed(_: &Digits, _: Weekday) -> CandidateSet {
        CandidateSet::new(vec![1, 2, 3, 4, 5, 6])
    }

    fn daily(n: u32) -> Vec<DrawRecord> {
        (0..n)
            .map(|i| record(day(1, 1) + chrono::Duration::days(i as i64), if i % 3 == 0 { "1123" } else { "1234" }))
            .collect()
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("7".parse::<AnalysisWindow>().unwrap(), AnalysisWindow::Days(7));
        assert_eq!("ALL".parse::<AnalysisWindow>().unwrap(), AnalysisWindow::All);
        assert!("0".parse::<AnalysisWindow>().is_err());
        assert!("semaine".parse::<AnalysisWindow>().is_err());
    }

    #[test]
    fn test_filtered_by_days() {
        let records = daily(10);
        let result = run_backtest(&records, Strategy::Precision, 20, fixed);
        let latest = records.last().map(|r| r.date);

        let rows = filtered_analysis(&result, AnalysisWindow::Days(3), Some(day(1, 9)));
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1, 9), day(1, 8), day(1, 7)]);

        // dernier tirage le 10/01 : seules 08/01 et 09/01 tombent dans la fenêtre, repli sur 3 lignes
        let rows = filtered_analysis(&result, AnalysisWindow::Days(3), latest);
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1, 9), day(1, 8), day(1, 7)]);

        let rows = filtered_analysis(&result, AnalysisWindow::Days(30), latest);
        assert_eq!(rows.len(), 9);
    }

    #[test]
    fn test_filtered_falls_back_to_most_recent() {
        let records = vec![
            record(day(1, 1), "1234"),
            record(day(1, 2), "2345"),
            record(day(1, 3), "3456"),
            record(day(1, 20), "4567"),
        ];
        let result = run_backtest(&records, Strategy::Precision, 20, fixed);
        let rows = filtered_analysis(&result, AnalysisWindow::Days(2), Some(day(1, 20)));
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1, 3), day(1, 2)]);
    }

    #[test]
    fn test_filtered_all_newest_first() {
        let records = daily(6);
        let result = run_backtest(&records, Strategy::Precision, 20, fixed);
        let rows = filtered_analysis(&result, AnalysisWindow::All, None);
        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_realtime_limit() {
        let records = daily(12);
        let result = run_backtest(&records, Strategy::Precision, 20, fixed);
        let rows = realtime_analysis(&result, 4);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, day(1, 11));
        assert_eq!(realtime_analysis(&result, 100).len(), 11);
    }

    #[test]
    fn test_data_info() {
        assert!(data_info(&[]).is_none());
        let mut records = daily(19);
        records.push(record(day(2, 1), "12a4"));
        let info = data_info(&records).unwrap();
        assert_eq!(info.valid_records, 19);
        assert_eq!(info.invalid_records, 1);
        assert!((info.quality - 95.0).abs() < 1e-9);
        assert_eq!(info.completeness, Completeness::Excellent);
        assert_eq!(info.last_date, day(2, 1));
    }

    #[test]
    fn test_completeness_bands() {
        assert_eq!(Completeness::from_quality(90.0), Completeness::Good);
        assert_eq!(Completeness::from_quality(70.0), Completeness::Fair);
        assert_eq!(Completeness::from_quality(69.9), Completeness::Poor);
    }

    #[test]
    fn test_validation_entry() {
        let records = daily(30);
        let result = run_backtest(&records, Strategy::Balanced, 5, fixed);
        let entry = ValidationEntry::from_result(&result);
        assert!(entry.is_accurate());
        assert_eq!(entry.streaks.sum_of_streaks, result.losses);
        assert_eq!(entry.streaks.max_streak, result.max_consecutive_loss);
    }

    #[test]
    fn test_pattern_summary_name() {
        let result = run_backtest(&daily(5), Strategy::Aggressive, 19, fixed);
        let summary = PatternSummary::from_result(&result);
        assert!(summary.name.starts_with("V3 - "));
        assert_eq!(summary.total_tests, 4);
    }
}
