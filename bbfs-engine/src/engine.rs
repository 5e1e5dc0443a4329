use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;

use bbfs_db::models::{normalize_records, validate_result, DrawRecord, Weekday};
use crate::analysis::{self, AnalysisRow, AnalysisWindow, DataInfo, PatternSummary, ValidationEntry};
use crate::backtest::{run_backtest, BacktestResult};
use crate::config::EngineConfig;
use crate::patterns::{Digits, TransitionStats};
use crate::streaks::{self, ActiveStreak, StreakBreakdown};
use crate::strategies::{CandidateSet, Strategy};

/// Façade du moteur : un instantané immuable de l'historique et trois caches
/// (statistiques, backtests, prédictions) vidés ensemble à chaque remplacement.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    records: Arc<Vec<DrawRecord>>,
    stats: Option<Arc<TransitionStats>>,
    backtests: HashMap<Strategy, Arc<BacktestResult>>,
    predictions: HashMap<(Digits, Weekday, Strategy), CandidateSet>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    /// Remplace l'historique (trié, dédoublonné) et invalide tous les caches.
    pub fn load_records(&mut self, records: Vec<DrawRecord>) {
        let before = records.len();
        let records = normalize_records(records);
        if records.len() < before {
            log::info!("{} doublons (date, résultat) ignorés", before - records.len());
        }
        log::info!("Historique chargé : {} tirages", records.len());
        self.records = Arc::new(records);
        self.clear_caches();
    }

    fn clear_caches(&mut self) {
        self.stats = None;
        self.backtests.clear();
        self.predictions.clear();
    }

    pub fn stats(&mut self) -> Arc<TransitionStats> {
        if let Some(stats) = &self.stats {
            return Arc::clone(stats);
        }
        log::debug!("Reconstruction des statistiques de transition");
        let stats = Arc::new(TransitionStats::build(&self.records));
        self.stats = Some(Arc::clone(&stats));
        stats
    }

    fn predict_digits(&mut self, input: &Digits, weekday: Weekday, strategy: Strategy) -> CandidateSet {
        let key = (*input, weekday, strategy);
        if let Some(set) = self.predictions.get(&key) {
            return set.clone();
        }
        let stats = self.stats();
        let set = strategy.scorer(&self.config).score(input, weekday, &stats);
        self.predictions.insert(key, set.clone());
        set
    }

    pub fn generate_prediction(&mut self, input: &str, weekday: Weekday, strategy: Strategy) -> Result<CandidateSet> {
        let digits = validate_result(input.trim()).context("Entrée de prédiction invalide")?;
        Ok(self.predict_digits(&digits, weekday, strategy))
    }

    /// Utilise la meilleure stratégie connue, V1 à défaut.
    pub fn generate_auto_prediction(&mut self, input: &str, weekday: Weekday) -> Result<(Strategy, CandidateSet)> {
        let strategy = self.best_strategy().unwrap_or(Strategy::Precision);
        let set = self.generate_prediction(input, weekday, strategy)?;
        Ok((strategy, set))
    }

    /// Prédiction pour le tirage suivant le dernier résultat valide.
    pub fn next_prediction(&mut self, strategy: Strategy) -> Option<(DrawRecord, CandidateSet)> {
        let latest = self.records.iter().rev().find(|r| r.digits().is_some())?.clone();
        let digits = latest.digits()?;
        let set = self.predict_digits(&digits, latest.weekday, strategy);
        Some((latest, set))
    }

    pub fn backtest(&mut self, strategy: Strategy) -> Arc<BacktestResult> {
        if let Some(result) = self.backtests.get(&strategy) {
            return Arc::clone(result);
        }
        let stats = self.stats();
        let result = Arc::new(compute_backtest(&self.records, &stats, &self.config, strategy));
        self.backtests.insert(strategy, Arc::clone(&result));
        result
    }

    /// Les trois backtests ne lisent que l'instantané et les statistiques : ils tournent en parallèle.
    pub fn run_all_backtests(&mut self) -> Vec<Arc<BacktestResult>> {
        let stats = self.stats();
        let missing: Vec<Strategy> = Strategy::ALL
            .into_iter()
            .filter(|s| !self.backtests.contains_key(s))
            .collect();

        let records = &self.records;
        let config = &self.config;
        let computed: Vec<BacktestResult> = missing
            .par_iter()
            .map(|&strategy| compute_backtest(records, &stats, config, strategy))
            .collect();

        for result in computed {
            self.backtests.insert(result.strategy, Arc::new(result));
        }

        Strategy::ALL
            .iter()
            .filter_map(|s| self.backtests.get(s).cloned())
            .collect()
    }

    /// Plus petite série maximale ; à égalité, la stratégie la plus ancienne (V1 avant V2).
    pub fn best_strategy(&mut self) -> Option<Strategy> {
        let mut best: Option<(Strategy, u32)> = None;
        for result in self.run_all_backtests() {
            if result.total_tests == 0 {
                continue;
            }
            if best.map_or(true, |(_, max)| result.max_consecutive_loss < max) {
                best = Some((result.strategy, result.max_consecutive_loss));
            }
        }
        best.map(|(strategy, _)| strategy)
    }

    pub fn active_streak(&mut self, strategy: Strategy) -> ActiveStreak {
        let stats = self.stats();
        let scorer = strategy.scorer(&self.config);
        let mut streak = streaks::active_streak(&self.records, strategy, |input, weekday| {
            scorer.score(input, weekday, &stats)
        });
        streak.total_losses = self.backtests.get(&strategy).map(|r| r.losses);
        streak
    }

    pub fn historical_breakdown(&mut self, strategy: Strategy) -> Option<StreakBreakdown> {
        let result = self.backtest(strategy);
        streaks::historical_breakdown(&result)
    }

    pub fn filtered_analysis(&mut self, strategy: Strategy, window: AnalysisWindow) -> Vec<AnalysisRow> {
        let result = self.backtest(strategy);
        let latest = self.records.iter().map(|r| r.date).max();
        analysis::filtered_analysis(&result, window, latest)
    }

    pub fn realtime_analysis(&mut self, strategy: Strategy, limit: usize) -> Vec<AnalysisRow> {
        let result = self.backtest(strategy);
        analysis::realtime_analysis(&result, limit)
    }

    pub fn pattern_summary(&mut self) -> Vec<PatternSummary> {
        self.run_all_backtests()
            .iter()
            .map(|r| PatternSummary::from_result(r))
            .collect()
    }

    pub fn data_info(&self) -> Option<DataInfo> {
        analysis::data_info(&self.records)
    }

    pub fn validation_report(&mut self) -> Vec<ValidationEntry> {
        self.run_all_backtests()
            .iter()
            .map(|r| ValidationEntry::from_result(r))
            .collect()
    }

    /// Les `limit` derniers tirages, les plus récents d'abord.
    pub fn latest_records(&self, limit: usize) -> Vec<DrawRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }
}

fn compute_backtest(
    records: &[DrawRecord],
    stats: &TransitionStats,
    config: &EngineConfig,
    strategy: Strategy,
) -> BacktestResult {
    let scorer = strategy.scorer(config);
    run_backtest(records, strategy, config.threshold(strategy), |input, weekday| {
        scorer.score(input, weekday, stats)
    })
}
