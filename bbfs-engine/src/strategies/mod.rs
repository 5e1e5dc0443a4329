pub mod balanced;
pub mod weighted;

use serde::{Deserialize, Serialize};

use bbfs_db::models::{format_digits, Weekday};
use crate::config::EngineConfig;
use crate::patterns::{Digits, TransitionStats};

pub use balanced::{BalancedConfig, Padding};
pub use weighted::WeightedProfile;

/// Taille d'un BBFS.
pub const BBFS_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
pub enum Strategy {
    #[value(name = "v1")]
    Precision,
    #[value(name = "v2")]
    Balanced,
    #[value(name = "v3")]
    Aggressive,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Precision, Strategy::Balanced, Strategy::Aggressive];

    pub fn code(&self) -> &'static str {
        match self {
            Strategy::Precision => "V1",
            Strategy::Balanced => "V2",
            Strategy::Aggressive => "V3",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Precision => "Précision - transitions gagnantes/perdantes par entrée",
            Strategy::Balanced => "Équilibré - matrice de transition positionnelle",
            Strategy::Aggressive => "Agressif - analyse historique complète",
        }
    }

    pub fn scorer<'a>(&self, config: &'a EngineConfig) -> Scorer<'a> {
        match self {
            Strategy::Precision => Scorer::Weighted(&config.precision),
            Strategy::Balanced => Scorer::Balanced(&config.balanced),
            Strategy::Aggressive => Scorer::Weighted(&config.aggressive),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Ensemble de chiffres candidats (BBFS), dans l'ordre produit par la stratégie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSet(Vec<u8>);

impl CandidateSet {
    pub fn new(digits: Vec<u8>) -> Self {
        Self(digits)
    }

    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exactement six chiffres distincts entre 0 et 9.
    pub fn is_complete(&self) -> bool {
        if self.0.len() != BBFS_SIZE {
            return false;
        }
        let mut seen = [false; 10];
        for &d in &self.0 {
            if d > 9 || seen[d as usize] {
                return false;
            }
            seen[d as usize] = true;
        }
        true
    }
}

impl std::fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_digits(&self.0))
    }
}

/// Une variante par famille de stratégie ; V1 et V3 partagent le même score pondéré.
#[derive(Debug, Clone, Copy)]
pub enum Scorer<'a> {
    Weighted(&'a WeightedProfile),
    Balanced(&'a BalancedConfig),
}

impl Scorer<'_> {
    pub fn score(&self, input: &Digits, weekday: Weekday, stats: &TransitionStats) -> CandidateSet {
        match self {
            Scorer::Weighted(profile) => weighted::score(profile, input, stats),
            Scorer::Balanced(config) => balanced::score(config, input, weekday, stats),
        }
    }
}

/// Les six meilleurs chiffres ; à score égal, le chiffre le plus grand passe devant.
pub fn top_six(scores: &[f64; 10]) -> CandidateSet {
    let mut ranked: Vec<u8> = (0..10u8).collect();
    ranked.sort_by(|&a, &b| {
        scores[b as usize]
            .partial_cmp(&scores[a as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.cmp(&a))
    });
    ranked.truncate(BBFS_SIZE);
    CandidateSet::new(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_six_ties_descending() {
        let scores = [0.0; 10];
        assert_eq!(top_six(&scores).digits(), &[9, 8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_top_six_by_score() {
        let scores = [10.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0, 5.0];
        assert_eq!(top_six(&scores).digits(), &[0, 2, 4, 6, 8, 9]);
    }

    #[test]
    fn test_candidate_set_completeness() {
        assert!(CandidateSet::new(vec![0, 1, 2, 3, 4, 5]).is_complete());
        assert!(!CandidateSet::new(vec![0, 1, 2, 3, 4]).is_complete());
        assert!(!CandidateSet::new(vec![0, 1, 2, 3, 4, 4]).is_complete());
        assert!(!CandidateSet::new(vec![0, 1, 2, 3, 4, 10]).is_complete());
    }

    #[test]
    fn test_candidate_set_display() {
        assert_eq!(CandidateSet::new(vec![0, 1, 5, 6, 8, 9]).to_string(), "015689");
    }

    #[test]
    fn test_strategy_codes() {
        let codes: Vec<&str> = Strategy::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec!["V1", "V2", "V3"]);
    }
}
