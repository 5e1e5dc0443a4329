use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use bbfs_db::models::Weekday;
use crate::patterns::{top_digits, Digits, TransitionStats};
use super::{CandidateSet, BBFS_SIZE};

/// Remplissage des places restantes quand les motifs ne fournissent pas six chiffres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// Fréquence globale décroissante, puis chiffre croissant.
    Frequency,
    /// Mélange pseudo-aléatoire, reproductible pour une même graine et une même entrée.
    Shuffle { seed: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancedConfig {
    pub padding: Padding,
    pub weekday_successors: usize,
}

impl Default for BalancedConfig {
    fn default() -> Self {
        Self {
            padding: Padding::Frequency,
            weekday_successors: 3,
        }
    }
}

fn padding_order(padding: Padding, input: &Digits, stats: &TransitionStats) -> Vec<u8> {
    match padding {
        Padding::Frequency => {
            let mut order = top_digits(&stats.global_digit_frequency, 10);
            let mut listed = [false; 10];
            for &d in &order {
                listed[d as usize] = true;
            }
            order.extend((0..10u8).filter(|&d| !listed[d as usize]));
            order
        }
        Padding::Shuffle { seed } => {
            let input_key = input.iter().fold(0u64, |acc, &d| acc * 10 + d as u64);
            let mut rng = StdRng::seed_from_u64(seed ^ input_key);
            let mut order: Vec<u8> = (0..10u8).collect();
            order.shuffle(&mut rng);
            order
        }
    }
}

pub fn score(config: &BalancedConfig, input: &Digits, weekday: Weekday, stats: &TransitionStats) -> CandidateSet {
    let mut present = [false; 10];

    for &d in input {
        present[d as usize] = true;
    }

    for (pos, &d) in input.iter().enumerate() {
        if let Some(next) = stats.most_common_successor(pos, d) {
            present[next as usize] = true;
        }
    }

    for next in stats.top_weekday_successors(weekday, input, config.weekday_successors) {
        for d in next {
            present[d as usize] = true;
        }
    }

    let mut count = present.iter().filter(|&&p| p).count();
    for d in padding_order(config.padding, input, stats) {
        if count >= BBFS_SIZE {
            break;
        }
        if !present[d as usize] {
            present[d as usize] = true;
            count += 1;
        }
    }

    // Ordre croissant ; au-delà de six chiffres, les plus petits sont gardés
    let digits: Vec<u8> = (0..10u8)
        .filter(|&d| present[d as usize])
        .take(BBFS_SIZE)
        .collect();
    CandidateSet::new(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbfs_db::models::DrawRecord;
    use crate::patterns::make_test_records;

    fn record(date: &str, result: &str) -> DrawRecord {
        let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        DrawRecord::new(date, Weekday::from_date(date), result)
    }

    #[test]
    fn test_empty_stats_pads_in_digit_order() {
        let stats = TransitionStats::default();
        let set = score(&BalancedConfig::default(), &[1, 2, 3, 4], Weekday::Senin, &stats);
        assert_eq!(set.digits(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_frequency_padding() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "9870"),
            record("2024-01-03", "9871"),
        ];
        let stats = TransitionStats::build(&records);
        // entrée 5555 : aucun motif, 9 et 8 sont les plus fréquents
        let set = score(&BalancedConfig::default(), &[5, 5, 5, 5], Weekday::Kamis, &stats);
        assert_eq!(set.digits(), &[0, 1, 5, 7, 8, 9]);
    }

    #[test]
    fn test_weekday_and_positional_digits_included() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "5678"),
            record("2024-01-03", "1234"),
        ];
        let stats = TransitionStats::build(&records);
        let set = score(&BalancedConfig::default(), &[1, 2, 3, 4], Weekday::Senin, &stats);
        // 1234 + successeurs positionnels 5678 : huit candidats, les six plus petits sont gardés
        assert_eq!(set.digits(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_positional_tie_keeps_first_seen_successor() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "7890"),
            record("2024-01-03", "1234"),
            record("2024-01-04", "3456"),
        ];
        let stats = TransitionStats::build(&records);
        // chaque position hésite entre 7890 (vu d'abord) et 3456 : 7, 8, 9 et 0 l'emportent
        let set = score(&BalancedConfig::default(), &[1, 2, 3, 4], Weekday::Jumat, &stats);
        assert_eq!(set.digits(), &[0, 1, 2, 3, 4, 7]);
    }

    #[test]
    fn test_frequency_padding_with_partial_counts() {
        let records = vec![record("2024-01-01", "1234"), record("2024-01-02", "9999")];
        let stats = TransitionStats::build(&records);
        // 9 seul a une fréquence : puis 0, 1, 2... dans l'ordre
        let set = score(&BalancedConfig::default(), &[5, 5, 5, 5], Weekday::Kamis, &stats);
        assert_eq!(set.digits(), &[0, 1, 2, 3, 5, 9]);
    }

    #[test]
    fn test_shuffle_padding_is_reproducible() {
        let stats = TransitionStats::build(&make_test_records(40));
        let config = BalancedConfig {
            padding: Padding::Shuffle { seed: 42 },
            weekday_successors: 3,
        };
        let a = score(&config, &[0, 0, 0, 0], Weekday::Senin, &stats);
        let b = score(&config, &[0, 0, 0, 0], Weekday::Senin, &stats);
        assert_eq!(a, b);
        assert!(a.is_complete());
    }

    #[test]
    fn test_always_six_sorted() {
        let records = make_test_records(150);
        let stats = TransitionStats::build(&records);
        let config = BalancedConfig::default();
        for r in &records {
            let set = score(&config, &r.digits().unwrap(), r.weekday, &stats);
            assert!(set.is_complete());
            assert!(set.digits().windows(2).all(|w| w[0] < w[1]));
        }
    }
}
