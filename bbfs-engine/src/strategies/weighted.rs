use serde::{Deserialize, Serialize};

use crate::patterns::{Digits, TransitionStats};
use super::{top_six, CandidateSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// (d + k) mod 10
    Shift(i8),
    /// 9 - d
    Mirror,
}

impl Transform {
    pub fn apply(&self, digit: u8) -> u8 {
        match self {
            Transform::Shift(k) => (digit as i16 + *k as i16).rem_euclid(10) as u8,
            Transform::Mirror => 9 - digit.min(9),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitBonus {
    pub digits: Vec<u8>,
    pub weight: f64,
}

impl DigitBonus {
    fn new(digits: &[u8], weight: f64) -> Self {
        Self { digits: digits.to_vec(), weight }
    }
}

/// Poids d'un score pondéré (V1 et V3 ne diffèrent que par ces valeurs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedProfile {
    pub input_weight: f64,
    pub safe_transition_weight: f64,
    pub high_risk_transition_weight: f64,
    pub safety_factor: f64,
    /// Une entrée ayant participé à une série de pertes de cette longueur est « à risque ».
    pub high_risk_streak: u32,
    pub loss_penalty: f64,
    pub penalty_factor: f64,
    pub transforms: Vec<(Transform, f64)>,
    /// Bonus accordés aux chiffres critiques absents de l'entrée.
    pub critical: Vec<DigitBonus>,
    pub coverage_min_distance: u8,
    pub coverage_max_distance: u8,
    pub coverage_step: f64,
    /// Paliers de couverture pour les chiffres absents de l'entrée.
    pub coverage_tiers: Vec<DigitBonus>,
    pub recent_window: usize,
    pub recent_weight: f64,
    pub positional_bonus: Option<f64>,
}

impl WeightedProfile {
    /// V1
    pub fn precision() -> Self {
        Self {
            input_weight: 90_000.0,
            safe_transition_weight: 40_000.0,
            high_risk_transition_weight: 60_000.0,
            safety_factor: 0.8,
            high_risk_streak: 10,
            loss_penalty: 8_000.0,
            penalty_factor: 0.5,
            transforms: vec![
                (Transform::Shift(1), 18_000.0),
                (Transform::Shift(-1), 18_000.0),
                (Transform::Shift(2), 12_000.0),
                (Transform::Shift(-2), 12_000.0),
                (Transform::Mirror, 15_000.0),
            ],
            critical: vec![
                DigitBonus::new(&[0, 5, 8, 9], 45_000.0),
                DigitBonus::new(&[1, 6, 7, 2], 40_000.0),
            ],
            coverage_min_distance: 2,
            coverage_max_distance: 4,
            coverage_step: 5_000.0,
            coverage_tiers: vec![
                DigitBonus::new(&[0, 5, 8, 9], 20_000.0),
                DigitBonus::new(&[1, 6, 7], 15_000.0),
                DigitBonus::new(&[2, 3, 4], 8_000.0),
            ],
            recent_window: 50,
            recent_weight: 1_000.0,
            positional_bonus: None,
        }
    }

    /// V3
    pub fn aggressive() -> Self {
        Self {
            input_weight: 95_000.0,
            safe_transition_weight: 50_000.0,
            high_risk_transition_weight: 70_000.0,
            safety_factor: 0.9,
            high_risk_streak: 8,
            loss_penalty: 6_000.0,
            penalty_factor: 0.3,
            transforms: vec![
                (Transform::Shift(1), 22_000.0),
                (Transform::Shift(-1), 22_000.0),
                (Transform::Shift(2), 16_000.0),
                (Transform::Shift(-2), 16_000.0),
                (Transform::Mirror, 19_000.0),
                (Transform::Shift(3), 12_000.0),
                (Transform::Shift(-3), 12_000.0),
            ],
            critical: vec![
                DigitBonus::new(&[0, 5, 8, 9], 55_000.0),
                DigitBonus::new(&[1, 6, 7, 2], 50_000.0),
            ],
            coverage_min_distance: 2,
            coverage_max_distance: 5,
            coverage_step: 6_000.0,
            coverage_tiers: vec![
                DigitBonus::new(&[0, 5, 8, 9], 25_000.0),
                DigitBonus::new(&[1, 6, 7], 20_000.0),
                DigitBonus::new(&[2, 3, 4], 10_000.0),
            ],
            recent_window: 30,
            recent_weight: 1_500.0,
            positional_bonus: Some(15_000.0),
        }
    }
}

/// Score brut par chiffre, avant sélection des six meilleurs.
pub fn digit_scores(profile: &WeightedProfile, input: &Digits, stats: &TransitionStats) -> [f64; 10] {
    let mut scores = [0.0f64; 10];
    let in_input = |d: u8| input.contains(&d);

    for &d in input {
        scores[d as usize] += profile.input_weight;
    }

    let transition_weight = if stats.is_high_risk(input, profile.high_risk_streak) {
        profile.high_risk_transition_weight * profile.safety_factor
    } else {
        profile.safe_transition_weight
    };
    if let Some(wins) = stats.winning_by_input.get(input) {
        for next in wins {
            for &d in next {
                scores[d as usize] += transition_weight;
            }
        }
    }

    if let Some(losses) = stats.losing_by_input.get(input) {
        let mut losing_freq = [0u32; 10];
        for next in losses {
            for &d in next {
                losing_freq[d as usize] += 1;
            }
        }
        for (d, &freq) in losing_freq.iter().enumerate() {
            scores[d] -= freq as f64 * profile.loss_penalty * profile.penalty_factor;
        }
    }

    for &d in input {
        for (transform, weight) in &profile.transforms {
            scores[transform.apply(d) as usize] += weight;
        }
    }

    // Premier palier correspondant uniquement
    for d in 0..10u8 {
        if in_input(d) {
            continue;
        }
        if let Some(bonus) = profile.critical.iter().find(|b| b.digits.contains(&d)) {
            scores[d as usize] += bonus.weight;
        }
    }

    let mut distinct_input: Vec<u8> = input.to_vec();
    distinct_input.sort_unstable();
    distinct_input.dedup();
    for d in 0..10u8 {
        if in_input(d) {
            continue;
        }
        let mut coverage = 0.0;
        for &inp in &distinct_input {
            let diff = d.abs_diff(inp);
            if diff >= profile.coverage_min_distance && diff <= profile.coverage_max_distance {
                coverage += profile.coverage_step;
            }
        }
        if let Some(tier) = profile.coverage_tiers.iter().find(|t| t.digits.contains(&d)) {
            coverage += tier.weight;
        }
        scores[d as usize] += coverage;
    }

    let recent = stats.recent_digit_frequency(profile.recent_window);
    for d in 0..10u8 {
        if !in_input(d) {
            scores[d as usize] += recent[d as usize] as f64 * profile.recent_weight;
        }
    }

    if let Some(bonus) = profile.positional_bonus {
        for (pos, &d) in input.iter().enumerate() {
            if let Some(next) = stats.most_common_successor(pos, d) {
                scores[next as usize] += bonus;
            }
        }
    }

    scores
}

pub fn score(profile: &WeightedProfile, input: &Digits, stats: &TransitionStats) -> CandidateSet {
    top_six(&digit_scores(profile, input, stats))
}
