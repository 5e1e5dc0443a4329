use std::collections::HashMap;

use bbfs_db::models::{DrawRecord, Weekday};
use crate::rules::has_repeated_digit;

pub type Digits = [u8; 4];

/// Au-delà de cette longueur, chaque perte supplémentaire est enregistrée comme contexte dangereux.
pub const DANGER_STREAK: u32 = 15;
/// Seuls les contextes issus de séries plus longues alimentent la carte d'évitement.
pub const SEVERE_DANGER_STREAK: u32 = 19;
/// Longueur moyenne minimale des séries cassées pour qu'une combinaison soit jugée sûre.
pub const SAFE_MIN_AVG_BROKEN: f64 = 5.0;
/// Poids cumulé minimal d'un chiffre « casseur de série ».
pub const STREAK_BREAKER_MIN_WEIGHT: u32 = 50;
/// Nombre de résultats récents conservés pour les fenêtres de récence.
pub const RECENT_KEPT: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct StreakBreakContext {
    pub safe_digits: [u32; 10],
    pub streaks_broken: Vec<u32>,
    pub total_uses: u32,
}

impl StreakBreakContext {
    pub fn average_broken(&self) -> f64 {
        if self.streaks_broken.is_empty() {
            return 0.0;
        }
        self.streaks_broken.iter().sum::<u32>() as f64 / self.streaks_broken.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LossStep {
    pub input: Digits,
    pub weekday: Weekday,
    pub result: Digits,
    pub position_in_streak: u32,
}

#[derive(Debug, Clone)]
pub struct DangerContext {
    pub streak_length: u32,
    pub recent_inputs: Vec<Digits>,
    pub recent_weekdays: Vec<Weekday>,
    pub dangerous_steps: Vec<LossStep>,
}

#[derive(Debug, Clone)]
pub struct SafeCombination {
    pub top_safe_digits: Vec<u8>,
    pub effectiveness: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DangerAvoidance {
    pub avoid_digits: [u32; 10],
    pub danger_level: u32,
}

/// Compteurs des chiffres suivants pour une (position, chiffre d'entrée).
#[derive(Debug, Clone, Default)]
pub struct SuccessorCounts {
    pub counts: [u32; 10],
    /// Chiffres dans l'ordre de leur première apparition.
    pub first_seen: Vec<u8>,
}

impl SuccessorCounts {
    fn record(&mut self, digit: u8) {
        if self.counts[digit as usize] == 0 {
            self.first_seen.push(digit);
        }
        self.counts[digit as usize] += 1;
    }

    /// Le plus fréquent ; à égalité, le premier observé dans l'historique.
    pub fn most_common(&self) -> Option<u8> {
        let mut best: Option<u8> = None;
        for &d in &self.first_seen {
            if best.map_or(true, |b| self.counts[d as usize] > self.counts[b as usize]) {
                best = Some(d);
            }
        }
        best
    }
}

/// Statistiques de transition, fonction pure de la séquence de tirages.
#[derive(Debug, Clone, Default)]
pub struct TransitionStats {
    pub by_weekday_input: HashMap<(Weekday, Digits), Vec<Digits>>,
    pub by_input: HashMap<Digits, Vec<Digits>>,
    pub global_digit_frequency: [u32; 10],
    pub positional_transitions: HashMap<(usize, u8), SuccessorCounts>,
    pub winning_by_input: HashMap<Digits, Vec<Digits>>,
    pub losing_by_input: HashMap<Digits, Vec<Digits>>,
    pub loss_streak_peak_by_input: HashMap<Digits, u32>,
    pub streak_break_contexts: HashMap<(Digits, Weekday), StreakBreakContext>,
    pub danger_contexts: Vec<DangerContext>,
    pub safe_combinations: HashMap<(Digits, Weekday), SafeCombination>,
    pub proven_streak_breakers: Vec<u8>,
    pub danger_avoidance: HashMap<(Digits, Weekday), DangerAvoidance>,
    pub trending_digits: Vec<u8>,
    pub optimal_fillers: Vec<u8>,
    /// Derniers résultats valides, du plus ancien au plus récent.
    pub recent_results: Vec<Digits>,
    pub pairs_scanned: usize,
}

impl TransitionStats {
    /// Un seul passage sur les paires consécutives `(records[i], records[i + 1])`.
    pub fn build(records: &[DrawRecord]) -> Self {
        let mut stats = TransitionStats::default();

        let valid: Vec<Digits> = records.iter().filter_map(|r| r.digits()).collect();
        let keep_from = valid.len().saturating_sub(RECENT_KEPT);
        stats.recent_results = valid[keep_from..].to_vec();

        if records.len() < 2 {
            return stats;
        }

        let mut consecutive_losses = 0u32;
        let mut current_streak: Vec<LossStep> = Vec::new();

        for pair in records.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let (Some(input), Some(next_digits)) = (current.digits(), next.digits()) else {
                continue;
            };
            let weekday = current.weekday;
            stats.pairs_scanned += 1;

            stats.by_weekday_input.entry((weekday, input)).or_default().push(next_digits);
            stats.by_input.entry(input).or_default().push(next_digits);

            for &d in &next_digits {
                stats.global_digit_frequency[d as usize] += 1;
            }

            for pos in 0..4 {
                stats
                    .positional_transitions
                    .entry((pos, input[pos]))
                    .or_default()
                    .record(next_digits[pos]);
            }

            if has_repeated_digit(&next_digits) {
                stats.losing_by_input.entry(input).or_default().push(next_digits);

                consecutive_losses += 1;
                let peak = stats.loss_streak_peak_by_input.entry(input).or_insert(0);
                *peak = (*peak).max(consecutive_losses);

                current_streak.push(LossStep {
                    input,
                    weekday,
                    result: next_digits,
                    position_in_streak: consecutive_losses,
                });

                if consecutive_losses > DANGER_STREAK {
                    let tail5 = current_streak.len().saturating_sub(5);
                    let tail3 = current_streak.len().saturating_sub(3);
                    stats.danger_contexts.push(DangerContext {
                        streak_length: consecutive_losses,
                        recent_inputs: current_streak[tail5..].iter().map(|s| s.input).collect(),
                        recent_weekdays: current_streak[tail5..].iter().map(|s| s.weekday).collect(),
                        dangerous_steps: current_streak[tail3..].to_vec(),
                    });
                }
            } else {
                stats.winning_by_input.entry(input).or_default().push(next_digits);

                if consecutive_losses > 0 {
                    let context = stats.streak_break_contexts.entry((input, weekday)).or_default();
                    for &d in &next_digits {
                        context.safe_digits[d as usize] += consecutive_losses;
                    }
                    context.streaks_broken.push(consecutive_losses);
                    context.total_uses += 1;

                    consecutive_losses = 0;
                    current_streak.clear();
                }
            }
        }

        stats.derive_anti_loss(records.len());

        log::debug!(
            "Statistiques construites : {} paires, {} entrées distinctes, {} contextes dangereux",
            stats.pairs_scanned,
            stats.by_input.len(),
            stats.danger_contexts.len()
        );

        stats
    }

    fn derive_anti_loss(&mut self, total_records: usize) {
        let mut breaker_weights = [0u32; 10];
        for (key, context) in &self.streak_break_contexts {
            if context.total_uses == 0 {
                continue;
            }
            let avg = context.average_broken();
            if avg >= SAFE_MIN_AVG_BROKEN {
                self.safe_combinations.insert(*key, SafeCombination {
                    top_safe_digits: top_digits(&context.safe_digits, 6),
                    effectiveness: avg * context.total_uses as f64,
                });
                for d in top_digits(&context.safe_digits, 4) {
                    breaker_weights[d as usize] += context.safe_digits[d as usize];
                }
            }
        }
        self.proven_streak_breakers = top_digits(&breaker_weights, 10)
            .into_iter()
            .filter(|&d| breaker_weights[d as usize] >= STREAK_BREAKER_MIN_WEIGHT)
            .collect();

        for context in &self.danger_contexts {
            if context.streak_length <= SEVERE_DANGER_STREAK {
                continue;
            }
            for step in &context.dangerous_steps {
                let entry = self.danger_avoidance.entry((step.input, step.weekday)).or_default();
                for &d in &step.result {
                    entry.avoid_digits[d as usize] += context.streak_length;
                }
                entry.danger_level += context.streak_length;
            }
        }

        if total_records >= RECENT_KEPT {
            let mut recent = [0u32; 10];
            for result in &self.recent_results {
                for &d in result {
                    recent[d as usize] += 1;
                }
            }
            self.trending_digits = top_digits(&recent, 4);
        }

        self.optimal_fillers = top_digits(&self.global_digit_frequency, 6);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs_scanned == 0
    }

    /// Vrai si cette entrée a déjà figuré dans une série de pertes d'au moins `threshold`.
    pub fn is_high_risk(&self, input: &Digits, threshold: u32) -> bool {
        self.loss_streak_peak_by_input
            .get(input)
            .is_some_and(|&peak| peak >= threshold)
    }

    /// Chiffre suivant le plus fréquent à cette position ; à égalité, le premier observé.
    pub fn most_common_successor(&self, position: usize, digit: u8) -> Option<u8> {
        self.positional_transitions.get(&(position, digit))?.most_common()
    }

    /// Les `n` résultats suivants les plus fréquents pour (jour, entrée) ;
    /// à égalité, l'ordre d'apparition est conservé.
    pub fn top_weekday_successors(&self, weekday: Weekday, input: &Digits, n: usize) -> Vec<Digits> {
        let Some(successors) = self.by_weekday_input.get(&(weekday, *input)) else {
            return Vec::new();
        };
        let mut counted: Vec<(Digits, usize)> = Vec::new();
        for next in successors {
            match counted.iter_mut().find(|(d, _)| d == next) {
                Some((_, count)) => *count += 1,
                None => counted.push((*next, 1)),
            }
        }
        counted.sort_by(|a, b| b.1.cmp(&a.1));
        counted.into_iter().take(n).map(|(d, _)| d).collect()
    }

    /// Fréquence des chiffres sur les `window` derniers tirages valides.
    pub fn recent_digit_frequency(&self, window: usize) -> [u32; 10] {
        let start = self.recent_results.len().saturating_sub(window);
        let mut freq = [0u32; 10];
        for result in &self.recent_results[start..] {
            for &d in result {
                freq[d as usize] += 1;
            }
        }
        freq
    }
}

/// Chiffres de compte non nul, triés par compte décroissant puis chiffre croissant.
pub fn top_digits(counts: &[u32; 10], n: usize) -> Vec<u8> {
    let mut digits: Vec<u8> = (0..10u8).filter(|&d| counts[d as usize] > 0).collect();
    digits.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]).then(a.cmp(&b)));
    digits.truncate(n);
    digits
}

/// Jeu de tirages de test : dates consécutives, résultats variés avec quelques répétitions.
pub fn make_test_records(n: usize) -> Vec<DrawRecord> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            let base = (i * 7 + 3) % 10;
            let result = if i % 5 == 4 {
                format!("{}{}{}{}", base, base, (base + 1) % 10, (base + 2) % 10)
            } else {
                format!("{}{}{}{}", base, (base + 1) % 10, (base + 3) % 10, (base + 6) % 10)
            };
            DrawRecord::new(date, Weekday::from_date(date), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, result: &str) -> DrawRecord {
        let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        DrawRecord::new(date, Weekday::from_date(date), result)
    }

    #[test]
    fn test_empty_and_single_record() {
        assert!(TransitionStats::build(&[]).is_empty());
        let stats = TransitionStats::build(&[record("2024-01-01", "1234")]);
        assert!(stats.is_empty());
        assert!(stats.by_input.is_empty());
        assert_eq!(stats.recent_results, vec![[1, 2, 3, 4]]);
    }

    #[test]
    fn test_transition_lists() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "5678"),
            record("2024-01-03", "1234"),
            record("2024-01-04", "9012"),
        ];
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.pairs_scanned, 3);
        assert_eq!(stats.by_input[&[1, 2, 3, 4]], vec![[5, 6, 7, 8], [9, 0, 1, 2]]);
        assert_eq!(stats.by_weekday_input[&(Weekday::Senin, [1, 2, 3, 4])], vec![[5, 6, 7, 8]]);
        assert_eq!(stats.by_weekday_input[&(Weekday::Rabu, [1, 2, 3, 4])], vec![[9, 0, 1, 2]]);
        assert_eq!(stats.global_digit_frequency.iter().sum::<u32>(), 12);
        assert_eq!(stats.global_digit_frequency[1], 2);
        assert_eq!(stats.positional_transitions[&(0, 1)].counts[5], 1);
        assert_eq!(stats.positional_transitions[&(0, 1)].counts[9], 1);
        assert_eq!(stats.positional_transitions[&(0, 1)].first_seen, vec![5, 9]);
    }

    #[test]
    fn test_malformed_pairs_skipped() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "56"),
            record("2024-01-03", "1234"),
            record("2024-01-04", "5678"),
        ];
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.pairs_scanned, 1);
        assert_eq!(stats.recent_results.len(), 3);
    }

    #[test]
    fn test_win_loss_split_and_peaks() {
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "1123"),
            record("2024-01-03", "2234"),
            record("2024-01-04", "5678"),
        ];
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.losing_by_input[&[1, 2, 3, 4]], vec![[1, 1, 2, 3]]);
        assert_eq!(stats.losing_by_input[&[1, 1, 2, 3]], vec![[2, 2, 3, 4]]);
        assert_eq!(stats.winning_by_input[&[2, 2, 3, 4]], vec![[5, 6, 7, 8]]);
        assert!(stats.is_high_risk(&[1, 1, 2, 3], 2));
        assert!(!stats.is_high_risk(&[1, 2, 3, 4], 2));

        let context = &stats.streak_break_contexts[&([2, 2, 3, 4], Weekday::Rabu)];
        assert_eq!(context.streaks_broken, vec![2]);
        assert_eq!(context.safe_digits[5], 2);
        assert_eq!(context.total_uses, 1);
    }

    #[test]
    fn test_danger_contexts_after_fifteen_losses() {
        let mut records = vec![record("2024-01-01", "1234")];
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for i in 0..21 {
            let date = start + chrono::Duration::days(i);
            records.push(DrawRecord::new(date, Weekday::from_date(date), "1123"));
        }
        let stats = TransitionStats::build(&records);
        // séries 16..=21
        assert_eq!(stats.danger_contexts.len(), 6);
        assert_eq!(stats.danger_contexts[0].streak_length, 16);
        assert_eq!(stats.danger_contexts[0].dangerous_steps.len(), 3);
        assert_eq!(stats.danger_contexts[0].recent_inputs.len(), 5);
        // seules les séries > 19 alimentent l'évitement
        let total_level: u32 = stats.danger_avoidance.values().map(|a| a.danger_level).sum();
        assert_eq!(total_level, 3 * 20 + 3 * 21);
    }

    #[test]
    fn test_safe_combinations_and_breakers() {
        let mut records = vec![record("2024-01-01", "1234")];
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for i in 0..12 {
            let date = start + chrono::Duration::days(i);
            records.push(DrawRecord::new(date, Weekday::from_date(date), "1123"));
        }
        let date = start + chrono::Duration::days(12);
        records.push(DrawRecord::new(date, Weekday::from_date(date), "5678"));
        let stats = TransitionStats::build(&records);

        assert_eq!(stats.safe_combinations.len(), 1);
        let combo = stats.safe_combinations.values().next().unwrap();
        assert_eq!(combo.top_safe_digits, vec![5, 6, 7, 8]);
        assert!((combo.effectiveness - 12.0).abs() < 1e-9);
        // 12 < 50 : aucun chiffre n'atteint le poids minimal
        assert!(stats.proven_streak_breakers.is_empty());
    }

    #[test]
    fn test_most_common_successor_ties_to_first_seen() {
        // position 0 : 1 -> 7 puis 1 -> 3, égalité à un
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "7890"),
            record("2024-01-03", "1234"),
            record("2024-01-04", "3456"),
        ];
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.most_common_successor(0, 1), Some(7));
        assert_eq!(stats.most_common_successor(0, 5), None);

        // un second 1 -> 3 fait passer 3 devant
        let mut records = records;
        records.push(record("2024-01-05", "1234"));
        records.push(record("2024-01-06", "3456"));
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.most_common_successor(0, 1), Some(3));
    }

    #[test]
    fn test_successor_counts_most_common() {
        let mut counts = SuccessorCounts::default();
        assert_eq!(counts.most_common(), None);
        for d in [6, 2, 2, 6, 0] {
            counts.record(d);
        }
        assert_eq!(counts.most_common(), Some(6));
        counts.record(0);
        counts.record(0);
        assert_eq!(counts.most_common(), Some(0));
    }

    #[test]
    fn test_top_weekday_successors_keeps_first_seen() {
        // 2024-01-01, 01-08, 01-15 et 01-22 sont des lundis
        let records = vec![
            record("2024-01-01", "1234"),
            record("2024-01-02", "5678"),
            record("2024-01-08", "1234"),
            record("2024-01-09", "9012"),
            record("2024-01-15", "1234"),
            record("2024-01-16", "9012"),
            record("2024-01-22", "1234"),
            record("2024-01-23", "3456"),
        ];
        let stats = TransitionStats::build(&records);
        let top = stats.top_weekday_successors(Weekday::Senin, &[1, 2, 3, 4], 3);
        assert_eq!(top, vec![[9, 0, 1, 2], [5, 6, 7, 8], [3, 4, 5, 6]]);
        assert!(stats.top_weekday_successors(Weekday::Kamis, &[1, 2, 3, 4], 3).is_empty());
    }

    #[test]
    fn test_recent_frequency_and_trending() {
        let records = make_test_records(120);
        let stats = TransitionStats::build(&records);
        assert_eq!(stats.recent_results.len(), RECENT_KEPT);
        let freq = stats.recent_digit_frequency(50);
        assert_eq!(freq.iter().sum::<u32>(), 200);
        assert_eq!(stats.trending_digits.len(), 4);
        assert_eq!(stats.optimal_fillers.len(), 6);
    }

    #[test]
    fn test_build_is_pure() {
        let records = make_test_records(60);
        let a = TransitionStats::build(&records);
        let b = TransitionStats::build(&records);
        assert_eq!(a.by_input, b.by_input);
        assert_eq!(a.global_digit_frequency, b.global_digit_frequency);
        assert_eq!(a.optimal_fillers, b.optimal_fillers);
        assert_eq!(a.proven_streak_breakers, b.proven_streak_breakers);
    }

    #[test]
    fn test_top_digits_ordering() {
        let counts = [3, 0, 5, 3, 0, 0, 1, 0, 0, 5];
        assert_eq!(top_digits(&counts, 4), vec![2, 9, 0, 3]);
        assert_eq!(top_digits(&counts, 10), vec![2, 9, 0, 3, 6]);
    }
}
