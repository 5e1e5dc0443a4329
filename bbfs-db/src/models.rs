use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Nombre de chiffres d'un résultat 4D.
pub const RESULT_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl Weekday {
    /// Nom canonique, tel que stocké en base.
    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Senin => "senin",
            Weekday::Selasa => "selasa",
            Weekday::Rabu => "rabu",
            Weekday::Kamis => "kamis",
            Weekday::Jumat => "jumat",
            Weekday::Sabtu => "sabtu",
            Weekday::Minggu => "minggu",
        }
    }

    /// Accepte les noms indonésiens et anglais, sans tenir compte de la casse.
    pub fn from_name(name: &str) -> Option<Weekday> {
        match name.trim().to_lowercase().as_str() {
            "senin" | "monday" => Some(Weekday::Senin),
            "selasa" | "tuesday" => Some(Weekday::Selasa),
            "rabu" | "wednesday" => Some(Weekday::Rabu),
            "kamis" | "thursday" => Some(Weekday::Kamis),
            "jumat" | "friday" => Some(Weekday::Jumat),
            "sabtu" | "saturday" => Some(Weekday::Sabtu),
            "minggu" | "sunday" => Some(Weekday::Minggu),
            _ => None,
        }
    }

    pub fn from_date(date: NaiveDate) -> Weekday {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Senin,
            chrono::Weekday::Tue => Weekday::Selasa,
            chrono::Weekday::Wed => Weekday::Rabu,
            chrono::Weekday::Thu => Weekday::Kamis,
            chrono::Weekday::Fri => Weekday::Jumat,
            chrono::Weekday::Sat => Weekday::Sabtu,
            chrono::Weekday::Sun => Weekday::Minggu,
        }
    }

    /// Normalise un nom de jour ; un nom inconnu retombe sur le jour réel de `date`.
    pub fn standardize(name: &str, date: NaiveDate) -> Weekday {
        Weekday::from_name(name).unwrap_or_else(|| Weekday::from_date(date))
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub result: String,
}

impl DrawRecord {
    pub fn new(date: NaiveDate, weekday: Weekday, result: impl Into<String>) -> Self {
        Self {
            date,
            weekday,
            result: result.into(),
        }
    }

    /// `None` si le résultat n'est pas composé d'exactement 4 chiffres.
    pub fn digits(&self) -> Option<[u8; RESULT_LEN]> {
        parse_result(&self.result)
    }
}

pub fn parse_result(s: &str) -> Option<[u8; RESULT_LEN]> {
    let bytes = s.as_bytes();
    if bytes.len() != RESULT_LEN {
        return None;
    }
    let mut digits = [0u8; RESULT_LEN];
    for (slot, &b) in digits.iter_mut().zip(bytes) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(digits)
}

pub fn format_digits(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

pub fn validate_result(result: &str) -> Result<[u8; RESULT_LEN]> {
    match parse_result(result) {
        Some(digits) => Ok(digits),
        None => bail!("Résultat invalide '{}' : 4 chiffres attendus", result),
    }
}

/// Trie par date (tri stable) et supprime les doublons (date, résultat),
/// la première occurrence est conservée.
pub fn normalize_records(records: Vec<DrawRecord>) -> Vec<DrawRecord> {
    let mut records = records;
    records.sort_by_key(|r| r.date);
    let mut seen = std::collections::HashSet::new();
    records.retain(|r| seen.insert((r.date, r.result.clone())));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_result_ok() {
        assert_eq!(parse_result("1234"), Some([1, 2, 3, 4]));
        assert_eq!(parse_result("0090"), Some([0, 0, 9, 0]));
    }

    #[test]
    fn test_parse_result_rejects_malformed() {
        assert_eq!(parse_result("123"), None);
        assert_eq!(parse_result("12345"), None);
        assert_eq!(parse_result("12a4"), None);
        assert_eq!(parse_result(""), None);
    }

    #[test]
    fn test_validate_result() {
        assert!(validate_result("5678").is_ok());
        assert!(validate_result("56-8").is_err());
    }

    #[test]
    fn test_format_digits() {
        assert_eq!(format_digits(&[0, 1, 5, 9]), "0159");
    }

    #[test]
    fn test_weekday_from_name() {
        assert_eq!(Weekday::from_name("Senin"), Some(Weekday::Senin));
        assert_eq!(Weekday::from_name("FRIDAY"), Some(Weekday::Jumat));
        assert_eq!(Weekday::from_name(" minggu "), Some(Weekday::Minggu));
        assert_eq!(Weekday::from_name("lundi"), None);
    }

    #[test]
    fn test_weekday_standardize_falls_back_to_date() {
        // 2024-01-01 est un lundi
        assert_eq!(Weekday::standardize("???", day(2024, 1, 1)), Weekday::Senin);
        assert_eq!(Weekday::standardize("sabtu", day(2024, 1, 1)), Weekday::Sabtu);
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let records = vec![
            DrawRecord::new(day(2024, 1, 3), Weekday::Rabu, "3333"),
            DrawRecord::new(day(2024, 1, 1), Weekday::Senin, "1111"),
            DrawRecord::new(day(2024, 1, 3), Weekday::Rabu, "3333"),
            DrawRecord::new(day(2024, 1, 2), Weekday::Selasa, "2222"),
        ];
        let normalized = normalize_records(records);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].result, "1111");
        assert_eq!(normalized[1].result, "2222");
        assert_eq!(normalized[2].result, "3333");
    }

    #[test]
    fn test_record_digits() {
        let record = DrawRecord::new(day(2024, 1, 1), Weekday::Senin, "9071");
        assert_eq!(record.digits(), Some([9, 0, 7, 1]));
        let bad = DrawRecord::new(day(2024, 1, 1), Weekday::Senin, "907");
        assert_eq!(bad.digits(), None);
    }
}
