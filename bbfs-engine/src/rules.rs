use bbfs_db::models::parse_result;

/// Un résultat avec un chiffre répété (1123, 1114, ...) est toujours perdant.
pub fn has_repeated_digit(digits: &[u8]) -> bool {
    let mut seen = [false; 10];
    for &d in digits {
        let idx = d as usize;
        if idx >= seen.len() || seen[idx] {
            return true;
        }
        seen[idx] = true;
    }
    false
}

/// Condition de gain : `actual` sans chiffre répété et entièrement couvert par `candidates`.
pub fn is_win(candidates: &[u8], actual: &str) -> bool {
    match parse_result(actual) {
        Some(digits) => is_win_digits(candidates, &digits),
        None => false,
    }
}

pub fn is_win_digits(candidates: &[u8], actual: &[u8; 4]) -> bool {
    if has_repeated_digit(actual) {
        return false;
    }
    actual.iter().all(|d| candidates.contains(d))
}
