use instantpick_db::models::{Draw, HistoryError, HistoryRow};

/// En dessous de ce nombre de tirages normalisés, les méthodes historiques sont désactivées.
pub const MIN_HISTORY_DRAWS: usize = 20;

/// Transforme les lignes brutes (du plus récent au plus ancien) en série chronologique.
pub fn normalize_history(
    rows: &[HistoryRow],
    min: u32,
    max: u32,
    exclude_zero: bool,
) -> Result<Vec<Draw>, HistoryError> {
    let mut draws = Vec::with_capacity(rows.len());

    for row in rows.iter().rev() {
        let mut numbers: Vec<u32> = row
            .main_values
            .iter()
            .flatten()
            .flat_map(|value| tokenize(value))
            .filter_map(parse_token)
            .filter(|&n| !(exclude_zero && n == 0))
            .filter(|&n| n >= min && n <= max)
            .collect();

        numbers.sort_unstable();
        numbers.dedup();

        if numbers.is_empty() {
            continue;
        }

        draws.push(Draw {
            date: row.date.clone(),
            numbers,
        });
    }

    if draws.len() < MIN_HISTORY_DRAWS {
        return Err(HistoryError::InsufficientHistory {
            found: draws.len(),
            required: MIN_HISTORY_DRAWS,
        });
    }

    log::debug!("Normalized {} draws out of {} rows", draws.len(), rows.len());
    Ok(draws)
}

// "1,2,3" ou une valeur unique
fn tokenize(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// "07" -> 7, "0" -> 0, "000" -> 0, "abc" -> 0, "+4" -> 4.
/// Seuls les chiffres de tête comptent ; un nombre négatif n'entre dans aucune plage.
fn parse_token(token: &str) -> Option<u32> {
    if token == "0" {
        return Some(0);
    }
    let (negative, unsigned) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let significant = unsigned[..digits_end].trim_start_matches('0');
    if significant.is_empty() {
        return Some(0);
    }
    if negative {
        return None;
    }
    significant.parse::<u32>().ok()
}

#[cfg(test)]
pub(crate) fn make_test_rows(numbers_newest_first: &[&str]) -> Vec<HistoryRow> {
    let n = numbers_newest_first.len();
    numbers_newest_first
        .iter()
        .enumerate()
        .map(|(i, numbers)| HistoryRow {
            date: format!("2024-{:02}-{:02}", (n - i) / 28 + 1, (n - i) % 28 + 1),
            main_values: vec![Some(numbers.to_string())],
            extra_value: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("0"), Some(0));
        assert_eq!(parse_token("07"), Some(7));
        assert_eq!(parse_token("000"), Some(0));
        assert_eq!(parse_token("42"), Some(42));
        assert_eq!(parse_token("12abc"), Some(12));
        assert_eq!(parse_token("abc"), Some(0));
        assert_eq!(parse_token("-3"), None);
        assert_eq!(parse_token("-0"), Some(0));
        assert_eq!(parse_token("+4"), Some(4));
        assert_eq!(parse_token("99999999999"), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("01, 02 ,03"), vec!["01", "02", "03"]);
        assert_eq!(tokenize(" 17 "), vec!["17"]);
        assert_eq!(tokenize(",,"), Vec::<&str>::new());
    }

    #[test]
    fn test_normalize_chronological_order() {
        let values: Vec<String> = (1..=25).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let rows = make_test_rows(&refs);

        let draws = normalize_history(&rows, 1, 69, true).unwrap();
        assert_eq!(draws.len(), 25);
        // la ligne la plus récente arrive en dernier
        assert_eq!(draws[0].numbers, vec![25]);
        assert_eq!(draws[24].numbers, vec![1]);
        assert_eq!(draws[24].date, rows[0].date);
    }

    #[test]
    fn test_normalize_filters_dedupes_and_sorts() {
        let mut rows = make_test_rows(&["05,03,03,70,0,007"; 20]);
        rows[0].main_values.push(Some("12".to_string()));
        rows[0].main_values.push(None);

        let draws = normalize_history(&rows, 1, 69, true).unwrap();
        assert_eq!(draws[0].numbers, vec![3, 5, 7]);
        assert_eq!(draws[19].numbers, vec![3, 5, 7, 12]);
    }

    #[test]
    fn test_normalize_keeps_zero_for_digit_game() {
        let rows = make_test_rows(&["0,4,9,10"; 20]);
        let draws = normalize_history(&rows, 0, 9, false).unwrap();
        assert_eq!(draws[0].numbers, vec![0, 4, 9]);
    }

    #[test]
    fn test_normalize_non_numeric_token_reads_as_zero() {
        let rows = make_test_rows(&["abc,5"; 20]);

        let digits = normalize_history(&rows, 0, 9, false).unwrap();
        assert_eq!(digits[0].numbers, vec![0, 5]);

        let lotto = normalize_history(&rows, 1, 69, true).unwrap();
        assert_eq!(lotto[0].numbers, vec![5]);
    }

    #[test]
    fn test_normalize_drops_empty_rows() {
        let mut values = vec!["1,2,3"; 20];
        values.push("80,90");
        values.push("");
        let rows = make_test_rows(&values);
        let draws = normalize_history(&rows, 1, 69, true).unwrap();
        assert_eq!(draws.len(), 20);
    }

    #[test]
    fn test_normalize_insufficient_history() {
        let mut values = vec!["1,2,3"; 19];
        values.push("99");
        let rows = make_test_rows(&values);
        match normalize_history(&rows, 1, 69, true) {
            Err(HistoryError::InsufficientHistory { found, required }) => {
                assert_eq!(found, 19);
                assert_eq!(required, MIN_HISTORY_DRAWS);
            }
            other => panic!("InsufficientHistory attendu, reçu {:?}", other),
        }
    }
}
