// Small numeric helpers shared by the loader, the aggregation and the
// console preview.
use num_format::{Locale, ToFormattedString};

use crate::types::RatingScale;

/// Outcome of reading one rating cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingCell {
    /// Empty cell: survey sent, no answer.
    Missing,
    Rated(u8),
    /// Present but not an integer inside the scale.
    Invalid,
}

/// Parse a rating cell from the export.
///
/// - Trims whitespace; an empty cell is `Missing`.
/// - Accepts integral values written either as `4` or `4.0`, since
///   spreadsheet tools often store ratings as floats.
/// - Anything non-numeric, fractional or outside `scale` is `Invalid`.
pub fn parse_rating(s: Option<&str>, scale: RatingScale) -> RatingCell {
    let Some(s) = s.map(str::trim) else {
        return RatingCell::Missing;
    };
    if s.is_empty() {
        return RatingCell::Missing;
    }
    let value = match s.parse::<u8>() {
        Ok(v) => v,
        Err(_) => match s.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&f) => f as u8,
            _ => return RatingCell::Invalid,
        },
    };
    if scale.contains(value) {
        RatingCell::Rated(value)
    } else {
        RatingCell::Invalid
    }
}

/// Round to one decimal place, halves to even (`2.25` -> `2.2`).
pub fn round1(n: f64) -> f64 {
    (n * 10.0).round_ties_even() / 10.0
}

/// `part / whole * 100` rounded to one decimal; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// `weighted_sum / count` rounded to one decimal; 0 when `count` is 0.
pub fn weighted_average(weighted_sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round1(weighted_sum as f64 / count as f64)
}

/// Render a one-decimal metric for the console (`66.7`, `5.0`, `0.0`).
pub fn format_decimal(n: &f64) -> String {
    format!("{:.1}", n)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thousands separators for counts in log lines (e.g. `9,855 rows`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: RatingScale = RatingScale { min: 1, max: 5 };

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(None, SCALE), RatingCell::Missing);
        assert_eq!(parse_rating(Some("   "), SCALE), RatingCell::Missing);
        assert_eq!(parse_rating(Some("4"), SCALE), RatingCell::Rated(4));
        assert_eq!(parse_rating(Some(" 5.0 "), SCALE), RatingCell::Rated(5));
        assert_eq!(parse_rating(Some("4.5"), SCALE), RatingCell::Invalid);
        assert_eq!(parse_rating(Some("0"), SCALE), RatingCell::Invalid);
        assert_eq!(parse_rating(Some("6"), SCALE), RatingCell::Invalid);
        assert_eq!(parse_rating(Some("N/A"), SCALE), RatingCell::Invalid);
        assert_eq!(parse_rating(Some("-1"), SCALE), RatingCell::Invalid);
    }

    #[test]
    fn test_ratios_handle_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(weighted_average(0, 0), 0.0);
        assert!(!percentage(0, 0).is_nan());
    }

    #[test]
    fn test_ratios_round_to_one_decimal() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(3, 3), 100.0);
        assert_eq!(weighted_average(10, 2), 5.0);
        assert_eq!(weighted_average(13, 3), 4.3);
        assert_eq!(weighted_average(14, 3), 4.7);
    }

    #[test]
    fn test_exact_halves_round_to_even() {
        assert_eq!(weighted_average(9, 4), 2.2);
        assert_eq!(weighted_average(11, 4), 2.8);
        assert_eq!(percentage(1, 16), 6.2);
        assert_eq!(percentage(3, 16), 18.8);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_decimal(&5.0), "5.0");
        assert_eq!(format_decimal(&66.66), "66.7");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
