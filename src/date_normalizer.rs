use crate::error::{ParseError, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

/// `strftime` layout of a normalized date line
pub const CANONICAL_FORMAT: &str = "%a %d %b %H:%M:%S %Y";

/// Layout parsed once the weekday is set aside
const DATE_FORMAT: &str = "%d %b %H:%M:%S %Y";

static TIME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn time_pattern() -> &'static Regex {
    TIME_PATTERN.get_or_init(|| {
        Regex::new(r"\w{3} \d{2}:\d{2}:\d{2}|\d{2}:\d{2}:\d{2} \w{3}")
            .expect("time pattern is a valid regex")
    })
}

/// Handles the `date` output lines written by the cron job.
///
/// The job's locale has changed over time, so the tokens arrive partially ordered:
/// the weekday always leads, day-number and month occupy the next two slots in
/// either order, and the year, time and an optional zone follow in any order.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Reorder a date line into `<weekday> <day> <month> <time> <year>`.
    ///
    /// Day and month are told apart lexicographically (digits sort before letters).
    /// Year and time are told apart by length: the time is the longest leftover token
    /// and the year the next longest. Anything shorter, such as a zone name, is dropped.
    pub fn normalize(line: &str) -> Result<String> {
        if !time_pattern().is_match(line) {
            return Err(ParseError::NotApplicable("date"));
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 5 {
            return Err(ParseError::NotApplicable("date"));
        }

        let weekday = tokens[0];
        let mut day_month = [tokens[1], tokens[2]];
        day_month.sort_unstable();
        let [day, month] = day_month;

        let mut rest = tokens[3..].to_vec();
        rest.sort_by_key(|token| token.len());
        let time = rest[rest.len() - 1];
        let year = rest[rest.len() - 2];

        Ok(format!("{weekday} {day} {month} {time} {year}"))
    }

    /// Parse a string produced by [`DateNormalizer::normalize`].
    /// The weekday is not checked against the calendar date.
    pub fn parse_canonical(canonical: &str) -> Result<NaiveDateTime> {
        let dated = canonical
            .split_once(' ')
            .map_or(canonical, |(_weekday, rest)| rest);
        NaiveDateTime::parse_from_str(dated, DATE_FORMAT).map_err(|source| {
            ParseError::InvalidDate {
                value: canonical.to_string(),
                source,
            }
        })
    }

    /// Normalize and parse in one step
    pub fn parse(line: &str) -> Result<NaiveDateTime> {
        Self::parse_canonical(&Self::normalize(line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expected() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 14)
            .unwrap()
            .and_hms_opt(9, 15, 42)
            .unwrap()
    }

    #[test]
    fn test_normalize_permutations() {
        let lines = [
            "Tue 14 Mar 2023 09:15:42",
            "Tue Mar 14 2023 09:15:42",
            "Tue 14 Mar 09:15:42 2023",
            "Tue Mar 14 09:15:42 2023",
        ];
        for line in lines {
            assert_eq!(
                DateNormalizer::normalize(line).unwrap(),
                "Tue 14 Mar 09:15:42 2023",
                "line: {line}"
            );
        }
    }

    #[test]
    fn test_normalize_drops_zone() {
        assert_eq!(
            DateNormalizer::normalize("Tue 14 Mar 09:15:42 GMT 2023").unwrap(),
            "Tue 14 Mar 09:15:42 2023"
        );
        assert_eq!(
            DateNormalizer::normalize("Tue Mar 14 09:15:42 GMT 2023").unwrap(),
            "Tue 14 Mar 09:15:42 2023"
        );
        assert_eq!(
            DateNormalizer::normalize("Tue 14 Mar 2023 09:15:42 BST").unwrap(),
            "Tue 14 Mar 09:15:42 2023"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(DateNormalizer::parse("Tue Mar 14 09:15:42 GMT 2023").unwrap(), expected());
        assert_eq!(
            DateNormalizer::parse_canonical("Tue 14 Mar 09:15:42 2023").unwrap(),
            expected()
        );
    }

    #[test]
    fn test_single_digit_day() {
        let parsed = DateNormalizer::parse("Sat 4 Mar 07:00:01 GMT 2023").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2023, 3, 4).unwrap());
    }

    #[test]
    fn test_not_a_date_line() {
        for line in ["---", r#"{"error":[]}"#, "Quantity: 45 GBP: 0.0050 XBT", "Tue 14 Mar"] {
            assert!(matches!(
                DateNormalizer::normalize(line),
                Err(ParseError::NotApplicable("date"))
            ));
        }
    }

    #[test]
    fn test_wrong_weekday_keeps_logged_date() {
        assert_eq!(DateNormalizer::parse("Mon 14 Mar 09:15:42 GMT 2023").unwrap(), expected());
        assert_eq!(DateNormalizer::parse("Fri Mar 14 09:15:42 UTC 2023").unwrap(), expected());
    }

    #[test]
    fn test_impossible_date_is_invalid() {
        let err = DateNormalizer::parse("Tue 31 Feb 09:15:42 GMT 2023").unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { .. }));

        let err = DateNormalizer::parse("Tue 14 Foo 09:15:42 GMT 2023").unwrap_err();
        assert!(matches!(err, ParseError::InvalidDate { .. }));
    }
}
