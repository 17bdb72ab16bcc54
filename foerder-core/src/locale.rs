//! Locale value parsers: German budget and deadline notations.
//!
//! Program records carry budgets like "bis zu 10.000 €" or "1,5 Mio €" and
//! deadlines like "Einreichung bis 31.03.2026" or "laufend". Everything that
//! compares, filters or sorts programs goes through this module; raw strings
//! are never compared directly.

use std::sync::LazyLock;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// Constant patterns, tried in this order by `parse_budget`.
static GROUPED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:\.[0-9]{3})+(?:,[0-9]+)?").expect("constant regex pattern is valid")
});
static DECIMAL_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+,[0-9]+").expect("constant regex pattern is valid"));
static PLAIN_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("constant regex pattern is valid"));

static GERMAN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<day>[0-9]{1,2})\.(?P<month>[0-9]{1,2})\.(?P<year>[0-9]{4})")
        .expect("constant regex pattern is valid")
});

/// How a raw deadline string was understood.
///
/// Filtering and sorting only ever see `parse_deadline`'s `Option`, where
/// `Ongoing` and `Unparsable` both collapse to `None`. This type exists so
/// callers can tell the two apart in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineKind {
    Fixed(NaiveDate),
    Ongoing,
    Unparsable,
}

/// Parse a German budget string into an amount in euros.
///
/// Never fails: text without a usable number yields `0.0`.
pub fn parse_budget(raw: &str) -> f64 {
    let lower = raw.to_lowercase();
    let multiplier = if lower.contains("mio") || lower.contains("million") {
        1_000_000.0
    } else if lower.contains("tsd") || lower.contains("tausend") {
        1_000.0
    } else {
        1.0
    };

    let Some(matched) = [&*GROUPED_AMOUNT, &*DECIMAL_AMOUNT, &*PLAIN_AMOUNT]
        .iter()
        .find_map(|re| re.find(raw))
    else {
        return 0.0;
    };

    let normalized = matched.as_str().replace('.', "").replace(',', ".");
    let value: f64 = normalized.parse().unwrap_or(0.0);
    value * multiplier
}

/// Parse a deadline string into a calendar date.
///
/// Returns `None` for "laufend" (ongoing) and also for anything without a
/// `D.M.YYYY` date in it.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    match classify_deadline(raw) {
        DeadlineKind::Fixed(date) => Some(date),
        DeadlineKind::Ongoing | DeadlineKind::Unparsable => None,
    }
}

pub fn classify_deadline(raw: &str) -> DeadlineKind {
    if raw.to_lowercase().contains("laufend") {
        return DeadlineKind::Ongoing;
    }

    let Some(caps) = GERMAN_DATE.captures(raw) else {
        return DeadlineKind::Unparsable;
    };

    let day: u32 = match caps["day"].parse() {
        Ok(d) => d,
        Err(_) => return DeadlineKind::Unparsable,
    };
    let month: u32 = match caps["month"].parse() {
        Ok(m) => m,
        Err(_) => return DeadlineKind::Unparsable,
    };
    let year: i32 = match caps["year"].parse() {
        Ok(y) => y,
        Err(_) => return DeadlineKind::Unparsable,
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(DeadlineKind::Fixed)
        .unwrap_or(DeadlineKind::Unparsable)
}

/// Midnight of `date` in `tz`, as a UTC instant.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // No local midnight that day (DST gap); fall back to UTC midnight.
        .unwrap_or_else(|| naive.and_utc())
}

/// Whole days from `reference` until the deadline's local midnight, rounded up.
///
/// Negative for past deadlines. `None` when the deadline has no fixed date.
pub fn days_until_deadline(raw: &str, reference: DateTime<Utc>, tz: Tz) -> Option<i64> {
    let date = parse_deadline(raw)?;
    let millis = (local_midnight(date, tz) - reference).num_milliseconds();
    Some(ceil_div(millis, MILLIS_PER_DAY))
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Format an amount the way budgets are shown to users.
pub fn format_budget(value: f64) -> String {
    if value >= 1_000_000.0 {
        let millions = (value / 1_000_000.0 * 10.0).round() / 10.0;
        let text = if millions.fract() == 0.0 {
            format!("{millions:.0}")
        } else {
            format!("{millions:.1}").replace('.', ",")
        };
        format!("{text} Mio €")
    } else if value >= 1_000.0 {
        format!("{} €", group_thousands(value.round() as u64))
    } else {
        format!("{:.0} €", value.round())
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Short German status line for a days-until value.
pub fn format_deadline_status(days: Option<i64>) -> String {
    match days {
        None => "laufend".to_string(),
        Some(d) if d < 0 => "abgelaufen".to_string(),
        Some(0) => "heute".to_string(),
        Some(1) => "morgen".to_string(),
        Some(d) => format!("noch {d} Tage"),
    }
}

/// Parse an IANA timezone name like "Europe/Berlin".
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_budget_fixtures() {
        assert_eq!(parse_budget("5.000€"), 5000.0);
        assert_eq!(parse_budget("1,5 Mio €"), 1_500_000.0);
        assert_eq!(parse_budget("50 Tsd €"), 50_000.0);
        assert_eq!(parse_budget("Max. 10.000 €"), 10_000.0);
        assert_eq!(parse_budget("Ausstattung"), 0.0);
    }

    #[test]
    fn test_parse_budget_notations() {
        assert_eq!(parse_budget("10.000,50 €"), 10_000.5);
        assert_eq!(parse_budget("5,5"), 5.5);
        assert_eq!(parse_budget("5000"), 5000.0);
        assert_eq!(parse_budget("bis zu 2 Millionen Euro"), 2_000_000.0);
        assert_eq!(parse_budget("3 Tausend"), 3000.0);
        assert_eq!(parse_budget("1.250.000 €"), 1_250_000.0);
        assert_eq!(parse_budget(""), 0.0);
    }

    #[test]
    fn test_parse_budget_million_wins_over_thousand() {
        assert_eq!(parse_budget("2 Mio (nicht Tsd)"), 2_000_000.0);
    }

    #[test]
    fn test_grouped_pattern_preferred_over_plain() {
        // "Stufe 1" would be found first by a bare digit run.
        assert_eq!(parse_budget("Stufe 1: 25.000 €"), 25_000.0);
    }

    #[test]
    fn test_only_ascii_digits_count() {
        assert_eq!(parse_budget("Stufe ٣: 5000 €"), 5000.0);
        assert_eq!(parse_budget("٥٠٠٠ €"), 0.0);
        assert_eq!(
            parse_deadline("Frist ١٢.٠٣.٢٠٢٦ bzw. 31.03.2026"),
            NaiveDate::from_ymd_opt(2026, 3, 31)
        );
    }

    #[test]
    fn test_parse_deadline_date() {
        let d = parse_deadline("31.03.2026").unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (31, 3, 2026));

        let d = parse_deadline("Einreichung bis 1.4.2026, 12 Uhr").unwrap();
        assert_eq!((d.day(), d.month(), d.year()), (1, 4, 2026));
    }

    #[test]
    fn test_parse_deadline_ongoing_and_fallback() {
        assert_eq!(parse_deadline("Laufend"), None);
        assert_eq!(parse_deadline("laufend 2026"), None);
        assert_eq!(parse_deadline("Q1 2026"), None);
        assert_eq!(parse_deadline("31.02.2026"), None);
    }

    #[test]
    fn test_classify_deadline_distinguishes_ongoing() {
        assert_eq!(classify_deadline("Laufende Antragstellung"), DeadlineKind::Ongoing);
        assert_eq!(classify_deadline("Q1 2026"), DeadlineKind::Unparsable);
        assert_eq!(
            classify_deadline("15.06.2026"),
            DeadlineKind::Fixed(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap())
        );
    }

    #[test]
    fn test_days_until_deadline() {
        let tz = chrono_tz::UTC;
        assert_eq!(days_until_deadline("31.01.2026", utc(2026, 1, 1), tz), Some(30));
        assert!(days_until_deadline("31.01.2026", utc(2026, 2, 15), tz).unwrap() < 0);
        assert_eq!(days_until_deadline("31.01.2026", utc(2026, 1, 31), tz), Some(0));
        assert_eq!(days_until_deadline("laufend", utc(2026, 1, 1), tz), None);
    }

    #[test]
    fn test_days_until_deadline_rounds_up_partial_days() {
        let tz = chrono_tz::UTC;
        let reference = Utc.with_ymd_and_hms(2026, 1, 30, 12, 0, 0).unwrap();
        assert_eq!(days_until_deadline("31.01.2026", reference, tz), Some(1));
    }

    #[test]
    fn test_days_until_deadline_berlin() {
        let tz = chrono_tz::Europe::Berlin;
        let reference = tz.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(days_until_deadline("31.01.2026", reference, tz), Some(30));
    }

    #[test]
    fn test_format_budget() {
        assert_eq!(format_budget(1_500_000.0), "1,5 Mio €");
        assert_eq!(format_budget(2_000_000.0), "2 Mio €");
        assert_eq!(format_budget(5000.0), "5.000 €");
        assert_eq!(format_budget(1_234_567_890.0), "1234,6 Mio €");
        assert_eq!(format_budget(100_000.0), "100.000 €");
        assert_eq!(format_budget(500.0), "500 €");
    }

    #[test]
    fn test_format_deadline_status() {
        assert_eq!(format_deadline_status(None), "laufend");
        assert_eq!(format_deadline_status(Some(-3)), "abgelaufen");
        assert_eq!(format_deadline_status(Some(0)), "heute");
        assert_eq!(format_deadline_status(Some(12)), "noch 12 Tage");
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("Europe/Berlin").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
