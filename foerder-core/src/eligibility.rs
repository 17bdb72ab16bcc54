//! Eligibility and query predicates over single programs.

use serde::{Deserialize, Serialize};

use crate::locale::parse_budget;
use crate::program::{FundingProgram, NATIONWIDE};

/// Deadline bucket a user can filter by.
///
/// Thresholds are cumulative: a program 10 days out is in every bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineRange {
    #[default]
    All,
    Urgent,
    ThisMonth,
    ThisQuarter,
    ThisYear,
}

impl DeadlineRange {
    /// Max days until the deadline; `None` for `All`.
    pub fn threshold_days(self) -> Option<i64> {
        match self {
            DeadlineRange::All => None,
            DeadlineRange::Urgent => Some(14),
            DeadlineRange::ThisMonth => Some(30),
            DeadlineRange::ThisQuarter => Some(90),
            DeadlineRange::ThisYear => Some(365),
        }
    }
}

impl std::str::FromStr for DeadlineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "all" => Ok(DeadlineRange::All),
            "urgent" => Ok(DeadlineRange::Urgent),
            "this_month" | "month" => Ok(DeadlineRange::ThisMonth),
            "this_quarter" | "quarter" => Ok(DeadlineRange::ThisQuarter),
            "this_year" | "year" => Ok(DeadlineRange::ThisYear),
            other => Err(format!(
                "unknown deadline range '{other}' (expected all, urgent, this_month, this_quarter, this_year)"
            )),
        }
    }
}

/// True if the program is nationwide or lists `region` exactly.
pub fn is_program_available_in_state(program: &FundingProgram, region: &str) -> bool {
    program.region.iter().any(|r| r == NATIONWIDE || r == region)
}

/// Case-insensitive substring match on title, provider, description and focus.
pub fn matches_query(program: &FundingProgram, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }

    [
        &program.title,
        &program.provider,
        &program.description,
        &program.focus,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&q))
}

/// Budget bounds are raw user input; blank (or zero) bounds are unset.
///
/// A program whose budget text has no number parses to 0 and therefore fails
/// any lower bound.
pub fn matches_budget_range(program: &FundingProgram, min_raw: &str, max_raw: &str) -> bool {
    let min = parse_bound(min_raw);
    let max = parse_bound(max_raw);
    if min.is_none() && max.is_none() {
        return true;
    }

    let budget = parse_budget(&program.budget);
    if let Some(min) = min {
        if budget < min {
            return false;
        }
    }
    if let Some(max) = max {
        if budget > max {
            return false;
        }
    }
    true
}

fn parse_bound(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        return None;
    }
    let value = parse_budget(raw);
    (value > 0.0).then_some(value)
}

/// `days_until` of `None` means ongoing or unparsable.
pub fn matches_deadline_bucket(days_until: Option<i64>, bucket: DeadlineRange) -> bool {
    let Some(threshold) = bucket.threshold_days() else {
        return true;
    };
    matches!(days_until, Some(d) if (0..=threshold).contains(&d))
}

pub fn filter_programs_by_query<'a>(
    programs: &'a [FundingProgram],
    query: &str,
) -> Vec<&'a FundingProgram> {
    programs.iter().filter(|p| matches_query(p, query)).collect()
}

pub fn filter_programs_by_state<'a>(
    programs: &'a [FundingProgram],
    region: &str,
) -> Vec<&'a FundingProgram> {
    programs
        .iter()
        .filter(|p| is_program_available_in_state(p, region))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FundingProgram> {
        vec![
            FundingProgram::new("a", "MINT-Förderung")
                .with_provider("Telekom Stiftung")
                .with_regions(["BY"]),
            FundingProgram::new("b", "Schulgarten")
                .with_description("Natur erleben im Schulalltag")
                .with_regions(["bundesweit"]),
            FundingProgram::new("c", "Lesekultur")
                .with_focus("Sprachförderung")
                .with_regions(["NW", "NI"]),
        ]
    }

    #[test]
    fn test_nationwide_available_everywhere() {
        let programs = sample();
        for region in ["BY", "BE", "HH", "XX"] {
            assert!(is_program_available_in_state(&programs[1], region));
        }
    }

    #[test]
    fn test_state_restricted_program() {
        let programs = sample();
        assert!(is_program_available_in_state(&programs[2], "NW"));
        assert!(is_program_available_in_state(&programs[2], "NI"));
        assert!(!is_program_available_in_state(&programs[2], "BY"));
        // No prefix matching.
        assert!(!is_program_available_in_state(&programs[2], "N"));
    }

    #[test]
    fn test_matches_query_fields() {
        let programs = sample();
        assert!(matches_query(&programs[0], "telekom"));
        assert!(matches_query(&programs[1], "SCHULALLTAG"));
        assert!(matches_query(&programs[2], "sprach"));
        assert!(!matches_query(&programs[0], "garten"));
        assert!(matches_query(&programs[0], "   "));
    }

    #[test]
    fn test_filter_programs_by_query() {
        assert!(filter_programs_by_query(&[], "mint").is_empty());

        let programs = sample();
        let all = filter_programs_by_query(&programs, "  ");
        let ids: Vec<_> = all.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let hits = filter_programs_by_query(&programs, "schul");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn test_filter_programs_by_state() {
        let programs = sample();
        let ids: Vec<_> = filter_programs_by_state(&programs, "NW")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_matches_budget_range() {
        let p = FundingProgram::new("p", "x").with_budget("bis zu 50.000 €");
        assert!(matches_budget_range(&p, "", ""));
        assert!(matches_budget_range(&p, "10.000", ""));
        assert!(matches_budget_range(&p, "", "100 Tsd"));
        assert!(!matches_budget_range(&p, "60.000", ""));
        assert!(!matches_budget_range(&p, "", "20000"));
    }

    #[test]
    fn test_textual_budget_fails_lower_bound() {
        let p = FundingProgram::new("p", "x").with_budget("Sachleistung");
        assert!(!matches_budget_range(&p, "1000", ""));
        assert!(matches_budget_range(&p, "", "1000"));
    }

    #[test]
    fn test_matches_deadline_bucket() {
        assert!(matches_deadline_bucket(None, DeadlineRange::All));
        assert!(matches_deadline_bucket(Some(-5), DeadlineRange::All));

        for bucket in [
            DeadlineRange::Urgent,
            DeadlineRange::ThisMonth,
            DeadlineRange::ThisQuarter,
            DeadlineRange::ThisYear,
        ] {
            assert!(matches_deadline_bucket(Some(10), bucket));
            assert!(matches_deadline_bucket(Some(0), bucket));
            assert!(!matches_deadline_bucket(Some(-1), bucket));
            assert!(!matches_deadline_bucket(None, bucket));
        }

        assert!(!matches_deadline_bucket(Some(15), DeadlineRange::Urgent));
        assert!(matches_deadline_bucket(Some(30), DeadlineRange::ThisMonth));
        assert!(!matches_deadline_bucket(Some(91), DeadlineRange::ThisQuarter));
        assert!(matches_deadline_bucket(Some(365), DeadlineRange::ThisYear));
        assert!(!matches_deadline_bucket(Some(366), DeadlineRange::ThisYear));
    }

    #[test]
    fn test_deadline_range_from_str() {
        assert_eq!("urgent".parse::<DeadlineRange>(), Ok(DeadlineRange::Urgent));
        assert_eq!("this-quarter".parse::<DeadlineRange>(), Ok(DeadlineRange::ThisQuarter));
        assert!("soon".parse::<DeadlineRange>().is_err());
    }
}
