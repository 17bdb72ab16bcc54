//! Filter/sort engine over a program collection.
//!
//! One pass retains programs matching every active predicate, then sorts.
//! Every ordering falls back to the original input index so that identical
//! inputs always produce identical output.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::eligibility::{
    DeadlineRange, is_program_available_in_state, matches_budget_range, matches_deadline_bucket,
    matches_query,
};
use crate::locale::{days_until_deadline, parse_budget};
use crate::program::{FundingProgram, MatchResult};

/// Programs scoring below this are hidden from the unfiltered default view.
pub const MIN_VISIBLE_SCORE: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Deadline,
    Budget,
    Title,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "deadline" => Ok(SortBy::Deadline),
            "budget" => Ok(SortBy::Budget),
            "title" => Ok(SortBy::Title),
            other => Err(format!(
                "unknown sort key '{other}' (expected relevance, deadline, budget, title)"
            )),
        }
    }
}

/// User-controlled query. `FilterState::default()` is the "nothing active" state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub query: String,
    /// Empty means no geographic restriction.
    pub regions: Vec<String>,
    /// Raw user input, parsed on evaluation.
    pub min_budget: String,
    pub max_budget: String,
    pub deadline_range: DeadlineRange,
    pub sort_by: SortBy,
}

impl FilterState {
    pub fn has_active_filters(&self) -> bool {
        *self != FilterState::default()
    }
}

/// Match scores keyed by program id.
#[derive(Debug, Clone, Default)]
pub struct ScoreIndex {
    scores: HashMap<String, f64>,
}

impl ScoreIndex {
    /// The first result for an id wins.
    pub fn from_results(results: &[MatchResult]) -> Self {
        let mut scores = HashMap::with_capacity(results.len());
        for r in results {
            scores.entry(r.program_id.clone()).or_insert(r.score);
        }
        Self { scores }
    }

    /// Absent programs score 0.
    pub fn score(&self, program_id: &str) -> f64 {
        self.scores.get(program_id).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }
}

struct Candidate<'a> {
    index: usize,
    program: &'a FundingProgram,
    days: Option<i64>,
}

/// Filter and order `programs` according to `filter`.
pub fn apply<'a>(
    programs: &'a [FundingProgram],
    filter: &FilterState,
    scores: &ScoreIndex,
    reference: DateTime<Utc>,
    tz: Tz,
) -> Vec<&'a FundingProgram> {
    let mut retained = Vec::new();

    for (index, program) in programs.iter().enumerate() {
        if !filter.regions.is_empty()
            && !filter
                .regions
                .iter()
                .any(|r| is_program_available_in_state(program, r))
        {
            continue;
        }
        if !matches_query(program, &filter.query) {
            continue;
        }
        if !matches_budget_range(program, &filter.min_budget, &filter.max_budget) {
            continue;
        }
        let days = days_until_deadline(&program.deadline, reference, tz);
        if !matches_deadline_bucket(days, filter.deadline_range) {
            continue;
        }
        retained.push(Candidate {
            index,
            program,
            days,
        });
    }

    match filter.sort_by {
        SortBy::Relevance => retained.sort_by(|a, b| {
            scores
                .score(&b.program.id)
                .total_cmp(&scores.score(&a.program.id))
                .then(a.index.cmp(&b.index))
        }),
        SortBy::Deadline => {
            retained.sort_by(|a, b| deadline_order(a.days, b.days).then(a.index.cmp(&b.index)))
        }
        SortBy::Budget => {
            let mut keyed: Vec<(f64, Candidate<'a>)> = retained
                .into_iter()
                .map(|c| (parse_budget(&c.program.budget), c))
                .collect();
            keyed.sort_by(|(ba, a), (bb, b)| bb.total_cmp(ba).then(a.index.cmp(&b.index)));
            retained = keyed.into_iter().map(|(_, c)| c).collect();
        }
        SortBy::Title => retained.sort_by(|a, b| {
            a.program
                .title
                .to_lowercase()
                .cmp(&b.program.title.to_lowercase())
                .then(a.index.cmp(&b.index))
        }),
    }

    retained.into_iter().map(|c| c.program).collect()
}

/// Ascending, with programs without a fixed deadline last.
fn deadline_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Unfiltered view: programs scoring at least `MIN_VISIBLE_SCORE`, best first.
pub fn default_view<'a>(
    programs: &'a [FundingProgram],
    scores: &ScoreIndex,
) -> Vec<&'a FundingProgram> {
    let mut visible: Vec<(usize, f64, &FundingProgram)> = programs
        .iter()
        .enumerate()
        .map(|(i, p)| (i, scores.score(&p.id), p))
        .filter(|(_, score, _)| *score >= MIN_VISIBLE_SCORE)
        .collect();
    visible.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    visible.into_iter().map(|(_, _, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn scores(pairs: &[(&str, f64)]) -> ScoreIndex {
        let results: Vec<MatchResult> = pairs
            .iter()
            .map(|(id, score)| MatchResult {
                program_id: id.to_string(),
                score: *score,
                reasoning: String::new(),
            })
            .collect();
        ScoreIndex::from_results(&results)
    }

    fn ids(programs: &[&FundingProgram]) -> Vec<String> {
        programs.iter().map(|p| p.id.clone()).collect()
    }

    fn catalog() -> Vec<FundingProgram> {
        vec![
            FundingProgram::new("small", "Klassenfahrt")
                .with_budget("50.000 €")
                .with_deadline("10.01.2026")
                .with_regions(["BY"]),
            FundingProgram::new("big", "Digitalpakt")
                .with_budget("1,5 Mio €")
                .with_deadline("laufend"),
            FundingProgram::new("mid", "Aula-Sanierung")
                .with_budget("100.000 €")
                .with_deadline("15.03.2026")
                .with_regions(["NW"]),
        ]
    }

    #[test]
    fn test_has_active_filters() {
        let mut f = FilterState::default();
        assert!(!f.has_active_filters());
        f.sort_by = SortBy::Budget;
        assert!(f.has_active_filters());

        let f = FilterState {
            deadline_range: DeadlineRange::Urgent,
            ..Default::default()
        };
        assert!(f.has_active_filters());
    }

    #[test]
    fn test_sort_by_budget_descending() {
        let programs = catalog();
        let f = FilterState {
            sort_by: SortBy::Budget,
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["big", "mid", "small"]);
        let parsed: Vec<f64> = out.iter().map(|p| parse_budget(&p.budget)).collect();
        assert_eq!(parsed, vec![1_500_000.0, 100_000.0, 50_000.0]);
    }

    #[test]
    fn test_sort_by_deadline_ongoing_last() {
        let programs = catalog();
        let f = FilterState {
            sort_by: SortBy::Deadline,
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["small", "mid", "big"]);
    }

    #[test]
    fn test_relevance_ties_keep_input_order() {
        let programs = catalog();
        let s = scores(&[("mid", 80.0), ("small", 40.0), ("big", 40.0)]);
        let f = FilterState::default();
        let first = ids(&apply(&programs, &f, &s, now(), chrono_tz::UTC));
        let second = ids(&apply(&programs, &f, &s, now(), chrono_tz::UTC));
        assert_eq!(first, vec!["mid", "small", "big"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_region_filter_any_selected() {
        let programs = catalog();
        let f = FilterState {
            regions: vec!["NW".to_string()],
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["big", "mid"]);

        let f = FilterState {
            regions: vec!["NW".to_string(), "BY".to_string()],
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_combined_predicates() {
        let programs = catalog();
        let f = FilterState {
            min_budget: "60.000".to_string(),
            deadline_range: DeadlineRange::ThisQuarter,
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["mid"]);

        let f = FilterState {
            deadline_range: DeadlineRange::Urgent,
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["small"]);
    }

    #[test]
    fn test_sort_by_title() {
        let programs = catalog();
        let f = FilterState {
            sort_by: SortBy::Title,
            ..Default::default()
        };
        let out = apply(&programs, &f, &ScoreIndex::default(), now(), chrono_tz::UTC);
        assert_eq!(ids(&out), vec!["mid", "big", "small"]);
    }

    #[test]
    fn test_default_view_threshold() {
        let programs = catalog();
        let s = scores(&[("small", 19.9), ("big", 20.0), ("mid", 75.0)]);
        assert_eq!(ids(&default_view(&programs, &s)), vec!["mid", "big"]);
    }

    #[test]
    fn test_score_index_first_wins() {
        let s = scores(&[("a", 10.0), ("a", 90.0)]);
        assert_eq!(s.score("a"), 10.0);
        assert_eq!(s.score("missing"), 0.0);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_sort_by_from_str() {
        assert_eq!("Budget".parse::<SortBy>(), Ok(SortBy::Budget));
        assert!("popularity".parse::<SortBy>().is_err());
    }
}
