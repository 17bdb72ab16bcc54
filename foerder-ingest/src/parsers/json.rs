//! JSON program collections, match results and school profiles.

use anyhow::{Context, Result};
use foerder_core::{FundingProgram, MatchResult, SchoolProfile};
use serde::Deserialize;

/// Parse a JSON array of programs.
///
/// Only a document that is not an array is an error. Records that do not
/// deserialize, or lack an id or region, are skipped with a warning.
pub fn parse_programs_json(text: &str) -> Result<Vec<FundingProgram>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(text).context("parse program collection JSON")?;

    let mut out = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let program: FundingProgram = match serde_json::from_value(record) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(record = i, error = %e, "skipping malformed program record");
                continue;
            }
        };
        if program.id.trim().is_empty() || program.region.is_empty() {
            tracing::warn!(record = i, "skipping program without id or region");
            continue;
        }
        out.push(program);
    }
    Ok(out)
}

/// Accepts a bare array or `{"results": [...]}`. Scores are clamped to 0..=100.
pub fn parse_match_results_json(text: &str) -> Result<Vec<MatchResult>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Payload {
        Bare(Vec<MatchResult>),
        Wrapped { results: Vec<MatchResult> },
    }

    let payload: Payload = serde_json::from_str(text).context("parse match results JSON")?;
    let results = match payload {
        Payload::Bare(r) => r,
        Payload::Wrapped { results } => results,
    };
    Ok(results.into_iter().map(MatchResult::clamped).collect())
}

pub fn parse_school_profile_json(text: &str) -> Result<SchoolProfile> {
    serde_json::from_str(text).context("parse school profile JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_results_bare_and_wrapped() {
        let bare = r#"[{"programId": "p1", "score": 120, "reasoning": "passt"}]"#;
        let r = parse_match_results_json(bare).unwrap();
        assert_eq!(r[0].program_id, "p1");
        assert_eq!(r[0].score, 100.0);

        let wrapped = r#"{"results": [{"program_id": "p2", "score": -3}]}"#;
        let r = parse_match_results_json(wrapped).unwrap();
        assert_eq!(r[0].score, 0.0);
        assert!(r[0].reasoning.is_empty());
    }

    #[test]
    fn test_programs_json_skips_invalid() {
        let text = r#"[
            {"id": "p1", "title": "A", "region": ["BY"]},
            {"id": "", "title": "B", "region": ["BY"]},
            {"id": "p3", "title": "C", "region": []}
        ]"#;
        let programs = parse_programs_json(text).unwrap();
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].id, "p1");
    }

    #[test]
    fn test_programs_json_skips_records_missing_fields() {
        let text = r#"[
            {"id": "p1", "title": "A", "region": ["BY"]},
            {"id": "p2", "title": "B"},
            {"id": "p3", "region": "BY"},
            42,
            {"id": "p5", "title": "E", "region": ["bundesweit"]}
        ]"#;
        let programs = parse_programs_json(text).unwrap();
        let ids: Vec<_> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p5"]);
    }

    #[test]
    fn test_school_profile() {
        let text = r#"{"name": "GS Am Park", "schoolType": "Grundschule", "state": "BY", "studentCount": 240}"#;
        let profile = parse_school_profile_json(text).unwrap();
        assert_eq!(profile.state, "BY");
        assert_eq!(profile.student_count, Some(240));
        assert!(profile.focus_areas.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(parse_programs_json("{").is_err());
        assert!(parse_programs_json(r#"{"id": "p1"}"#).is_err());
    }
}
