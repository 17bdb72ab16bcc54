//! foerder-ingest: loading program collections, match results and school profiles from disk.

pub mod parsers;
pub mod types;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use foerder_core::{FundingProgram, MatchResult, SchoolProfile};

pub use parsers::csv_programs::parse_programs_csv;
pub use parsers::json::{parse_match_results_json, parse_programs_json, parse_school_profile_json};
pub use types::{ProgramRow, ProgramSource};

/// Load a program collection (`.csv`, otherwise JSON) and drop duplicate ids.
pub fn load_programs(path: impl AsRef<Path>) -> Result<Vec<FundingProgram>> {
    let path = path.as_ref();
    let mut programs = match ProgramSource::from_path(path) {
        ProgramSource::Csv => {
            let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
            parse_programs_csv(file).with_context(|| format!("parsing {}", path.display()))?
        }
        ProgramSource::Json => {
            let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            parse_programs_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
    };

    let dropped = dedupe_programs(&mut programs);
    if dropped > 0 {
        tracing::warn!(dropped, path = %path.display(), "duplicate program ids, kept first occurrence");
    }
    tracing::debug!(count = programs.len(), path = %path.display(), "loaded programs");
    Ok(programs)
}

/// Keep the first program per id, preserving order. Returns how many were dropped.
pub fn dedupe_programs(programs: &mut Vec<FundingProgram>) -> usize {
    let before = programs.len();
    let mut seen = HashSet::new();
    programs.retain(|p| seen.insert(p.id.clone()));
    before - programs.len()
}

pub fn load_match_results(path: impl AsRef<Path>) -> Result<Vec<MatchResult>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_match_results_json(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_school_profile(path: impl AsRef<Path>) -> Result<SchoolProfile> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_school_profile_json(&text).with_context(|| format!("parsing {}", path.display()))
}
