use std::path::Path;

use serde::Deserialize;

/// On-disk format of a program collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSource {
    Json,
    Csv,
}

impl ProgramSource {
    /// Guess from the file extension; anything but `.csv` is treated as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => ProgramSource::Csv,
            _ => ProgramSource::Json,
        }
    }
}

/// One CSV row as exported by the program database. Columns are matched by
/// header name; missing columns are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProgramRow {
    pub id: String,
    pub title: String,
    pub provider: String,
    pub description: String,
    pub focus: String,
    pub requirements: String,
    pub budget: String,
    pub deadline: String,
    /// Region codes separated by `;`, `,` or `|`.
    pub region: String,
    pub funding_type: String,
    /// `;`-separated.
    pub target_groups: String,
    pub url: String,
    pub contact: String,
}
