//! Funding program records, school profiles and match results.
//!
//! Programs come from an external data source and are read-only here. Budget
//! and deadline stay raw strings; see `crate::locale` for their parsed forms.

use serde::{Deserialize, Serialize};

/// Region code meaning "available in every federal state".
pub const NATIONWIDE: &str = "bundesweit";

/// Federal state codes with display names.
pub const REGIONS: &[(&str, &str)] = &[
    (NATIONWIDE, "Bundesweit"),
    ("BW", "Baden-Württemberg"),
    ("BY", "Bayern"),
    ("BE", "Berlin"),
    ("BB", "Brandenburg"),
    ("HB", "Bremen"),
    ("HH", "Hamburg"),
    ("HE", "Hessen"),
    ("MV", "Mecklenburg-Vorpommern"),
    ("NI", "Niedersachsen"),
    ("NW", "Nordrhein-Westfalen"),
    ("RP", "Rheinland-Pfalz"),
    ("SL", "Saarland"),
    ("SN", "Sachsen"),
    ("ST", "Sachsen-Anhalt"),
    ("SH", "Schleswig-Holstein"),
    ("TH", "Thüringen"),
];

pub fn region_name(code: &str) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn is_known_region(code: &str) -> bool {
    region_name(code).is_some()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingProgram {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub description: String,
    /// Focus label, e.g. "Digitalisierung".
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub requirements: String,

    /// Free-form, e.g. "bis zu 50.000 €". Not pre-parsed.
    #[serde(default)]
    pub budget: String,
    /// Free-form, e.g. "31.03.2026" or "laufend". Not pre-parsed.
    #[serde(default)]
    pub deadline: String,

    /// Region codes; `NATIONWIDE` makes the program eligible everywhere.
    pub region: Vec<String>,

    #[serde(default, alias = "fundingType")]
    pub funding_type: String,
    #[serde(default, alias = "targetGroups")]
    pub target_groups: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub contact: String,
}

impl FundingProgram {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            provider: String::new(),
            description: String::new(),
            focus: String::new(),
            requirements: String::new(),
            budget: String::new(),
            deadline: String::new(),
            region: vec![NATIONWIDE.to_string()],
            funding_type: String::new(),
            target_groups: Vec::new(),
            url: String::new(),
            contact: String::new(),
        }
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = budget.into();
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = deadline.into();
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = focus.into();
        self
    }

    pub fn is_nationwide(&self) -> bool {
        self.region.iter().any(|r| r == NATIONWIDE)
    }
}

/// The consuming school. Only used as query context and matching input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolProfile {
    pub name: String,
    #[serde(default, alias = "schoolType")]
    pub school_type: String,
    /// Region code of the school's federal state.
    pub state: String,
    #[serde(default, alias = "studentCount")]
    pub student_count: Option<u32>,
    #[serde(default, alias = "focusAreas")]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub needs: String,
}

/// Score produced by the external matching service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(alias = "programId")]
    pub program_id: String,
    /// 0..=100
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl MatchResult {
    pub const MAX_SCORE: f64 = 100.0;

    /// Clamp the score into 0..=100; NaN becomes 0.
    pub fn clamped(mut self) -> Self {
        self.score = if self.score.is_nan() {
            0.0
        } else {
            self.score.clamp(0.0, Self::MAX_SCORE)
        };
        self
    }
}
