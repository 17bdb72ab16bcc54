//! foerder-core: parsing, eligibility, filtering and reminders for school funding programs

pub mod eligibility;
pub mod filter;
pub mod locale;
pub mod program;
pub mod reminders;
pub mod store;

pub use eligibility::{
    DeadlineRange, filter_programs_by_query, filter_programs_by_state,
    is_program_available_in_state, matches_budget_range, matches_deadline_bucket, matches_query,
};
pub use filter::{FilterState, MIN_VISIBLE_SCORE, ScoreIndex, SortBy, apply, default_view};
pub use locale::{
    DeadlineKind, classify_deadline, days_until_deadline, format_budget, format_deadline_status,
    parse_budget, parse_deadline, parse_timezone,
};
pub use program::{FundingProgram, MatchResult, NATIONWIDE, REGIONS, SchoolProfile, region_name};
pub use reminders::{
    NotificationPreferences, ReminderInstants, ReminderKind, ReminderScheduler, ScheduledReminder,
    SettingsUpdate, calculate_reminder_instants,
};
pub use store::{KeyValueStore, MemoryStore, load_document, save_document};
