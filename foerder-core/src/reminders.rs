//! Deadline reminders: preferences, schedule projection and the sent-state machine.
//!
//! Per (program, kind) a reminder is Unscheduled (no record), Scheduled
//! (`sent == false`) or Sent (`sent == true`). Sent is terminal until the
//! program is unsubscribed, which purges all of its records.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::locale::{local_midnight, parse_deadline};
use crate::program::FundingProgram;
use crate::store::{
    KeyValueStore, PREFERENCES_KEY, REMINDERS_KEY, load_document, save_document,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    SevenDays,
    OneDay,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::SevenDays, ReminderKind::OneDay];

    pub fn lead_days(self) -> i64 {
        match self {
            ReminderKind::SevenDays => 7,
            ReminderKind::OneDay => 1,
        }
    }

    /// Same text as the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::SevenDays => "seven_days",
            ReminderKind::OneDay => "one_day",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderKind::SevenDays => "7 Tage vorher",
            ReminderKind::OneDay => "1 Tag vorher",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email: String,
    /// Master switch for delivery.
    pub enabled: bool,
    pub seven_days_before: bool,
    pub one_day_before: bool,
    pub subscribed_programs: Vec<String>,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: String::new(),
            enabled: false,
            seven_days_before: true,
            one_day_before: true,
            subscribed_programs: Vec::new(),
        }
    }
}

impl NotificationPreferences {
    pub fn is_kind_enabled(&self, kind: ReminderKind) -> bool {
        match kind {
            ReminderKind::SevenDays => self.seven_days_before,
            ReminderKind::OneDay => self.one_day_before,
        }
    }

    /// Delivery needs the master switch and somewhere to deliver to.
    pub fn can_deliver(&self) -> bool {
        self.enabled && !self.email.trim().is_empty()
    }
}

/// Partial settings change; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub email: Option<String>,
    pub enabled: Option<bool>,
    pub seven_days_before: Option<bool>,
    pub one_day_before: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub program_id: String,
    /// Captured when scheduled; not refreshed if the program changes.
    pub program_title: String,
    pub deadline: String,
    pub kind: ReminderKind,
    pub scheduled_date: DateTime<Utc>,
    pub sent: bool,
}

impl ScheduledReminder {
    /// Unique per (program, kind); `schedule_reminders` never creates a
    /// second record with the same key.
    pub fn dedupe_key(&self) -> String {
        dedupe_key(&self.program_id, self.kind)
    }
}

fn dedupe_key(program_id: &str, kind: ReminderKind) -> String {
    format!("{program_id}:{}", kind.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderInstants {
    pub seven_days_before: DateTime<Utc>,
    pub one_day_before: DateTime<Utc>,
}

impl ReminderInstants {
    pub fn for_kind(&self, kind: ReminderKind) -> DateTime<Utc> {
        match kind {
            ReminderKind::SevenDays => self.seven_days_before,
            ReminderKind::OneDay => self.one_day_before,
        }
    }
}

/// Reminder instants relative to the deadline's local midnight.
///
/// `None` for ongoing or unparsable deadlines; those are never scheduled.
pub fn calculate_reminder_instants(deadline: &str, tz: Tz) -> Option<ReminderInstants> {
    let date = parse_deadline(deadline)?;
    let at = |kind: ReminderKind| local_midnight(date - Duration::days(kind.lead_days()), tz);
    Some(ReminderInstants {
        seven_days_before: at(ReminderKind::SevenDays),
        one_day_before: at(ReminderKind::OneDay),
    })
}

/// Owns the preferences and reminders documents in a `KeyValueStore`.
///
/// Every mutating call is one read-modify-write per document and takes
/// `&mut self`, so calls on one scheduler cannot interleave.
#[derive(Debug)]
pub struct ReminderScheduler<S> {
    store: S,
    tz: Tz,
}

impl<S: KeyValueStore> ReminderScheduler<S> {
    pub fn new(store: S, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn preferences(&self) -> Result<NotificationPreferences> {
        load_document(&self.store, PREFERENCES_KEY)
    }

    pub fn save_preferences(&mut self, prefs: &NotificationPreferences) -> Result<()> {
        save_document(&mut self.store, PREFERENCES_KEY, prefs)
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<NotificationPreferences> {
        let mut prefs = self.preferences()?;
        if let Some(email) = update.email {
            prefs.email = email.trim().to_string();
        }
        if let Some(enabled) = update.enabled {
            prefs.enabled = enabled;
        }
        if let Some(v) = update.seven_days_before {
            prefs.seven_days_before = v;
        }
        if let Some(v) = update.one_day_before {
            prefs.one_day_before = v;
        }
        self.save_preferences(&prefs)?;
        Ok(prefs)
    }

    pub fn reminders(&self) -> Result<Vec<ScheduledReminder>> {
        load_document(&self.store, REMINDERS_KEY)
    }

    fn save_reminders(&mut self, reminders: &[ScheduledReminder]) -> Result<()> {
        save_document(&mut self.store, REMINDERS_KEY, reminders)
    }

    pub fn is_subscribed(&self, program_id: &str) -> Result<bool> {
        Ok(self
            .preferences()?
            .subscribed_programs
            .iter()
            .any(|id| id == program_id))
    }

    /// Create missing reminders for `program`; returns only the new ones.
    ///
    /// Existing records for a (program, kind) pair are left untouched, sent or not.
    pub fn schedule_reminders(
        &mut self,
        program: &FundingProgram,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledReminder>> {
        let Some(instants) = calculate_reminder_instants(&program.deadline, self.tz) else {
            tracing::debug!(program = %program.id, deadline = %program.deadline, "no fixed deadline, nothing to schedule");
            return Ok(vec![]);
        };

        let prefs = self.preferences()?;
        let mut reminders = self.reminders()?;
        let existing: HashSet<String> =
            reminders.iter().map(ScheduledReminder::dedupe_key).collect();
        let mut created = Vec::new();

        for kind in ReminderKind::ALL {
            if !prefs.is_kind_enabled(kind) {
                continue;
            }
            let scheduled_date = instants.for_kind(kind);
            if scheduled_date <= now {
                continue;
            }
            if existing.contains(&dedupe_key(&program.id, kind)) {
                continue;
            }

            let reminder = ScheduledReminder {
                program_id: program.id.clone(),
                program_title: program.title.clone(),
                deadline: program.deadline.clone(),
                kind,
                scheduled_date,
                sent: false,
            };
            reminders.push(reminder.clone());
            created.push(reminder);
        }

        if !created.is_empty() {
            self.save_reminders(&reminders)?;
            tracing::info!(program = %program.id, count = created.len(), "scheduled reminders");
        }

        Ok(created)
    }

    pub fn subscribe_to_program(
        &mut self,
        program: &FundingProgram,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledReminder>> {
        let mut prefs = self.preferences()?;
        if !prefs.subscribed_programs.iter().any(|id| *id == program.id) {
            prefs.subscribed_programs.push(program.id.clone());
            self.save_preferences(&prefs)?;
        }
        self.schedule_reminders(program, now)
    }

    /// Drop the subscription and purge every reminder record for the program.
    ///
    /// Returns the number of records removed.
    pub fn unsubscribe_from_program(&mut self, program_id: &str) -> Result<usize> {
        let mut prefs = self.preferences()?;
        prefs.subscribed_programs.retain(|id| id != program_id);
        self.save_preferences(&prefs)?;

        let mut reminders = self.reminders()?;
        let before = reminders.len();
        reminders.retain(|r| r.program_id != program_id);
        let removed = before - reminders.len();
        if removed > 0 {
            self.save_reminders(&reminders)?;
        }

        tracing::info!(program = %program_id, removed, "unsubscribed");
        Ok(removed)
    }

    /// Mark every due, unsent reminder as sent and return them as they were.
    ///
    /// Does nothing unless delivery is enabled and an email is configured.
    /// A reminder is returned by at most one call.
    pub fn check_due_reminders(&mut self, now: DateTime<Utc>) -> Result<Vec<ScheduledReminder>> {
        let prefs = self.preferences()?;
        if !prefs.can_deliver() {
            return Ok(vec![]);
        }

        let mut reminders = self.reminders()?;
        let mut due = Vec::new();
        for r in reminders.iter_mut() {
            if !r.sent && r.scheduled_date <= now {
                due.push(r.clone());
                r.sent = true;
            }
        }

        if !due.is_empty() {
            self.save_reminders(&reminders)?;
            tracing::info!(count = due.len(), "due reminders marked sent");
        }

        due.sort_by_key(|r| r.scheduled_date);
        Ok(due)
    }

    /// Unsent reminders still ahead of `now`, soonest first.
    pub fn upcoming_reminders(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledReminder>> {
        let mut upcoming: Vec<_> = self
            .reminders()?
            .into_iter()
            .filter(|r| !r.sent && r.scheduled_date > now)
            .collect();
        upcoming.sort_by_key(|r| r.scheduled_date);
        Ok(upcoming)
    }

    /// Remove both documents.
    pub fn clear_all(&mut self) -> Result<()> {
        self.store.remove(PREFERENCES_KEY)?;
        self.store.remove(REMINDERS_KEY)?;
        Ok(())
    }
}
