use anyhow::{Result, bail};
use chrono::Utc;
use clap::Subcommand;
use foerder_core::{ReminderScheduler, ScheduledReminder, SettingsUpdate};
use std::path::PathBuf;

use crate::config::load_config;
use crate::search::load_catalog;
use crate::state::JsonFileStore;

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// Subscribe to a program and schedule its deadline reminders
    Subscribe {
        id: String,

        /// Program collection. Default: config [data].programs_path
        #[arg(long)]
        programs: Option<PathBuf>,
    },

    /// Unsubscribe and delete every reminder for the program
    Unsubscribe { id: String },

    /// Mark due reminders as sent and print them for delivery
    Check {
        /// Print as a JSON array instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List reminders that are still ahead
    Upcoming {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Change notification settings
    Settings {
        #[arg(long)]
        email: Option<String>,

        /// Turn delivery on
        #[arg(long, default_value_t = false, conflicts_with = "disable")]
        enable: bool,

        /// Turn delivery off
        #[arg(long, default_value_t = false)]
        disable: bool,

        /// Remind seven days before the deadline
        #[arg(long)]
        seven_days: Option<bool>,

        /// Remind one day before the deadline
        #[arg(long)]
        one_day: Option<bool>,
    },

    /// Subscription and queue summary
    Status,

    /// Delete all preferences and reminders
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

fn open_scheduler() -> Result<ReminderScheduler<JsonFileStore>> {
    let cfg = load_config()?;
    Ok(ReminderScheduler::new(
        JsonFileStore::open_default()?,
        cfg.timezone()?,
    ))
}

pub fn run(cmd: RemindersCommand) -> Result<()> {
    match cmd {
        RemindersCommand::Subscribe { id, programs } => subscribe(&id, programs),
        RemindersCommand::Unsubscribe { id } => unsubscribe(&id),
        RemindersCommand::Check { json } => check(json),
        RemindersCommand::Upcoming { limit } => upcoming(limit),
        RemindersCommand::Settings {
            email,
            enable,
            disable,
            seven_days,
            one_day,
        } => settings(SettingsUpdate {
            email,
            enabled: match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            seven_days_before: seven_days,
            one_day_before: one_day,
        }),
        RemindersCommand::Status => status(),
        RemindersCommand::Clear { yes } => clear(yes),
    }
}

fn subscribe(id: &str, programs: Option<PathBuf>) -> Result<()> {
    let cfg = load_config()?;
    let catalog = load_catalog(&cfg, programs)?;
    let program = catalog
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow::anyhow!("no program with id {id}"))?;

    let mut scheduler = open_scheduler()?;
    let created = scheduler.subscribe_to_program(program, Utc::now())?;

    println!("Subscribed to {} ({})", program.title, program.id);
    if created.is_empty() {
        println!("No new reminders (deadline ongoing, already scheduled, or too close).");
    }
    for r in &created {
        print_reminder(r);
    }

    let prefs = scheduler.preferences()?;
    if !prefs.can_deliver() {
        println!("\nDelivery is off. Run: foerder reminders settings --email <addr> --enable");
    }
    Ok(())
}

fn unsubscribe(id: &str) -> Result<()> {
    let mut scheduler = open_scheduler()?;
    let removed = scheduler.unsubscribe_from_program(id)?;
    println!("Unsubscribed from {id}; removed {removed} reminders.");
    Ok(())
}

fn check(json: bool) -> Result<()> {
    let mut scheduler = open_scheduler()?;
    let prefs = scheduler.preferences()?;
    let due = scheduler.check_due_reminders(Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&due)?);
        return Ok(());
    }

    if !prefs.can_deliver() {
        println!("Delivery is off or no email set; nothing checked.");
        return Ok(());
    }
    if due.is_empty() {
        println!("No due reminders.");
        return Ok(());
    }

    println!("{} due reminders for {}:", due.len(), prefs.email);
    for r in &due {
        print_reminder(r);
    }
    Ok(())
}

fn upcoming(limit: usize) -> Result<()> {
    let scheduler = open_scheduler()?;
    let upcoming = scheduler.upcoming_reminders(Utc::now())?;
    if upcoming.is_empty() {
        println!("No upcoming reminders.");
        return Ok(());
    }
    for r in upcoming.iter().take(limit) {
        print_reminder(r);
    }
    Ok(())
}

fn settings(update: SettingsUpdate) -> Result<()> {
    let mut scheduler = open_scheduler()?;
    let prefs = scheduler.update_settings(update)?;

    println!("Notification settings:\n");
    println!(
        "- email: {}",
        if prefs.email.is_empty() { "<not set>" } else { prefs.email.as_str() }
    );
    println!("- enabled: {}", prefs.enabled);
    println!("- seven_days_before: {}", prefs.seven_days_before);
    println!("- one_day_before: {}", prefs.one_day_before);
    Ok(())
}

fn status() -> Result<()> {
    let scheduler = open_scheduler()?;
    let prefs = scheduler.preferences()?;
    let reminders = scheduler.reminders()?;
    let now = Utc::now();

    let sent = reminders.iter().filter(|r| r.sent).count();
    let due = reminders
        .iter()
        .filter(|r| !r.sent && r.scheduled_date <= now)
        .count();
    let future = reminders.len() - sent - due;

    println!(
        "Subscriptions: {} | Reminders: {} total, {} due, {} future, {} sent | Delivery: {}",
        prefs.subscribed_programs.len(),
        reminders.len(),
        due,
        future,
        sent,
        if prefs.can_deliver() { "on" } else { "off" }
    );
    Ok(())
}

fn clear(yes: bool) -> Result<()> {
    if !yes {
        bail!("this deletes all subscriptions and reminders; pass --yes to confirm");
    }
    let mut scheduler = open_scheduler()?;
    scheduler.clear_all()?;
    println!("Cleared notification preferences and reminders.");
    Ok(())
}

fn print_reminder(r: &ScheduledReminder) {
    println!(
        "- {} | {} | {} (Frist: {}){}",
        r.scheduled_date.format("%Y-%m-%d %H:%M UTC"),
        r.kind.label(),
        r.program_title,
        r.deadline,
        if r.sent { " [sent]" } else { "" }
    );
}
