use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod matching;
mod reminders_cmd;
mod search;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "foerder",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FOERDER_BUILD_SHA"), ")"),
    about = "Find and track funding programs for schools"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter and rank programs
    Search(search::SearchArgs),

    /// Show one program with parsed budget and deadline
    Show {
        id: String,

        #[arg(long)]
        programs: Option<PathBuf>,
    },

    /// Score programs for a school profile via the matching service
    Match {
        /// School profile JSON
        #[arg(long)]
        profile: PathBuf,

        #[arg(long)]
        programs: Option<PathBuf>,

        /// Where to write match results. Default: config [data].matches_path
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Deadline reminders
    Reminders {
        #[command(subcommand)]
        command: reminders_cmd::RemindersCommand,
    },

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.foerder/config.toml with defaults
    Init,

    /// Print the effective config
    Show,
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Search(args) => search::run_search(args)?,

        Command::Show { id, programs } => search::run_show(&id, programs)?,

        Command::Match {
            profile,
            programs,
            out,
        } => run_match(profile, programs, out).await?,

        Command::Reminders { command } => reminders_cmd::run(command)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

async fn run_match(
    profile_path: PathBuf,
    programs: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let cfg = config::load_config()?;
    let home = state::ensure_foerder_home()?;

    let profile = foerder_ingest::load_school_profile(&profile_path)?;
    let catalog = search::load_catalog(&cfg, programs)?;

    let out_path = out
        .or_else(|| cfg.matches_path(&home))
        .context("no output path; pass --out or set config [data].matches_path")?;

    let results = matching::request_matches(&cfg.matching, &profile, &catalog).await?;

    let json = serde_json::to_string_pretty(&results)?;
    std::fs::write(&out_path, json).with_context(|| format!("write {}", out_path.display()))?;

    println!(
        "Scored {} of {} programs for {} -> {}",
        results.len(),
        catalog.len(),
        profile.name,
        out_path.display()
    );
    Ok(())
}
