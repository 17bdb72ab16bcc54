use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use foerder_core::{
    DeadlineKind, DeadlineRange, FilterState, FundingProgram, ScoreIndex, SortBy, apply,
    classify_deadline, days_until_deadline, default_view, format_budget, format_deadline_status,
    parse_budget, program::is_known_region, region_name,
};
use std::path::PathBuf;

use crate::config::{Config, load_config};
use crate::state::ensure_foerder_home;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Program collection (.json or .csv). Default: config [data].programs_path
    #[arg(long)]
    pub programs: Option<PathBuf>,

    /// Match results JSON. Default: config [data].matches_path if present
    #[arg(long)]
    pub matches: Option<PathBuf>,

    /// Free-text search over title, provider, description and focus
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Region code (repeatable), e.g. BY or NW
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Minimum budget, e.g. "10.000" or "50 Tsd"
    #[arg(long, default_value = "")]
    pub min_budget: String,

    /// Maximum budget
    #[arg(long, default_value = "")]
    pub max_budget: String,

    /// all, urgent, this_month, this_quarter, this_year
    #[arg(long, default_value = "all")]
    pub deadline: DeadlineRange,

    /// relevance, deadline, budget, title
    #[arg(long, default_value = "relevance")]
    pub sort: SortBy,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Show low-scoring programs in the unfiltered view too
    #[arg(long, default_value_t = false)]
    pub all: bool,
}

impl SearchArgs {
    fn filter_state(&self) -> FilterState {
        FilterState {
            query: self.query.clone(),
            regions: self.regions.clone(),
            min_budget: self.min_budget.clone(),
            max_budget: self.max_budget.clone(),
            deadline_range: self.deadline,
            sort_by: self.sort,
        }
    }
}

/// Programs from `--programs` or the configured path.
pub fn load_catalog(cfg: &Config, programs: Option<PathBuf>) -> Result<Vec<FundingProgram>> {
    let path = match programs {
        Some(p) => p,
        None => cfg.programs_path(&ensure_foerder_home()?),
    };
    if !path.exists() {
        bail!("program collection not found: {} (pass --programs <file>)", path.display());
    }
    foerder_ingest::load_programs(&path).with_context(|| format!("loading {}", path.display()))
}

fn load_scores(cfg: &Config, matches: Option<PathBuf>) -> Result<ScoreIndex> {
    let path = match matches {
        Some(p) => p,
        None => match cfg.matches_path(&ensure_foerder_home()?) {
            Some(p) if p.exists() => p,
            _ => return Ok(ScoreIndex::default()),
        },
    };
    let results = foerder_ingest::load_match_results(&path)?;
    Ok(ScoreIndex::from_results(&results))
}

pub fn run_search(args: SearchArgs) -> Result<()> {
    let cfg = load_config()?;
    let tz = cfg.timezone()?;

    for r in &args.regions {
        if !is_known_region(r) {
            tracing::warn!(region = %r, "unknown region code");
        }
    }

    let programs = load_catalog(&cfg, args.programs.clone())?;
    let scores = load_scores(&cfg, args.matches.clone())?;
    let filter = args.filter_state();
    let now = Utc::now();

    let results = if !filter.has_active_filters() && !scores.is_empty() && !args.all {
        default_view(&programs, &scores)
    } else {
        apply(&programs, &filter, &scores, now, tz)
    };

    println!("{} of {} programs\n", results.len(), programs.len());
    for (i, p) in results.iter().take(args.limit).enumerate() {
        let days = days_until_deadline(&p.deadline, now, tz);
        let score = if scores.is_empty() {
            String::new()
        } else {
            format!("[{:>3.0}] ", scores.score(&p.id))
        };
        println!("{}. {}{} ({})", i + 1, score, p.title, p.id);
        println!(
            "   {} | Budget: {} | Frist: {} | {}",
            p.provider,
            format_budget(parse_budget(&p.budget)),
            format_deadline_status(days),
            regions_label(p)
        );
    }
    if results.len() > args.limit {
        println!("\n... {} more (use --limit)", results.len() - args.limit);
    }

    Ok(())
}

pub fn run_show(id: &str, programs: Option<PathBuf>) -> Result<()> {
    let cfg = load_config()?;
    let tz = cfg.timezone()?;
    let catalog = load_catalog(&cfg, programs)?;
    let p = catalog
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow::anyhow!("no program with id {id}"))?;

    let days = days_until_deadline(&p.deadline, Utc::now(), tz);

    println!("# {}\n", p.title);
    println!("Id:        {}", p.id);
    println!("Anbieter:  {}", p.provider);
    println!("Schwerpunkt: {}", p.focus);
    println!("Regionen:  {}", regions_label(p));
    println!(
        "Budget:    {} (parsed: {})",
        p.budget,
        format_budget(parse_budget(&p.budget))
    );
    println!("Frist:     {} ({})", p.deadline, format_deadline_status(days));
    if classify_deadline(&p.deadline) == DeadlineKind::Unparsable {
        println!("           note: deadline has no recognizable date, treated like an ongoing program");
    }
    if !p.requirements.is_empty() {
        println!("\nVoraussetzungen:\n{}", p.requirements);
    }
    if !p.description.is_empty() {
        println!("\n{}", p.description);
    }
    if !p.url.is_empty() {
        println!("\n{}", p.url);
    }
    Ok(())
}

fn regions_label(p: &FundingProgram) -> String {
    p.region
        .iter()
        .map(|code| region_name(code).map(str::to_string).unwrap_or_else(|| code.clone()))
        .collect::<Vec<_>>()
        .join(", ")
}
