use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_foerder_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub reminders: RemindersSection,
    pub matching: MatchingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Program collection (.json or .csv). Relative paths resolve against ~/.foerder.
    pub programs_path: PathBuf,
    pub matches_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersSection {
    /// IANA timezone used for deadline midnights.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    pub endpoint: String,
    /// Environment variable holding the bearer token (optional).
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            programs_path: PathBuf::from("programs.json"),
            matches_path: Some(PathBuf::from("matches.json")),
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            timezone: "Europe/Berlin".to_string(),
        }
    }
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787/match".to_string(),
            api_key_env: "FOERDER_MATCHING_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn timezone(&self) -> Result<Tz> {
        foerder_core::parse_timezone(&self.reminders.timezone)
            .context("config.toml [reminders].timezone")
    }

    pub fn programs_path(&self, home: &Path) -> PathBuf {
        resolve(home, &self.data.programs_path)
    }

    pub fn matches_path(&self, home: &Path) -> Option<PathBuf> {
        self.data.matches_path.as_deref().map(|p| resolve(home, p))
    }
}

fn resolve(home: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home.join(p)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_foerder_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    let s = toml::to_string_pretty(&cfg).context("serialize config")?;
    println!("# {}\n", config_path()?.display());
    println!("{s}");
    Ok(())
}
