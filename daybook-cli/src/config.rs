use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use daybook_core::parse_timezone;
use chrono_tz::Tz;

use crate::state::{default_ledger_path, ensure_daybook_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub ledger: LedgerSection,
    pub clock: ClockSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "gemini", "openai" or "anthropic"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// "csv" or "sheets"
    pub backend: String,
    /// For backend = "csv" (default: ~/.daybook/ledger.csv)
    pub path: Option<PathBuf>,
    /// For backend = "sheets"
    pub spreadsheet_id: Option<String>,
    pub worksheet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    /// IANA name, e.g. "Asia/Kolkata". Unset means the system's local time.
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub currency: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.0,
        }
    }
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            backend: "csv".to_string(),
            path: None,
            spreadsheet_id: None,
            worksheet: daybook_store::sheets::DEFAULT_WORKSHEET.to_string(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            currency: "₹".to_string(),
        }
    }
}

/// Resolved ledger backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Csv(PathBuf),
    Sheets {
        spreadsheet_id: String,
        worksheet: String,
    },
}

impl Config {
    pub fn backend(&self) -> Result<Backend> {
        match self.ledger.backend.as_str() {
            "csv" => {
                let path = match &self.ledger.path {
                    Some(p) => p.clone(),
                    None => default_ledger_path()?,
                };
                Ok(Backend::Csv(path))
            }
            "sheets" => {
                let Some(id) = self.ledger.spreadsheet_id.clone().filter(|s| !s.trim().is_empty())
                else {
                    bail!("ledger.backend = \"sheets\" needs ledger.spreadsheet_id in config.toml");
                };
                Ok(Backend::Sheets {
                    spreadsheet_id: id,
                    worksheet: self.ledger.worksheet.clone(),
                })
            }
            other => bail!("unknown ledger.backend {other:?} (expected \"csv\" or \"sheets\")"),
        }
    }

    pub fn timezone(&self) -> Result<Option<Tz>> {
        match self.clock.timezone.as_deref() {
            None | Some("") => Ok(None),
            Some(tz) => Ok(Some(parse_timezone(tz)?)),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daybook_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
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
