use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DAYBOOK_HOME`, or `~/.daybook`.
pub fn daybook_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DAYBOOK_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".daybook"))
}

pub fn ensure_daybook_home() -> Result<PathBuf> {
    let dir = daybook_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Default location of the CSV ledger.
pub fn default_ledger_path() -> Result<PathBuf> {
    Ok(daybook_home()?.join("ledger.csv"))
}
