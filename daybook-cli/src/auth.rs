use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};

use crate::state::ensure_daybook_home;

/// Stored credentials. Environment variables take precedence over the file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// OAuth access token with the spreadsheets scope
    pub sheets_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    Gemini,
    OpenAI,
    Anthropic,
    Sheets,
}

impl Credential {
    pub fn env_var(self) -> &'static str {
        match self {
            Credential::Gemini => "GEMINI_API_KEY",
            Credential::OpenAI => "OPENAI_API_KEY",
            Credential::Anthropic => "ANTHROPIC_API_KEY",
            Credential::Sheets => "GOOGLE_SHEETS_TOKEN",
        }
    }

    fn paste_command(self) -> &'static str {
        match self {
            Credential::Gemini => "daybook auth paste-gemini-key",
            Credential::OpenAI => "daybook auth paste-openai-key",
            Credential::Anthropic => "daybook auth paste-anthropic-key",
            Credential::Sheets => "daybook auth paste-sheets-token",
        }
    }
}

impl AuthState {
    fn stored(&self, which: Credential) -> Option<&String> {
        match which {
            Credential::Gemini => self.gemini_api_key.as_ref(),
            Credential::OpenAI => self.openai_api_key.as_ref(),
            Credential::Anthropic => self.anthropic_api_key.as_ref(),
            Credential::Sheets => self.sheets_token.as_ref(),
        }
    }

    /// Credential from the environment, else from auth.json.
    pub fn resolve(&self, which: Credential) -> Result<String> {
        let from_env = std::env::var(which.env_var()).ok();
        self.resolve_with(which, from_env)
    }

    fn resolve_with(&self, which: Credential, from_env: Option<String>) -> Result<String> {
        from_env
            .or_else(|| self.stored(which).cloned())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "missing credential; set {} or run: {}",
                    which.env_var(),
                    which.paste_command()
                )
            })
    }
}

fn auth_path() -> Result<std::path::PathBuf> {
    Ok(ensure_daybook_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Prompt for a credential, check its shape and store it in auth.json.
pub fn paste(which: Credential) -> Result<()> {
    let (label, prefix) = match which {
        Credential::Gemini => ("Paste Gemini API key (starts with AIza)", Some("AIza")),
        Credential::OpenAI => ("Paste OpenAI API key (starts with sk-)", Some("sk-")),
        Credential::Anthropic => ("Paste Anthropic API key (starts with sk-ant-)", Some("sk-ant-")),
        Credential::Sheets => ("Paste Google OAuth access token", None),
    };

    let value = prompt_secret(label)?;
    if value.is_empty() {
        bail!("nothing pasted");
    }
    if let Some(prefix) = prefix {
        if !value.starts_with(prefix) {
            bail!("that doesn't look right (expected prefix {prefix})");
        }
    }

    let mut auth = load_auth()?;
    let slot = match which {
        Credential::Gemini => &mut auth.gemini_api_key,
        Credential::OpenAI => &mut auth.openai_api_key,
        Credential::Anthropic => &mut auth.anthropic_api_key,
        Credential::Sheets => &mut auth.sheets_token,
    };
    *slot = Some(value);
    save_auth(&auth)?;
    println!("Saved to {}", auth_path()?.display());
    Ok(())
}
