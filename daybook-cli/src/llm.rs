use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

use crate::auth::{AuthState, Credential};
use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
    Anthropic,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAI),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => bail!("unknown llm.provider {other:?} (expected gemini, openai or anthropic)"),
        }
    }
}

impl Provider {
    fn credential(self) -> Credential {
        match self {
            Provider::Gemini => Credential::Gemini,
            Provider::OpenAI => Credential::OpenAI,
            Provider::Anthropic => Credential::Anthropic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn from_section(section: &LlmSection) -> Result<Self> {
        Ok(Self {
            provider: section.provider.parse()?,
            model: section.model.clone(),
            temperature: section.temperature,
        })
    }
}

/// Send a single-turn prompt and return the reply text.
pub fn complete(config: &LlmConfig, auth: &AuthState, prompt: &str) -> Result<String> {
    let key = auth.resolve(config.provider.credential())?;
    info!(provider = ?config.provider, model = %config.model, "calling extraction service");

    // The CLI runs under #[tokio::main]; block_on inside it would panic
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(complete_async(config, &key, prompt)))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        rt.block_on(complete_async(config, &key, prompt))
    }
}

async fn complete_async(config: &LlmConfig, key: &str, prompt: &str) -> Result<String> {
    let out = match config.provider {
        Provider::Gemini => gemini_complete(config, key, prompt).await,
        Provider::OpenAI => openai_complete(config, key, prompt).await,
        Provider::Anthropic => anthropic_complete(config, key, prompt).await,
    }?;
    debug!(len = out.len(), "reply received");
    Ok(out)
}

async fn gemini_complete(config: &LlmConfig, key: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Part<'a> {
        text: &'a str,
    }

    #[derive(Serialize)]
    struct Content<'a> {
        role: &'static str,
        parts: Vec<Part<'a>>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct GenerationConfig {
        temperature: f32,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Req<'a> {
        contents: Vec<Content<'a>>,
        generation_config: GenerationConfig,
    }

    #[derive(Deserialize)]
    struct Resp {
        #[serde(default)]
        candidates: Vec<Candidate>,
    }

    #[derive(Deserialize)]
    struct Candidate {
        content: Option<CandidateContent>,
    }

    #[derive(Deserialize)]
    struct CandidateContent {
        #[serde(default)]
        parts: Vec<PartOut>,
    }

    #[derive(Deserialize)]
    struct PartOut {
        text: Option<String>,
    }

    let body = Req {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
        },
    };

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
        config.model
    );

    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .header("x-goog-api-key", key)
        .json(&body)
        .send()
        .await
        .context("gemini request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("gemini error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse gemini response")?;
    let text: String = out
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(text.trim().to_string())
}

async fn openai_complete(config: &LlmConfig, key: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Msg<'a> {
        role: &'static str,
        content: &'a str,
    }

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        messages: Vec<Msg<'a>>,
        temperature: f32,
    }

    #[derive(Deserialize)]
    struct Resp {
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: MsgOut,
    }

    #[derive(Deserialize)]
    struct MsgOut {
        content: Option<String>,
    }

    let body = Req {
        model: &config.model,
        messages: vec![Msg {
            role: "user",
            content: prompt,
        }],
        temperature: config.temperature,
    };

    let client = reqwest::Client::new();
    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(key)
        .json(&body)
        .send()
        .await
        .context("openai request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("openai error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse openai response")?;
    let content = out
        .choices
        .first()
        .and_then(|c| c.message.content.clone())
        .unwrap_or_default();

    Ok(content.trim().to_string())
}

async fn anthropic_complete(config: &LlmConfig, key: &str, prompt: &str) -> Result<String> {
    #[derive(Serialize)]
    struct Msg<'a> {
        role: &'static str,
        content: &'a str,
    }

    #[derive(Serialize)]
    struct Req<'a> {
        model: &'a str,
        max_tokens: i32,
        temperature: f32,
        messages: Vec<Msg<'a>>,
    }

    #[derive(Deserialize)]
    struct Resp {
        content: Vec<ContentBlock>,
    }

    #[derive(Deserialize)]
    struct ContentBlock {
        #[serde(rename = "type")]
        t: String,
        text: Option<String>,
    }

    let body = Req {
        model: &config.model,
        max_tokens: 1024,
        temperature: config.temperature,
        messages: vec![Msg {
            role: "user",
            content: prompt,
        }],
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(key)?);
    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::new();
    let resp = client
        .post("https://api.anthropic.com/v1/messages")
        .headers(headers)
        .json(&body)
        .send()
        .await
        .context("anthropic request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("anthropic error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse anthropic response")?;
    let mut s = String::new();
    for b in out.content {
        if b.t == "text" {
            if let Some(t) = b.text {
                s.push_str(&t);
            }
        }
    }
    Ok(s.trim().to_string())
}
