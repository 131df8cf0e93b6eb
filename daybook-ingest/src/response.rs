//! Parse and validate the extraction service's reply.
//!
//! The reply is expected to be a JSON array of `{Item, Category, Amount}`
//! objects, possibly wrapped in Markdown code fences and occasionally
//! surrounded by prose.

use daybook_core::{parse_amount, DaybookError, ExtractedItem, Result, DEFAULT_CATEGORY};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(?P<body>.*?)\s*```").expect("valid fence regex")
});

/// Remove Markdown code fences (```` ```json ```` or bare ```` ``` ````).
pub fn strip_fences(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(caps) = FENCED.captures(raw) {
        return caps["body"].trim().to_string();
    }
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a reply into validated line items.
pub fn parse_response(raw: &str) -> Result<Vec<ExtractedItem>> {
    let body = strip_fences(raw);
    debug!(len = body.len(), "parsing extraction reply");

    let value = match serde_json::from_str::<Value>(&body) {
        Ok(v) => v,
        Err(first) => {
            // Fall back to the outermost [...] if the model added prose
            let inner = match (body.find('['), body.rfind(']')) {
                (Some(s), Some(e)) if s < e => &body[s..=e],
                _ => return Err(DaybookError::Extraction(format!("reply is not JSON: {first}"))),
            };
            warn!("extraction reply had text around the JSON list");
            serde_json::from_str(inner)
                .map_err(|e| DaybookError::Extraction(format!("reply is not JSON: {e}")))?
        }
    };

    let entries = match value {
        Value::Array(entries) => entries,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(DaybookError::Extraction(format!(
                "expected a JSON list, got {}",
                kind(&other)
            )));
        }
    };

    if entries.is_empty() {
        return Err(DaybookError::Extraction("no expenses found in the text".into()));
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::Object(map) => item_from_object(i + 1, map),
            other => Err(DaybookError::Extraction(format!(
                "entry {} is {}, not an object",
                i + 1,
                kind(other)
            ))),
        })
        .collect()
}

fn item_from_object(n: usize, map: &Map<String, Value>) -> Result<ExtractedItem> {
    let item = match field(map, "item") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(num)) => num.to_string(),
        _ => {
            return Err(DaybookError::Validation(format!("entry {n} has no Item")));
        }
    };

    let category = match field(map, "category") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    };

    let amount = match field(map, "amount") {
        Some(Value::Number(num)) => num.as_f64(),
        Some(Value::String(s)) => parse_amount(s),
        _ => None,
    }
    .ok_or_else(|| DaybookError::Validation(format!("entry {n} ({item}) has no numeric Amount")))?;

    if amount < 0.0 {
        return Err(DaybookError::Validation(format!(
            "entry {n} ({item}) has a negative Amount: {amount}"
        )));
    }

    Ok(ExtractedItem {
        item,
        category,
        amount,
    })
}

/// Case-insensitive key lookup.
fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
