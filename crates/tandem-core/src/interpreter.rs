use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::commands::Command;

/// What a raw model response turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// An ordered command batch to dispatch.
    Commands(Vec<Command>),
    /// A bare array whose first element lacks `action` is treated as a raw
    /// data payload (e.g. catalog search results), passed through undispatched.
    RawData(Value),
    /// Plain conversational text with no JSON shape.
    Chat(String),
}

#[derive(Debug, thiserror::Error)]
#[error("model response is not valid JSON: {text}")]
pub struct ParseError {
    /// The offending slice, attached for the user-visible error reply.
    pub text: String,
    #[source]
    pub source: serde_json::Error,
}

fn fence_marker() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[A-Za-z]*").expect("static pattern"))
}

/// Extracts a normalized command batch from raw model output.
///
/// Markdown code fences are stripped first. Text that does not start with `[`
/// is sliced from the first `{` to the last `}` to shed surrounding prose; a
/// single object is wrapped into a one-element batch.
pub fn interpret(raw: &str) -> Result<Interpretation, ParseError> {
    let stripped = fence_marker().replace_all(raw, "");
    let trimmed = stripped.trim();

    let candidate = if trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(open), Some(close)) if open < close => trimmed[open..=close].to_string(),
            _ => return Ok(Interpretation::Chat(trimmed.to_string())),
        }
    };

    let value: Value = serde_json::from_str(&candidate).map_err(|source| ParseError {
        text: candidate.clone(),
        source,
    })?;

    let elements = match value {
        Value::Array(elements) => elements,
        single => vec![single],
    };

    match elements.first() {
        None => Ok(Interpretation::Commands(Vec::new())),
        Some(first) if first.get("action").is_none() => {
            Ok(Interpretation::RawData(Value::Array(elements)))
        }
        Some(_) => Ok(Interpretation::Commands(
            elements.into_iter().map(decode_command).collect(),
        )),
    }
}

fn decode_command(element: Value) -> Command {
    let action = element
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or("(none)")
        .to_string();
    serde_json::from_value(element).unwrap_or(Command::Unknown { action })
}
