//! Output parsers applied to captured command stdout.
//!
//! Each parser turns raw subprocess output into the single value a
//! template or caller actually wants: a trimmed string, the first URL,
//! a domain, the first line, a JSON leaf, or a regex capture.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::model::OutputParser;
use crate::error::MirrorSwitchError;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap())
}

/// Apply `parser` to `raw`. `pattern` is consumed only by the `regex`
/// parser (first capture group if present, else whole match).
pub fn apply(
    parser: OutputParser,
    pattern: Option<&str>,
    raw: &str,
) -> Result<String, MirrorSwitchError> {
    match parser {
        OutputParser::Trim => Ok(raw.trim().to_string()),

        OutputParser::FirstLine => Ok(raw.lines().next().unwrap_or("").trim().to_string()),

        OutputParser::ExtractUrl => url_pattern()
            .find(raw)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| MirrorSwitchError::parse("no URL found in command output")),

        OutputParser::ExtractDomain => {
            let candidate = url_pattern()
                .find(raw)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| raw.trim().to_string());
            Url::parse(&candidate)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .ok_or_else(|| MirrorSwitchError::parse("no domain found in command output"))
        }

        OutputParser::Json => {
            let value: serde_json::Value = serde_json::from_str(raw.trim())
                .map_err(|e| MirrorSwitchError::parse(format!("invalid JSON output: {e}")))?;
            Ok(match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
        }

        OutputParser::Regex => {
            let pattern = pattern.ok_or_else(|| {
                MirrorSwitchError::parse("regex output parser requires parserPattern")
            })?;
            let re = Regex::new(pattern)
                .map_err(|e| MirrorSwitchError::parse(format!("bad parserPattern: {e}")))?;
            let caps = re
                .captures(raw)
                .ok_or_else(|| MirrorSwitchError::parse("parserPattern matched nothing"))?;
            let m = caps
                .get(1)
                .or_else(|| caps.get(0))
                .ok_or_else(|| MirrorSwitchError::parse("parserPattern matched nothing"))?;
            Ok(m.as_str().to_string())
        }
    }
}
