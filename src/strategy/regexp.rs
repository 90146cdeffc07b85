//! Regex strategy: pattern substitution over the whole file.
//!
//! `set` resolves the replacement template (which may also reference
//! regex capture groups, e.g. `$1`) and rewrites either the first match
//! or every match depending on `global`. There is no
//! file-creation-on-missing support; a missing target is
//! `ConfigNotFound`. `get` returns the configured capture group of the
//! first match, or an empty string when nothing matches.

use std::collections::HashMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::config::model::{RegexGet, RegexSet};
use crate::error::MirrorSwitchError;
use crate::template;

use super::{read_target, write_atomic};

fn build_regex(pattern: &str, options: &[String]) -> Result<Regex, MirrorSwitchError> {
    let mut builder = RegexBuilder::new(pattern);
    for option in options {
        match option.as_str() {
            "caseInsensitive" => {
                builder.case_insensitive(true);
            }
            "multiline" => {
                builder.multi_line(true);
            }
            "dotMatchesLineSeparators" => {
                builder.dot_matches_new_line(true);
            }
            other => {
                return Err(MirrorSwitchError::parse(format!(
                    "unknown regex option '{other}'"
                )));
            }
        }
    }
    builder
        .build()
        .map_err(|e| MirrorSwitchError::parse(format!("bad pattern '{pattern}': {e}")))
}

pub async fn set_value(
    path: &Path,
    set: &RegexSet,
    variables: &HashMap<String, String>,
) -> Result<(), MirrorSwitchError> {
    let content = read_target(path).await?;

    // Template variables first, capture-group references second: the
    // resolved text is handed to the regex engine as the replacement
    // string, so `$1` et al in the configured replacement survive
    // resolution. Dollar signs inside substituted values are escaped
    // so they stay literal instead of reading as group references.
    let escaped: HashMap<String, String> = variables
        .iter()
        .map(|(k, v)| (k.clone(), v.replace('$', "$$")))
        .collect();
    let replacement = template::resolve(&set.replacement, &escaped)?;
    let pattern = build_regex(&set.pattern, &set.options)?;

    if !pattern.is_match(&content) {
        return Err(MirrorSwitchError::parse(format!(
            "pattern '{}' matched nothing in {}",
            set.pattern,
            path.display()
        )));
    }

    let updated = if set.global {
        pattern.replace_all(&content, replacement.as_str())
    } else {
        pattern.replace(&content, replacement.as_str())
    };

    write_atomic(path, updated.into_owned()).await
}

pub async fn get_value(path: &Path, get: &RegexGet) -> Result<String, MirrorSwitchError> {
    let content = read_target(path).await?;

    let pattern = Regex::new(&get.pattern)
        .map_err(|e| MirrorSwitchError::parse(format!("bad pattern '{}': {e}", get.pattern)))?;

    Ok(pattern
        .captures(&content)
        .and_then(|caps| caps.get(get.capture_group))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default())
}
