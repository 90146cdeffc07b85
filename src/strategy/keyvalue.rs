//! Key-value strategy: line-oriented `key=value` files (.npmrc and
//! friends).
//!
//! `set` replaces the first line starting with `key<separator>` or
//! `key<space>` in place, optionally preceded by an injected comment
//! line; when the key is absent a new line is appended. A missing file
//! is treated as empty and created on `set`; `get` on a missing file is
//! `ConfigNotFound`. `get` with no matching key returns an empty
//! string, not an error.

use std::collections::HashMap;
use std::path::Path;

use crate::config::model::{KeyValueGet, KeyValueSet};
use crate::error::MirrorSwitchError;
use crate::template;

use super::{read_target, write_atomic};

fn line_matches_key(line: &str, key: &str, separator: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix(key)
        .is_some_and(|rest| rest.starts_with(separator) || rest.starts_with(' '))
}

pub async fn set_value(
    path: &Path,
    set: &KeyValueSet,
    variables: &HashMap<String, String>,
) -> Result<(), MirrorSwitchError> {
    let content = match read_target(path).await {
        Ok(content) => content,
        Err(MirrorSwitchError::ConfigNotFound { .. }) => String::new(),
        Err(e) => return Err(e),
    };

    let value = template::resolve(&set.value, variables)?;
    let new_line = format!("{}{}{}", set.key, set.separator, value);

    let lines: Vec<&str> = content.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 2);
    let mut replaced = false;

    for (i, line) in lines.iter().enumerate() {
        if !replaced && line_matches_key(line, &set.key, &set.separator) {
            if let Some(ref comment) = set.comment {
                // Don't stack a second copy of the comment on re-runs.
                let already_commented = i > 0 && lines[i - 1].trim() == comment.trim();
                if !already_commented {
                    out.push(comment.clone());
                }
            }
            out.push(new_line.clone());
            replaced = true;
        } else {
            out.push((*line).to_string());
        }
    }

    if !replaced {
        if let Some(ref comment) = set.comment {
            out.push(comment.clone());
        }
        out.push(new_line);
    }

    let mut updated = out.join("\n");
    updated.push('\n');

    write_atomic(path, updated).await
}

pub async fn get_value(path: &Path, get: &KeyValueGet) -> Result<String, MirrorSwitchError> {
    let content = read_target(path).await?;

    for line in content.lines() {
        if line_matches_key(line, &get.key, &get.separator) {
            let trimmed = line.trim_start();
            let rest = &trimmed[get.key.len()..];
            let value = rest
                .strip_prefix(&get.separator)
                .unwrap_or_else(|| rest.trim_start_matches(' '));
            return Ok(value.trim().to_string());
        }
    }

    Ok(String::new())
}
