//! JSON-path strategy: dot-separated navigation through nested objects.
//!
//! `set` creates missing intermediate objects as it descends and
//! replaces the leaf wholesale. String leaves anywhere inside the
//! configured value (including nested arrays/objects) are
//! template-resolved before writing. `get` returns the raw JSON value
//! at the path, `Null` when any segment is absent.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::model::{JsonPathGet, JsonPathSet};
use crate::error::MirrorSwitchError;
use crate::template;

use super::{read_target, write_atomic};

/// Template-resolve every string leaf of `value`, recursively.
fn resolve_value(
    value: &Value,
    variables: &HashMap<String, String>,
) -> Result<Value, MirrorSwitchError> {
    Ok(match value {
        Value::String(s) => Value::String(template::resolve(s, variables)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_value(v, variables))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, variables)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

pub async fn set_value(
    path: &Path,
    set: &JsonPathSet,
    variables: &HashMap<String, String>,
) -> Result<(), MirrorSwitchError> {
    let content = match read_target(path).await {
        Ok(content) => content,
        Err(MirrorSwitchError::ConfigNotFound { .. }) => {
            let ensure = set.ensure_structure.as_ref().filter(|e| e.create_if_missing);
            let Some(ensure) = ensure else {
                return Err(MirrorSwitchError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            };
            if ensure.create_parent_directories {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            match ensure.default_structure {
                Some(ref structure) => template::resolve(structure, variables)?,
                None => "{}".to_string(),
            }
        }
        Err(e) => return Err(e),
    };

    let mut root: Value = serde_json::from_str(&content)
        .map_err(|e| MirrorSwitchError::parse(format!("invalid JSON in {}: {e}", path.display())))?;

    let resolved = resolve_value(&set.value, variables)?;

    let mut cursor = &mut root;
    let segments: Vec<&str> = set.jsonpath.split('.').filter(|s| !s.is_empty()).collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(MirrorSwitchError::parse(format!(
            "empty jsonpath '{}'",
            set.jsonpath
        )));
    };
    for segment in parents {
        let object = cursor.as_object_mut().ok_or_else(|| {
            MirrorSwitchError::parse(format!(
                "jsonpath '{}': segment '{segment}' is not an object",
                set.jsonpath
            ))
        })?;
        cursor = object
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }

    let object = cursor.as_object_mut().ok_or_else(|| {
        MirrorSwitchError::parse(format!(
            "jsonpath '{}': parent of '{leaf}' is not an object",
            set.jsonpath
        ))
    })?;
    object.insert((*leaf).to_string(), resolved);

    let mut serialized = serde_json::to_string_pretty(&root)
        .map_err(|e| MirrorSwitchError::parse(format!("JSON serialization failed: {e}")))?;
    serialized.push('\n');

    write_atomic(path, serialized).await
}

pub async fn get_value(path: &Path, get: &JsonPathGet) -> Result<Value, MirrorSwitchError> {
    let content = read_target(path).await?;

    let root: Value = serde_json::from_str(&content)
        .map_err(|e| MirrorSwitchError::parse(format!("invalid JSON in {}: {e}", path.display())))?;

    let mut cursor = &root;
    for segment in get.jsonpath.split('.').filter(|s| !s.is_empty()) {
        match cursor.get(segment) {
            Some(next) => cursor = next,
            None => return Ok(Value::Null),
        }
    }

    Ok(cursor.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::EnsureStructure;
    use serde_json::json;

    fn vars() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("url".to_string(), "https://mirror.example.com".to_string());
        m
    }

    fn json_set(file: &Path, jsonpath: &str, value: Value) -> JsonPathSet {
        JsonPathSet {
            file_path: file.to_string_lossy().into_owned(),
            jsonpath: jsonpath.into(),
            value,
            merge_strategy: None,
            ensure_structure: Some(EnsureStructure {
                create_if_missing: true,
                default_structure: None,
                create_parent_directories: false,
            }),
        }
    }

    fn json_get(file: &Path, jsonpath: &str) -> JsonPathGet {
        JsonPathGet {
            file_path: file.to_string_lossy().into_owned(),
            jsonpath: jsonpath.into(),
        }
    }

    #[tokio::test]
    async fn set_builds_missing_intermediate_objects() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, "{}").unwrap();

        set_value(&file, &json_set(&file, "a.b.c", json!("{{url}}")), &vars())
            .await
            .unwrap();

        let root: Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(root["a"]["b"]["c"], json!("https://mirror.example.com"));
    }

    #[tokio::test]
    async fn strings_inside_arrays_are_template_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, "{}").unwrap();

        set_value(
            &file,
            &json_set(&file, "registry-mirrors", json!(["{{url}}"])),
            &vars(),
        )
        .await
        .unwrap();

        let root: Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(root["registry-mirrors"], json!(["https://mirror.example.com"]));
    }

    #[tokio::test]
    async fn set_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, r#"{"log-driver": "json-file"}"#).unwrap();

        set_value(&file, &json_set(&file, "registry-mirrors", json!(["{{url}}"])), &vars())
            .await
            .unwrap();

        let root: Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(root["log-driver"], json!("json-file"));
    }

    #[tokio::test]
    async fn set_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, "{}").unwrap();
        let set = json_set(&file, "a.b", json!("{{url}}"));

        set_value(&file, &set, &vars()).await.unwrap();
        let first = std::fs::read_to_string(&file).unwrap();
        set_value(&file, &set, &vars()).await.unwrap();
        let second = std::fs::read_to_string(&file).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_missing_segment_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, r#"{"a": {}}"#).unwrap();

        let value = get_value(&file, &json_get(&file, "a.b.c")).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("daemon.json");
        std::fs::write(&file, "{}").unwrap();

        set_value(&file, &json_set(&file, "registry.url", json!("{{url}}")), &vars())
            .await
            .unwrap();
        let value = get_value(&file, &json_get(&file, "registry.url")).await.unwrap();
        assert_eq!(value, json!("https://mirror.example.com"));
    }

    #[tokio::test]
    async fn missing_file_without_ensure_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("absent.json");
        let mut set = json_set(&file, "a", json!(1));
        set.ensure_structure = None;

        let err = set_value(&file, &set, &vars()).await.unwrap_err();
        assert!(matches!(err, MirrorSwitchError::ConfigNotFound { .. }));
    }
}
