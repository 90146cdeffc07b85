//! XML strategy: XPath-lite mutation that never reformats the file.
//!
//! `set` deliberately avoids parsing and re-serializing the XML tree;
//! that would rewrite the user's whitespace, comments, and attribute
//! order. Instead the configured path is reduced to an element-name
//! chain and a regex locates the leaf's text span, which is replaced in
//! place. The **first** match in the document is always the one
//! replaced. `get` is a true element-tree walk over the parsed
//! document, so both halves answer for the same location.
//!
//! Namespace prefixes in the path are compared by local name only; the
//! `namespaces` map is accepted for configuration compatibility.

use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::config::model::{XmlGet, XmlSet};
use crate::error::MirrorSwitchError;
use crate::template;

use super::{read_target, write_atomic};

/// Split an XPath-lite expression (`//settings/mirrors/mirror/url`)
/// into its element-name chain.
fn path_segments(xpath: &str) -> Result<Vec<&str>, MirrorSwitchError> {
    let segments: Vec<&str> = xpath
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(MirrorSwitchError::parse(format!("empty xpath '{xpath}'")));
    }
    Ok(segments)
}

fn local_name(segment: &str) -> &str {
    segment.rsplit(':').next().unwrap_or(segment)
}

/// Regex matching the parent chain (non-greedy) followed by the leaf
/// element, capturing the leaf's text content.
fn leaf_pattern(segments: &[&str]) -> Result<Regex, MirrorSwitchError> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(MirrorSwitchError::parse("empty xpath"));
    };

    let mut pattern = String::new();
    for parent in parents {
        let name = regex::escape(local_name(parent));
        pattern.push_str(&format!(r"<(?:[\w.-]+:)?{name}(?:\s[^>]*)?>.*?"));
    }
    let name = regex::escape(local_name(leaf));
    pattern.push_str(&format!(
        r"<(?:[\w.-]+:)?{name}(?:\s[^>]*)?>(.*?)</(?:[\w.-]+:)?{name}\s*>"
    ));

    RegexBuilder::new(&pattern)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| MirrorSwitchError::parse(format!("bad xpath '{}': {e}", segments.join("/"))))
}

pub async fn set_value(
    path: &Path,
    set: &XmlSet,
    variables: &std::collections::HashMap<String, String>,
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
            let Some(ref structure) = ensure.default_structure else {
                return Err(MirrorSwitchError::parse(
                    "createIfMissing is set but defaultStructure is empty",
                ));
            };
            if ensure.create_parent_directories {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            template::resolve(structure, variables)?
        }
        Err(e) => return Err(e),
    };

    let value = template::resolve(&set.value, variables)?;
    let segments = path_segments(&set.xpath)?;
    let pattern = leaf_pattern(&segments)?;

    let Some(caps) = pattern.captures(&content) else {
        return Err(MirrorSwitchError::parse(format!(
            "xpath '{}' matched nothing in {}",
            set.xpath,
            path.display()
        )));
    };
    let Some(span) = caps.get(1) else {
        return Err(MirrorSwitchError::parse(format!(
            "xpath '{}' matched without a text span",
            set.xpath
        )));
    };

    let mut updated = String::with_capacity(content.len() + value.len());
    updated.push_str(&content[..span.start()]);
    updated.push_str(&value);
    updated.push_str(&content[span.end()..]);

    write_atomic(path, updated).await
}

pub async fn get_value(path: &Path, get: &XmlGet) -> Result<String, MirrorSwitchError> {
    let content = read_target(path).await?;
    let segments = path_segments(&get.xpath)?;

    let doc = roxmltree::Document::parse(&content)
        .map_err(|e| MirrorSwitchError::parse(format!("invalid XML in {}: {e}", path.display())))?;

    let root = doc.root_element();
    let mut remaining = &segments[..];

    // The first segment may name the document root itself.
    if local_name(segments[0]) == root.tag_name().name() {
        remaining = &segments[1..];
    }

    let mut current = root;
    for segment in remaining {
        let wanted = local_name(segment);
        current = current
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == wanted)
            .ok_or_else(|| {
                MirrorSwitchError::parse(format!(
                    "element '{wanted}' not found under '{}'",
                    current.tag_name().name()
                ))
            })?;
    }

    if let Some(ref attribute) = get.attribute {
        return Ok(current.attribute(attribute.as_str()).unwrap_or("").to_string());
    }

    Ok(current.text().unwrap_or("").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::EnsureStructure;
    use std::collections::HashMap;

    fn vars() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("url".to_string(), "http://new".to_string());
        m
    }

    fn xml_set(file: &Path, xpath: &str) -> XmlSet {
        XmlSet {
            file_path: file.to_string_lossy().into_owned(),
            xpath: xpath.into(),
            value: "{{url}}".into(),
            namespaces: HashMap::new(),
            ensure_structure: None,
        }
    }

    fn xml_get(file: &Path, xpath: &str) -> XmlGet {
        XmlGet {
            file_path: file.to_string_lossy().into_owned(),
            xpath: xpath.into(),
            namespaces: HashMap::new(),
            attribute: None,
        }
    }

    #[tokio::test]
    async fn set_replaces_only_the_leaf_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        let original = "<mirrors>\n  <mirror>\n    <url>http://old</url>\n  </mirror>\n</mirrors>\n";
        std::fs::write(&file, original).unwrap();

        set_value(&file, &xml_set(&file, "//mirrors/mirror/url"), &vars())
            .await
            .unwrap();

        let updated = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            updated,
            "<mirrors>\n  <mirror>\n    <url>http://new</url>\n  </mirror>\n</mirrors>\n"
        );
    }

    #[tokio::test]
    async fn set_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(&file, "<m><url>http://old</url></m>").unwrap();
        let set = xml_set(&file, "//m/url");

        set_value(&file, &set, &vars()).await.unwrap();
        let first = std::fs::read_to_string(&file).unwrap();
        set_value(&file, &set, &vars()).await.unwrap();
        let second = std::fs::read_to_string(&file).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn set_preserves_comments_and_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        let original =
            "<!-- user file -->\n<m xmlns=\"urn:x\">\n  <url kind=\"main\">http://old</url>\n</m>";
        std::fs::write(&file, original).unwrap();

        set_value(&file, &xml_set(&file, "//m/url"), &vars())
            .await
            .unwrap();

        let updated = std::fs::read_to_string(&file).unwrap();
        assert!(updated.contains("<!-- user file -->"));
        assert!(updated.contains("<url kind=\"main\">http://new</url>"));
        assert!(updated.contains("xmlns=\"urn:x\""));
    }

    #[tokio::test]
    async fn set_targets_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(
            &file,
            "<m><url>http://first</url><url>http://second</url></m>",
        )
        .unwrap();

        set_value(&file, &xml_set(&file, "//m/url"), &vars())
            .await
            .unwrap();

        let updated = std::fs::read_to_string(&file).unwrap();
        assert_eq!(updated, "<m><url>http://new</url><url>http://second</url></m>");
    }

    #[tokio::test]
    async fn missing_file_without_ensure_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("absent.xml");

        let err = set_value(&file, &xml_set(&file, "//m/url"), &vars())
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorSwitchError::ConfigNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_file_with_ensure_writes_default_structure() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("settings.xml");

        let mut set = xml_set(&file, "//m/url");
        set.ensure_structure = Some(EnsureStructure {
            create_if_missing: true,
            default_structure: Some("<m><url>placeholder</url></m>".into()),
            create_parent_directories: true,
        });

        set_value(&file, &set, &vars()).await.unwrap();
        let content = std::fs::read_to_string(&file).unwrap();
        assert_eq!(content, "<m><url>http://new</url></m>");
    }

    #[tokio::test]
    async fn get_walks_the_element_tree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(
            &file,
            "<settings><mirrors><mirror><url>http://cur</url></mirror></mirrors></settings>",
        )
        .unwrap();

        let value = get_value(&file, &xml_get(&file, "//settings/mirrors/mirror/url"))
            .await
            .unwrap();
        assert_eq!(value, "http://cur");
    }

    #[tokio::test]
    async fn get_missing_segment_is_parse_failed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(&file, "<settings><other/></settings>").unwrap();

        let err = get_value(&file, &xml_get(&file, "//settings/mirrors/url"))
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorSwitchError::ParseFailed { .. }));
    }

    #[tokio::test]
    async fn get_reads_attribute_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(&file, "<m><url kind=\"main\">http://cur</url></m>").unwrap();

        let mut get = xml_get(&file, "//m/url");
        get.attribute = Some("kind".into());
        assert_eq!(get_value(&file, &get).await.unwrap(), "main");
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.xml");
        std::fs::write(&file, "<m><url>http://old</url></m>").unwrap();

        set_value(&file, &xml_set(&file, "//m/url"), &vars())
            .await
            .unwrap();
        let value = get_value(&file, &xml_get(&file, "//m/url")).await.unwrap();
        assert_eq!(value, "http://new");
    }
}
