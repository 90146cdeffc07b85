//! Template variable substitution for strategy configuration values.
//!
//! Strategy fields may contain `{{name}}` placeholders that are filled
//! from the chosen mirror source and from values captured by precursor
//! commands. Substitution is all-or-nothing: an unresolved placeholder
//! fails with [`MirrorSwitchError::VariableNotFound`] rather than being
//! silently left in place.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::model::SourceConfiguration;
use crate::error::MirrorSwitchError;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap())
}

/// Substitute every `{{name}}` placeholder in `template` from `variables`.
///
/// All matches are located in one pass over the original template, so a
/// substituted value containing `{{` is never re-expanded.
pub fn resolve(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, MirrorSwitchError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_pattern().captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];

        let value =
            variables
                .get(name)
                .ok_or_else(|| MirrorSwitchError::VariableNotFound {
                    name: name.to_string(),
                })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Resolve each element of a template list.
pub fn resolve_all(
    templates: &[String],
    variables: &HashMap<String, String>,
) -> Result<Vec<String>, MirrorSwitchError> {
    templates.iter().map(|t| resolve(t, variables)).collect()
}

/// Seed the variable map from the chosen source (`url`, `id`, `name`),
/// then overlay captured context values. Context entries win on
/// collision so a precursor capture can shadow a source field.
#[must_use]
pub fn extract_variables(
    source: &SourceConfiguration,
    context: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("url".to_string(), source.url.clone());
    variables.insert("id".to_string(), source.id.clone());
    variables.insert("name".to_string(), source.name.clone());

    for (key, value) in context {
        variables.insert(key.clone(), value.clone());
    }

    variables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_single_variable() {
        let resolved = resolve("{{url}}/x", &vars(&[("url", "http://m")])).unwrap();
        assert_eq!(resolved, "http://m/x");
    }

    #[test]
    fn substitutes_multiple_variables() {
        let resolved = resolve(
            "registry {{name}} at {{url}}",
            &vars(&[("name", "taobao"), ("url", "https://registry.npmmirror.com")]),
        )
        .unwrap();
        assert_eq!(resolved, "registry taobao at https://registry.npmmirror.com");
    }

    #[test]
    fn missing_variable_fails() {
        let err = resolve("{{missing}}", &HashMap::new()).unwrap_err();
        match err {
            MirrorSwitchError::VariableNotFound { name } => assert_eq!(name, "missing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn partial_resolution_is_rejected() {
        // One resolvable and one missing placeholder: must fail, not
        // half-substitute.
        let err = resolve("{{url}} {{gone}}", &vars(&[("url", "http://m")]));
        assert!(err.is_err());
    }

    #[test]
    fn substituted_values_are_not_re_expanded() {
        let resolved = resolve("{{a}}", &vars(&[("a", "{{b}}"), ("b", "nope")])).unwrap();
        assert_eq!(resolved, "{{b}}");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let resolved = resolve("plain text", &HashMap::new()).unwrap();
        assert_eq!(resolved, "plain text");
    }

    #[test]
    fn extract_seeds_source_fields_and_overlays_context() {
        let source = SourceConfiguration {
            id: "taobao".into(),
            name: "Taobao".into(),
            url: "https://registry.npmmirror.com".into(),
            description: None,
            region: None,
            requires_auth: false,
            auth: None,
            config_source_id: None,
            config_source_name: None,
            config_source_is_builtin: None,
        };
        let context = vars(&[("home", "/opt/tool"), ("url", "shadowed")]);
        let variables = extract_variables(&source, &context);
        assert_eq!(variables["id"], "taobao");
        assert_eq!(variables["name"], "Taobao");
        assert_eq!(variables["home"], "/opt/tool");
        // Context wins over source fields
        assert_eq!(variables["url"], "shadowed");
    }
}
