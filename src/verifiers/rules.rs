//! Rule configuration
//!
//! Rule sets are accepted in three shapes so existing configuration files keep
//! working:
//!
//! - a map of pattern to comment: `{"Script\\s+src": "devtool script"}`
//! - a list of patterns: `["META", "/>"]`
//! - a list of records: `[{"pattern": "/>", "comment": "self-closing"}]`
//!
//! Wrapping rules are either a map of `{child, parent}` records keyed by a
//! description, which doubles as the rule comment, or a list of them. Order is
//! always the configuration order.

use regex::{Regex, RegexBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// A configured pattern with its optional comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    pub pattern: String,
    pub comment: String,
}

/// Ordered set of pattern rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct PatternRules(pub Vec<PatternRule>);

/// A `{child, parent}` ancestor rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WrappingRule {
    /// Regular expression for the full tag name of candidate elements
    pub child: String,
    /// Selector tested against each ancestor
    pub parent: String,
    #[serde(default)]
    pub comment: String,
}

/// Ordered set of wrapping rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct WrappingRules(pub Vec<WrappingRule>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternEntry {
    Pattern(String),
    Record {
        pattern: String,
        #[serde(default)]
        comment: String,
    },
}

impl TryFrom<Value> for PatternRules {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => Ok(Self(
                map.into_iter()
                    .map(|(pattern, comment)| PatternRule {
                        pattern,
                        comment: comment_text(comment),
                    })
                    .collect(),
            )),
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    serde_json::from_value::<PatternEntry>(item)
                        .map(|entry| match entry {
                            PatternEntry::Pattern(pattern) => PatternRule {
                                pattern,
                                comment: String::new(),
                            },
                            PatternEntry::Record { pattern, comment } => {
                                PatternRule { pattern, comment }
                            }
                        })
                        .map_err(|_| {
                            "expected a pattern string or a {pattern, comment} record".to_string()
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(format!(
                "expected a map or a list of patterns, got {}",
                json_type(&other)
            )),
        }
    }
}

impl TryFrom<Value> for WrappingRules {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        // In the map form the key describes the rule
        let items: Vec<(Option<String>, Value)> = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map.into_iter().map(|(key, rule)| (Some(key), rule)).collect(),
            Value::Array(items) => items.into_iter().map(|rule| (None, rule)).collect(),
            other => {
                return Err(format!(
                    "expected a map or a list of {{child, parent}} rules, got {}",
                    json_type(&other)
                ));
            }
        };

        items
            .into_iter()
            .map(|(key, item)| {
                let mut rule = serde_json::from_value::<WrappingRule>(item)
                    .map_err(|e| format!("invalid {{child, parent}} rule: {e}"))?;
                if rule.comment.is_empty() {
                    rule.comment = key.unwrap_or_default();
                }
                Ok(rule)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl PatternRules {
    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.0.iter()
    }
}

impl WrappingRules {
    pub fn iter(&self) -> impl Iterator<Item = &WrappingRule> {
        self.0.iter()
    }
}

fn comment_text(value: Value) -> String {
    match value {
        Value::String(comment) => comment,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// Deserialize a verifier's configuration; `null` means all defaults and
/// unknown keys are ignored
pub fn parse_config<T>(verifier: &str, config: &Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone()).map_err(|e| ConfigError::InvalidConfig {
        verifier: verifier.to_string(),
        message: e.to_string(),
    })
}

/// A compiled pattern rule
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pub rule: PatternRule,
    pub regex: Regex,
}

/// Compile a case-insensitive, unanchored pattern
pub fn compile_pattern(verifier: &str, rule: &PatternRule) -> Result<PatternMatcher, ConfigError> {
    Ok(PatternMatcher {
        rule: rule.clone(),
        regex: build_regex(verifier, &rule.pattern, &rule.pattern)?,
    })
}

/// Compile a case-insensitive pattern that must match a whole name
pub fn compile_anchored(verifier: &str, pattern: &str) -> Result<Regex, ConfigError> {
    build_regex(verifier, &format!("^(?:{pattern})$"), pattern)
}

fn build_regex(verifier: &str, expression: &str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(expression)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            verifier: verifier.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// Append a rule comment to a message when one is configured
pub fn with_comment(message: String, comment: &str) -> String {
    if comment.trim().is_empty() {
        message
    } else {
        format!("{message} ({comment})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_rules_from_map_keep_order() {
        let rules: PatternRules =
            serde_json::from_value(json!({"META": "", "/>": "self-closing", "b": null})).unwrap();

        assert_eq!(
            rules.0,
            vec![
                PatternRule {
                    pattern: "META".to_string(),
                    comment: String::new()
                },
                PatternRule {
                    pattern: "/>".to_string(),
                    comment: "self-closing".to_string()
                },
                PatternRule {
                    pattern: "b".to_string(),
                    comment: String::new()
                },
            ]
        );
    }

    #[test]
    fn test_pattern_rules_from_list() {
        let rules: PatternRules = serde_json::from_value(json!([
            "html",
            {"pattern": "body", "comment": "page body"}
        ]))
        .unwrap();

        assert_eq!(rules.0.len(), 2);
        assert_eq!(rules.0[1].comment, "page body");
    }

    #[test]
    fn test_pattern_rules_reject_scalars() {
        assert!(serde_json::from_value::<PatternRules>(json!("html")).is_err());
        assert!(serde_json::from_value::<PatternRules>(json!([1, 2])).is_err());
    }

    #[test]
    fn test_wrapping_rules_from_named_map() {
        let rules: WrappingRules = serde_json::from_value(json!({
            "table:plain": {"child": "table:plain", "parent": "n\\:form"},
            "button": {"child": "button:.*", "parent": "button\\:block", "note": "ignored"}
        }))
        .unwrap();

        assert_eq!(rules.0.len(), 2);
        assert_eq!(rules.0[0].parent, "n\\:form");
        assert_eq!(rules.0[0].comment, "table:plain");
        assert_eq!(rules.0[1].child, "button:.*");
    }

    #[test]
    fn test_wrapping_rules_from_list_keep_explicit_comment() {
        let rules: WrappingRules = serde_json::from_value(json!([
            {"child": "body", "parent": "html", "comment": "no nested bodies"},
            {"child": "td", "parent": "tr"}
        ]))
        .unwrap();

        assert_eq!(rules.0[0].comment, "no nested bodies");
        assert_eq!(rules.0[1].comment, "");
    }

    #[test]
    fn test_wrapping_rules_require_child_and_parent() {
        let result = serde_json::from_value::<WrappingRules>(json!([{"child": "x"}]));
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_anchored_matches_whole_name() {
        let regex = compile_anchored("V", "html|body").unwrap();

        assert!(regex.is_match("HTML"));
        assert!(regex.is_match("body"));
        assert!(!regex.is_match("tbody"));
        assert!(!regex.is_match("htmlx"));
    }

    #[test]
    fn test_compile_reports_invalid_pattern() {
        let err = compile_anchored("TagUsageVerifier", "(").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }

    #[test]
    fn test_with_comment() {
        assert_eq!(with_comment("msg".to_string(), ""), "msg");
        assert_eq!(with_comment("msg".to_string(), "why"), "msg (why)");
    }

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default)]
        required: PatternRules,
    }

    #[test]
    fn test_parse_config_null_and_unknown_keys() {
        let empty: Sample = parse_config("V", &Value::Null).unwrap();
        assert!(empty.required.0.is_empty());

        let sample: Sample =
            parse_config("V", &json!({"required": ["a"], "unknown": true})).unwrap();
        assert_eq!(sample.required.0.len(), 1);

        let err = parse_config::<Sample>("V", &json!({"required": 5})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig { .. }));
    }
}
