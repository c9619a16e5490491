//! Ancestor rules
//!
//! `child` is a regular expression that must match an element's whole tag
//! name; `parent` is a selector tested against the element's ancestors.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::rules::{compile_anchored, parse_config, with_comment, WrappingRule, WrappingRules};
use super::VerificationInput;
use crate::error::ConfigError;
use crate::parser::{Document, NodeId};
use crate::selector::Selector;
use crate::validation::VerificationError;

pub const NAME: &str = "WrappingTagVerifier";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WrappingConfig {
    #[serde(default)]
    pub required: WrappingRules,
    #[serde(default)]
    pub forbidden: WrappingRules,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    child: Regex,
    parent: Selector,
    comment: String,
}

impl CompiledRule {
    fn compile(rule: &WrappingRule) -> Result<Self, ConfigError> {
        let parent = Selector::parse(&rule.parent).map_err(|source| {
            ConfigError::InvalidSelector {
                verifier: NAME.to_string(),
                source,
            }
        })?;

        Ok(Self {
            child: compile_anchored(NAME, &rule.child)?,
            parent,
            comment: rule.comment.clone(),
        })
    }

    fn has_matching_ancestor(&self, document: &Document, id: NodeId) -> bool {
        document
            .ancestors(id)
            .any(|ancestor| self.parent.matches(document, ancestor))
    }
}

#[derive(Debug, Clone)]
pub struct WrappingTagVerifier {
    required: Vec<CompiledRule>,
    forbidden: Vec<CompiledRule>,
}

impl WrappingTagVerifier {
    pub fn new(config: &WrappingConfig) -> Result<Self, ConfigError> {
        let compile = |rules: &WrappingRules| {
            rules
                .iter()
                .map(CompiledRule::compile)
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            required: compile(&config.required)?,
            forbidden: compile(&config.forbidden)?,
        })
    }

    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::new(&parse_config(NAME, config)?)
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        let document = input.document;
        let mut errors = Vec::new();

        for id in document.elements() {
            let Some(element) = document.element(id) else {
                continue;
            };
            let tag = element.tag_name.as_str();

            for rule in &self.required {
                if rule.child.is_match(tag) && !rule.has_matching_ancestor(document, id) {
                    let message = format!(
                        "<{tag}> has no ancestor matching <{}>",
                        rule.parent
                    );
                    errors.push(VerificationError::new(
                        NAME,
                        with_comment(message, &rule.comment),
                        path,
                        document.outer_markup(id),
                    ));
                }
            }

            for rule in &self.forbidden {
                if rule.child.is_match(tag) && rule.has_matching_ancestor(document, id) {
                    let message = format!("<{tag}> has an ancestor matching <{}>", rule.parent);
                    errors.push(VerificationError::new(
                        NAME,
                        with_comment(message, &rule.comment),
                        path,
                        document.outer_markup(id),
                    ));
                }
            }
        }

        errors
    }
}
