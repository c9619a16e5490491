//! Structural rules expressed as selectors

use serde::Deserialize;
use serde_json::Value;

use super::rules::{parse_config, with_comment, PatternRule, PatternRules};
use super::VerificationInput;
use crate::error::ConfigError;
use crate::selector::Selector;
use crate::validation::VerificationError;

pub const NAME: &str = "SelectorBasedVerifier";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub required: PatternRules,
    #[serde(default)]
    pub forbidden: PatternRules,
}

#[derive(Debug, Clone)]
struct SelectorRule {
    selector: Selector,
    comment: String,
}

#[derive(Debug, Clone)]
pub struct SelectorBasedVerifier {
    required: Vec<SelectorRule>,
    forbidden: Vec<SelectorRule>,
}

impl SelectorBasedVerifier {
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            required: compile_all(&config.required)?,
            forbidden: compile_all(&config.forbidden)?,
        })
    }

    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::new(&parse_config(NAME, config)?)
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        let document = input.document;
        let mut errors = Vec::new();

        for rule in &self.required {
            if !rule.selector.matches_any(document) {
                let message = format!("no element matching {} was found", rule.selector);
                errors.push(VerificationError::new(
                    NAME,
                    with_comment(message, &rule.comment),
                    path,
                    "",
                ));
            }
        }

        for rule in &self.forbidden {
            let matched = rule.selector.select(document);
            if matched.is_empty() {
                continue;
            }
            let message = format!(
                "{} element(s) matching {} were found",
                matched.len(),
                rule.selector
            );
            errors.push(VerificationError::new(
                NAME,
                with_comment(message, &rule.comment),
                path,
                document.outer_markup_all(&matched),
            ));
        }

        errors
    }
}

fn compile_all(rules: &PatternRules) -> Result<Vec<SelectorRule>, ConfigError> {
    rules.iter().map(compile).collect()
}

fn compile(rule: &PatternRule) -> Result<SelectorRule, ConfigError> {
    let selector = Selector::parse(&rule.pattern).map_err(|source| ConfigError::InvalidSelector {
        verifier: NAME.to_string(),
        source,
    })?;
    Ok(SelectorRule {
        selector,
        comment: rule.comment.clone(),
    })
}
