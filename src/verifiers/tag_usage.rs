//! Allow-list of tag names

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::rules::{compile_anchored, parse_config, PatternRules};
use super::VerificationInput;
use crate::error::ConfigError;
use crate::validation::VerificationError;

pub const NAME: &str = "TagUsageVerifier";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagUsageConfig {
    /// Patterns a tag name must fully match, case-insensitively
    #[serde(default, alias = "allowed_tags")]
    pub allowed: PatternRules,
}

#[derive(Debug, Clone)]
pub struct TagUsageVerifier {
    allowed: Vec<Regex>,
}

impl TagUsageVerifier {
    pub fn new(config: &TagUsageConfig) -> Result<Self, ConfigError> {
        let allowed = config
            .allowed
            .iter()
            .map(|rule| compile_anchored(NAME, &rule.pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { allowed })
    }

    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::new(&parse_config(NAME, config)?)
    }

    /// An empty allow-list places no restriction
    pub fn is_allowed(&self, tag_name: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|pattern| pattern.is_match(tag_name))
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        let document = input.document;

        document
            .elements()
            .filter_map(|id| document.element(id).map(|element| (id, element)))
            .filter(|(_, element)| !self.is_allowed(&element.tag_name))
            .map(|(id, element)| {
                VerificationError::new(
                    NAME,
                    format!("<{}> must not be used in templates", element.tag_name),
                    path,
                    document.outer_markup(id),
                )
            })
            .collect()
    }
}
