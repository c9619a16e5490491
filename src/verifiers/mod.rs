//! Verification strategies
//!
//! Each built-in strategy carries its own validated configuration and is
//! dispatched through [`Verifier::verify`]. Extensions implement
//! [`CustomVerifier`] and are wrapped in [`Verifier::Custom`].

pub mod regexp;
pub mod rules;
pub mod selector;
pub mod tag_attribute;
pub mod tag_usage;
pub mod wrapping;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::parser::{parse_document, Document};
use crate::validation::VerificationError;

pub use regexp::{RegexpBasedVerifier, RegexpConfig};
pub use rules::{PatternRule, PatternRules, WrappingRule, WrappingRules};
pub use selector::{SelectorBasedVerifier, SelectorConfig};
pub use tag_attribute::{TagAttributeConfig, TagAttributeVerifier};
pub use tag_usage::{TagUsageConfig, TagUsageVerifier};
pub use wrapping::{WrappingConfig, WrappingTagVerifier};

/// A document as seen by verifiers: the normalized text and its parsed tree
#[derive(Debug, Clone, Copy)]
pub struct VerificationInput<'a> {
    pub text: &'a str,
    pub document: &'a Document,
}

impl<'a> VerificationInput<'a> {
    pub fn new(text: &'a str, document: &'a Document) -> Self {
        Self { text, document }
    }
}

/// A verification strategy supplied by the embedding application
pub trait CustomVerifier: fmt::Debug + Send + Sync {
    /// Name reported in every finding
    fn name(&self) -> &str;

    fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError>;
}

#[derive(Debug, Clone)]
pub enum Verifier {
    RegexpBased(RegexpBasedVerifier),
    SelectorBased(SelectorBasedVerifier),
    WrappingTag(WrappingTagVerifier),
    TagAttribute(TagAttributeVerifier),
    TagUsage(TagUsageVerifier),
    Custom(Arc<dyn CustomVerifier>),
}

/// Builds a built-in verifier from its configuration
pub type BuiltinConstructor = fn(&Value) -> Result<Verifier, ConfigError>;

/// Built-in verifier kinds in registration order
pub const BUILTIN_VERIFIERS: [(&str, BuiltinConstructor); 5] = [
    (regexp::NAME, build_regexp),
    (selector::NAME, build_selector),
    (wrapping::NAME, build_wrapping),
    (tag_attribute::NAME, build_tag_attribute),
    (tag_usage::NAME, build_tag_usage),
];

fn build_regexp(config: &Value) -> Result<Verifier, ConfigError> {
    RegexpBasedVerifier::from_value(config).map(Verifier::RegexpBased)
}

fn build_selector(config: &Value) -> Result<Verifier, ConfigError> {
    SelectorBasedVerifier::from_value(config).map(Verifier::SelectorBased)
}

fn build_wrapping(config: &Value) -> Result<Verifier, ConfigError> {
    WrappingTagVerifier::from_value(config).map(Verifier::WrappingTag)
}

fn build_tag_attribute(config: &Value) -> Result<Verifier, ConfigError> {
    TagAttributeVerifier::from_value(config).map(Verifier::TagAttribute)
}

fn build_tag_usage(config: &Value) -> Result<Verifier, ConfigError> {
    TagUsageVerifier::from_value(config).map(Verifier::TagUsage)
}

/// Look up a built-in constructor by exact kind name
pub fn builtin_constructor(kind: &str) -> Option<BuiltinConstructor> {
    BUILTIN_VERIFIERS
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|&(_, constructor)| constructor)
}

impl Verifier {
    pub fn custom(verifier: impl CustomVerifier + 'static) -> Self {
        Verifier::Custom(Arc::new(verifier))
    }

    pub fn name(&self) -> &str {
        match self {
            Verifier::RegexpBased(_) => regexp::NAME,
            Verifier::SelectorBased(_) => selector::NAME,
            Verifier::WrappingTag(_) => wrapping::NAME,
            Verifier::TagAttribute(_) => tag_attribute::NAME,
            Verifier::TagUsage(_) => tag_usage::NAME,
            Verifier::Custom(custom) => custom.name(),
        }
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        match self {
            Verifier::RegexpBased(verifier) => verifier.verify(input, path),
            Verifier::SelectorBased(verifier) => verifier.verify(input, path),
            Verifier::WrappingTag(verifier) => verifier.verify(input, path),
            Verifier::TagAttribute(verifier) => verifier.verify(input, path),
            Verifier::TagUsage(verifier) => verifier.verify(input, path),
            Verifier::Custom(verifier) => verifier.verify(input, path),
        }
    }

    /// Parse `text` and verify it with this verifier alone
    pub fn verify_text(&self, text: &str, path: &str) -> Vec<VerificationError> {
        let document = parse_document(text);
        self.verify(&VerificationInput::new(text, &document), path)
    }
}
