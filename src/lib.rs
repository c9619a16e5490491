//! Markup Verifier
//!
//! Rule-based verification of markup templates.
//!
//! This library provides:
//! - A permissive markup parser and selector engine
//! - Pattern, selector, ancestor, attribute and usage verifiers
//! - Tag file definitions loaded from a directory
//! - A registry of verifier types, extensible through preset directories
//! - Configuration management

pub mod config;
pub mod definitions;
pub mod error;
pub mod fileutil;
pub mod parser;
pub mod registry;
pub mod selector;
pub mod validation;
pub mod verifiers;

// Re-exports for the public API
pub use config::{Config, VerificationConfig};
pub use error::ConfigError;
pub use parser::{parse_document, Document};
pub use registry::VerifierRegistry;
pub use selector::Selector;
pub use validation::{VerificationEngine, VerificationError, VerificationReport};
pub use verifiers::{CustomVerifier, VerificationInput, Verifier};
