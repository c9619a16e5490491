//! Verification Engine
//!
//! Builds the configured verifiers once and runs all of them over each
//! document, in configuration order.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;

use crate::config::VerificationConfig;
use crate::error::ConfigError;
use crate::fileutil::read_formatted;
use crate::parser::parse_document;
use crate::registry::VerifierRegistry;
use crate::validation::VerificationError;
use crate::verifiers::{VerificationInput, Verifier};

#[derive(Debug, Clone)]
pub struct VerificationEngine {
    verifiers: Vec<Verifier>,
}

impl VerificationEngine {
    /// Engine using the built-in verifiers only
    pub fn new(config: &VerificationConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, &VerifierRegistry::with_builtins())
    }

    /// Engine searching the built-ins and then each directory in order
    pub fn with_verifier_dirs(
        config: &VerificationConfig,
        verifier_dirs: &[PathBuf],
    ) -> Result<Self, ConfigError> {
        Self::with_registry(config, &VerifierRegistry::with_directories(verifier_dirs)?)
    }

    /// Instantiate every configured verifier through `registry`
    pub fn with_registry(
        config: &VerificationConfig,
        registry: &VerifierRegistry,
    ) -> Result<Self, ConfigError> {
        let verifiers = config
            .verifiers
            .iter()
            .map(|(name, settings)| {
                let verifier = registry.create(name, settings)?;
                log::debug!("Configured verifier '{}'", name);
                Ok(verifier)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self::from_verifiers(verifiers))
    }

    pub fn from_verifiers(verifiers: Vec<Verifier>) -> Self {
        Self { verifiers }
    }

    pub fn verifiers(&self) -> &[Verifier] {
        &self.verifiers
    }

    /// Verify one document; findings are grouped by verifier in
    /// configuration order
    pub fn verify(&self, text: &str, path: &str) -> Vec<VerificationError> {
        let document = parse_document(text);
        let input = VerificationInput::new(text, &document);

        let mut errors = Vec::new();
        for verifier in &self.verifiers {
            let started = Instant::now();
            let found = verifier.verify(&input, path);
            log::debug!(
                "{} reported {} finding(s) for {} in {:?}",
                verifier.name(),
                found.len(),
                path,
                started.elapsed()
            );
            errors.extend(found);
        }
        errors
    }

    /// Read, normalize and verify a template file
    pub fn verify_file(&self, path: &Path, encoding: &str) -> Result<Vec<VerificationError>> {
        let text = read_formatted(path, encoding)?;
        Ok(self.verify(&text, &path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> VerificationConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_no_verifiers_no_findings() {
        let engine = VerificationEngine::new(&VerificationConfig::default()).unwrap();
        assert!(engine.verify("<html></html>", "a.jsp").is_empty());
    }

    #[test]
    fn test_verifiers_follow_configuration_order() {
        let engine = VerificationEngine::new(&config(json!({"verifiers": {
            "TagUsageVerifier": {"allowed": ["html"]},
            "RegexpBasedVerifier": {"forbidden": ["body"]}
        }})))
        .unwrap();

        let names: Vec<_> = engine.verifiers().iter().map(Verifier::name).collect();
        assert_eq!(names, vec!["TagUsageVerifier", "RegexpBasedVerifier"]);

        let errors = engine.verify("<html><body></body></html>", "a.jsp");
        let reported: Vec<_> = errors.iter().map(|e| e.verifier_name()).collect();
        assert_eq!(reported, vec!["TagUsageVerifier", "RegexpBasedVerifier"]);
    }

    #[test]
    fn test_unknown_verifier_fails_construction() {
        let err = VerificationEngine::new(&config(json!({"verifiers": {
            "TagUsageVerifier": {},
            "CustomVerifier": {}
        }})))
        .unwrap_err();

        match err {
            ConfigError::UnknownVerifier { name, sources } => {
                assert_eq!(name, "CustomVerifier");
                assert_eq!(sources, vec!["built-in"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_verifier_config_fails_construction() {
        let result = VerificationEngine::new(&config(json!({"verifiers": {
            "SelectorBasedVerifier": {"required": 42}
        }})));
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_verify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jsp");
        std::fs::write(&path, "<%@ page contentType=\"text/html\"%>\n<div></div>").unwrap();

        let engine = VerificationEngine::new(&config(json!({"verifiers": {
            "TagUsageVerifier": {"allowed": ["%@page"]}
        }})))
        .unwrap();
        let errors = engine.verify_file(&path, "utf-8").unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), path.display().to_string());
        assert_eq!(errors[0].message(), "<div> must not be used in templates");
    }
}
