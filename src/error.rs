//! Configuration errors
//!
//! Everything that can go wrong while building a verification engine.
//! Violations found in documents are data (`VerificationError`), not errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::selector::SelectorError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "verifier `{name}` could not be created: no verifier with that name is registered.\n\
         Searched sources:\n{}\n\
         Check that the configuration file is correct and that the verifier directories are set properly.",
        render_sources(.sources)
    )]
    UnknownVerifier { name: String, sources: Vec<String> },

    #[error("{verifier}: invalid regular expression `{pattern}`")]
    InvalidPattern {
        verifier: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{verifier}: {source}")]
    InvalidSelector {
        verifier: String,
        #[source]
        source: SelectorError,
    },

    #[error("{verifier}: invalid configuration: {message}")]
    InvalidConfig { verifier: String, message: String },

    #[error("{verifier}: failed to load tag definitions from {}: {reason}", .directory.display())]
    Definitions {
        verifier: String,
        directory: PathBuf,
        reason: String,
    },

    #[error("failed to read verifier directory {}", .path.display())]
    VerifierDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn render_sources(sources: &[String]) -> String {
    sources
        .iter()
        .map(|source| format!("\t{source}"))
        .collect::<Vec<_>>()
        .join("\n")
}
