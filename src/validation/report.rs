//! Aggregated results of a verification run

use serde::Serialize;

use crate::validation::VerificationError;

/// Findings collected over several documents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    pub files_checked: usize,
    pub errors: Vec<VerificationError>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the findings of one document
    pub fn add_file(&mut self, errors: Vec<VerificationError>) {
        self.files_checked += 1;
        self.errors.extend(errors);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of distinct documents with at least one finding
    pub fn files_with_errors(&self) -> usize {
        let mut paths: Vec<&str> = self.errors.iter().map(|e| e.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        paths.len()
    }
}
