//! Verification Engine
//!
//! Runs the configured verifiers over documents and collects their findings.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::VerificationEngine;
pub use error::VerificationError;
pub use report::VerificationReport;
