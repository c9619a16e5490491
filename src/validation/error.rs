//! Verification findings

use std::fmt;

use serde::Serialize;

/// One rule violation found in a document.
///
/// Fields are fixed at construction; the four strings are the whole contract
/// with reporting layers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VerificationError {
    verifier_name: String,
    message: String,
    path: String,
    offending_content: String,
}

impl VerificationError {
    pub fn new(
        verifier_name: impl Into<String>,
        message: impl Into<String>,
        path: impl Into<String>,
        offending_content: impl Into<String>,
    ) -> Self {
        Self {
            verifier_name: verifier_name.into(),
            message: message.into(),
            path: path.into(),
            offending_content: offending_content.into(),
        }
    }

    /// Name of the verifier that reported the violation
    pub fn verifier_name(&self) -> &str {
        &self.verifier_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Path of the verified document
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Markup or line at fault; empty when no single node is at fault
    pub fn offending_content(&self) -> &str {
        &self.offending_content
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.path, self.verifier_name, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = VerificationError::new(
            "TagUsageVerifier",
            "<div> must not be used",
            "pages/index.jsp",
            "<div></div>",
        );

        assert_eq!(
            error.to_string(),
            "pages/index.jsp: [TagUsageVerifier] <div> must not be used"
        );
        assert_eq!(error.offending_content(), "<div></div>");
    }

    #[test]
    fn test_serialize_field_names() {
        let error = VerificationError::new("V", "m", "p", "");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "verifier_name": "V",
                "message": "m",
                "path": "p",
                "offending_content": ""
            })
        );
    }
}
