//! Attribute checks against tag file definitions
//!
//! Elements without a definition are out of scope here; unknown tags are left
//! to the usage verifier.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::rules::parse_config;
use super::VerificationInput;
use crate::definitions::TagLibrary;
use crate::error::ConfigError;
use crate::validation::VerificationError;

pub const NAME: &str = "TagAttributeVerifier";

fn default_encoding() -> String {
    "utf-8".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagAttributeConfig {
    /// Root of the tag file tree
    pub directory: Option<PathBuf>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for TagAttributeConfig {
    fn default() -> Self {
        Self {
            directory: None,
            encoding: default_encoding(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TagAttributeVerifier {
    library: TagLibrary,
}

impl TagAttributeVerifier {
    /// Load the definitions under the configured directory
    pub fn new(config: &TagAttributeConfig) -> Result<Self, ConfigError> {
        let Some(directory) = config.directory.as_deref() else {
            return Err(ConfigError::InvalidConfig {
                verifier: NAME.to_string(),
                message: "`directory` is required".to_string(),
            });
        };
        Self::load(directory, &config.encoding)
    }

    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        Self::new(&parse_config(NAME, config)?)
    }

    pub fn load(directory: &Path, encoding: &str) -> Result<Self, ConfigError> {
        let library =
            TagLibrary::load(directory, encoding).map_err(|e| ConfigError::Definitions {
                verifier: NAME.to_string(),
                directory: directory.to_path_buf(),
                reason: format!("{e:#}"),
            })?;
        Ok(Self::with_library(library))
    }

    /// Use an already loaded set of definitions
    pub fn with_library(library: TagLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &TagLibrary {
        &self.library
    }

    pub fn verify(&self, input: &VerificationInput<'_>, path: &str) -> Vec<VerificationError> {
        let document = input.document;
        let mut errors = Vec::new();

        for id in document.elements() {
            let Some(element) = document.element(id) else {
                continue;
            };
            let Some(definition) = self.library.get(&element.tag_name) else {
                continue;
            };

            for (attribute, _) in &element.attributes {
                if definition.find_attribute(attribute).is_some() {
                    continue;
                }
                let declared = definition.attribute_names();
                let declared = if declared.is_empty() {
                    "(none)".to_string()
                } else {
                    declared.join(", ")
                };
                let message = format!(
                    "<{}> does not define the attribute {}. Declared attributes: {}",
                    element.tag_name, attribute, declared
                );
                errors.push(VerificationError::new(
                    NAME,
                    message,
                    path,
                    document.outer_markup(id),
                ));
            }
        }

        errors
    }
}
