//! Component Definitions
//!
//! Loading and lookup of tag file definitions used to check the attributes
//! a template passes to custom tags.

pub mod loader;
pub mod parser;
pub mod schema;

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

pub use loader::{load_all_tags, tag_name_from_path};
pub use parser::parse_tag_file;
pub use schema::{AttributeDefinition, TagDefinition};

/// In-memory set of tag definitions with case-insensitive lookup
#[derive(Debug, Clone, Default)]
pub struct TagLibrary {
    definitions: Vec<TagDefinition>,
    /// Lowercased name to index of the first definition with that name
    index: HashMap<String, usize>,
}

impl TagLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every definition found under `directory`
    pub fn load(directory: &Path, encoding: &str) -> Result<Self> {
        Ok(Self::from_definitions(load_all_tags(directory, encoding)?))
    }

    pub fn from_definitions(definitions: Vec<TagDefinition>) -> Self {
        let mut library = Self::new();
        for definition in definitions {
            library.add_definition(definition);
        }
        library
    }

    /// Add a definition; an earlier definition with the same name keeps
    /// precedence for lookups
    pub fn add_definition(&mut self, definition: TagDefinition) {
        let key = definition.name.to_lowercase();
        let position = self.definitions.len();
        self.index.entry(key).or_insert(position);
        self.definitions.push(definition);
    }

    /// Find the definition for a tag name (case-insensitive)
    pub fn get(&self, tag_name: &str) -> Option<&TagDefinition> {
        self.index
            .get(&tag_name.to_lowercase())
            .map(|&position| &self.definitions[position])
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// List all definition names in load order
    pub fn names(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .map(|definition| definition.name.as_str())
            .collect()
    }
}
