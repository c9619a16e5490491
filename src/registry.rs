//! Verifier Registry
//!
//! Maps verifier type names to factories. Factories are grouped by source;
//! sources are searched in registration order and the first source that
//! knows a name wins. The built-in source is always first.
//!
//! A verifier directory contributes presets: TOML files that give a new name
//! to a known verifier kind with a default configuration.
//!
//! ```toml
//! name = "FormWrappingVerifier"
//! kind = "WrappingTagVerifier"
//!
//! [config]
//! required = [{ child = "table:plain", parent = "n\\:form" }]
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::verifiers::{Verifier, BUILTIN_VERIFIERS};

/// Label of the source holding the built-in verifiers
pub const BUILTIN_SOURCE: &str = "built-in";

/// Extension of preset files in a verifier directory
pub const PRESET_EXTENSION: &str = "toml";

/// Creates a verifier from its configuration entry
pub type VerifierFactory = Arc<dyn Fn(&Value) -> Result<Verifier, ConfigError> + Send + Sync>;

#[derive(Clone)]
struct Source {
    label: String,
    names: Vec<String>,
    factories: HashMap<String, VerifierFactory>,
}

impl Source {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            names: Vec::new(),
            factories: HashMap::new(),
        }
    }
}

/// Preset file contents
#[derive(Debug, Deserialize)]
struct PresetFile {
    name: String,
    kind: String,
    #[serde(default)]
    config: Value,
}

#[derive(Clone)]
pub struct VerifierRegistry {
    sources: Vec<Source>,
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.sources.iter().map(|source| (&source.label, &source.names)))
            .finish()
    }
}

impl VerifierRegistry {
    /// A registry with no sources at all
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// A registry holding the built-in verifiers
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for (name, constructor) in BUILTIN_VERIFIERS {
            registry.register(BUILTIN_SOURCE, name, constructor);
        }
        registry
    }

    /// Registry with the built-ins followed by each verifier directory, in
    /// order
    pub fn with_directories(directories: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut registry = Self::with_builtins();
        for directory in directories {
            registry.load_directory(directory)?;
        }
        Ok(registry)
    }

    /// Register a factory under `name` in `source`, creating the source if
    /// needed. A name already present in that source keeps its first factory.
    pub fn register<F>(&mut self, source: &str, name: &str, factory: F)
    where
        F: Fn(&Value) -> Result<Verifier, ConfigError> + Send + Sync + 'static,
    {
        self.register_factory(source, name, Arc::new(factory));
    }

    pub fn register_factory(&mut self, source: &str, name: &str, factory: VerifierFactory) {
        let source = self.source_mut(source);
        if source.factories.contains_key(name) {
            log::warn!(
                "Verifier '{}' is already registered in {}; keeping the first registration",
                name,
                source.label
            );
            return;
        }
        source.names.push(name.to_string());
        source.factories.insert(name.to_string(), factory);
    }

    fn source_mut(&mut self, label: &str) -> &mut Source {
        let position = match self.sources.iter().position(|source| source.label == label) {
            Some(position) => position,
            None => {
                self.sources.push(Source::new(label));
                self.sources.len() - 1
            }
        };
        &mut self.sources[position]
    }

    /// Add every preset found in `directory` as a new source.
    ///
    /// Malformed presets are skipped with a warning; an unreadable directory
    /// is an error.
    pub fn load_directory(&mut self, directory: &Path) -> Result<(), ConfigError> {
        let label = directory.display().to_string();
        let entries =
            std::fs::read_dir(directory).map_err(|source| ConfigError::VerifierDirectory {
                path: directory.to_path_buf(),
                source,
            })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(PRESET_EXTENSION)
            })
            .collect();
        files.sort();

        // The directory is searched even when it holds no presets
        self.source_mut(&label);

        let mut loaded = 0;
        for path in files {
            match self.load_preset_file(&label, &path) {
                Ok(name) => {
                    log::debug!("Registered verifier '{}' from {}", name, path.display());
                    loaded += 1;
                }
                Err(e) => log::warn!("Skipping verifier preset {}: {:#}", path.display(), e),
            }
        }

        log::info!("Loaded {} verifier preset(s) from {}", loaded, label);
        Ok(())
    }

    fn load_preset_file(&mut self, label: &str, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read verifier preset: {}", path.display()))?;
        let preset: PresetFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse verifier preset TOML: {}", path.display()))?;

        let base = self
            .resolve(&preset.kind)
            .with_context(|| format!("Unknown verifier kind '{}'", preset.kind))?;
        let defaults = preset.config;
        let factory: VerifierFactory =
            Arc::new(move |config: &Value| base(&merge_config(&defaults, config)));

        self.register_factory(label, &preset.name, factory);
        Ok(preset.name)
    }

    /// Find the factory for `name`, searching sources in order
    pub fn resolve(&self, name: &str) -> Result<VerifierFactory, ConfigError> {
        self.sources
            .iter()
            .find_map(|source| source.factories.get(name).cloned())
            .ok_or_else(|| ConfigError::UnknownVerifier {
                name: name.to_string(),
                sources: self.sources(),
            })
    }

    /// Resolve `name` and build it from `config`
    pub fn create(&self, name: &str, config: &Value) -> Result<Verifier, ConfigError> {
        let factory = self.resolve(name)?;
        factory(config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources
            .iter()
            .any(|source| source.factories.contains_key(name))
    }

    /// Source labels in search order
    pub fn sources(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.label.clone()).collect()
    }

    /// Registered names in search order; shadowed duplicates are listed once
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for source in &self.sources {
            for name in &source.names {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Preset defaults overlaid with the top-level keys of a configuration entry
fn merge_config(defaults: &Value, overrides: &Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(defaults), Value::Object(overrides)) => {
            let mut merged = defaults.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (defaults, Value::Null) => defaults.clone(),
        (_, overrides) => overrides.clone(),
    }
}
