//! Configuration management for the markup verifier.
//!
//! Handles:
//! - Command-line argument parsing
//! - Locating and loading the verification config file
//! - Verifier directory configuration

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use serde_json::{Map, Value};

/// File name searched for when `--config` is not given
pub const CONFIG_FILE_STEM: &str = "verification_config";

/// Directory name under the user config directory
pub const APP_DIR: &str = "markup-verifier";

/// Output format for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command-line arguments for the markup verifier
#[derive(Debug, Parser)]
#[command(name = "markup-verify")]
#[command(about = "Verify markup templates against configurable rules")]
#[command(version)]
pub struct Args {
    /// Files or directories to verify
    #[arg(required = true, help = "Template files or directories to verify")]
    pub targets: Vec<PathBuf>,

    /// Verification config file (JSON or TOML)
    #[arg(short, long, help = "Path to verification_config.json or .toml")]
    pub config: Option<PathBuf>,

    /// Extra directories of verifier presets, searched after the built-ins
    #[arg(long = "verifier-dir", help = "Directory containing verifier preset TOML files")]
    pub verifier_dirs: Vec<PathBuf>,

    /// Encoding of the template files
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// File extensions to verify when walking directories
    #[arg(long = "extension", default_values_t = vec!["jsp".to_string()])]
    pub extensions: Vec<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub targets: Vec<PathBuf>,
    /// Resolved verification config file
    pub config_path: PathBuf,
    /// Verifier directories in search order
    pub verifier_dirs: Vec<PathBuf>,
    pub encoding: String,
    pub extensions: Vec<String>,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = resolve_config_path(args.config, &default_config_candidates())?;

        let mut verifier_dirs = args.verifier_dirs;

        // Presets in the user config directory come last
        if let Some(user_dir) = user_verifier_dir() {
            if user_dir.is_dir() && !verifier_dirs.contains(&user_dir) {
                verifier_dirs.push(user_dir);
            }
        }

        Ok(Config {
            targets: args.targets,
            config_path,
            verifier_dirs,
            encoding: args.encoding,
            extensions: args.extensions,
            format: args.format,
            log_level: args.log_level,
        })
    }
}

/// Config files tried in order when `--config` is absent
pub fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from(format!("{CONFIG_FILE_STEM}.json")),
        PathBuf::from(format!("{CONFIG_FILE_STEM}.toml")),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(APP_DIR).join(format!("{CONFIG_FILE_STEM}.toml")));
    }
    candidates
}

fn user_verifier_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("verifiers"))
}

/// An explicit path wins; otherwise the first existing candidate
pub fn resolve_config_path(explicit: Option<PathBuf>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    match candidates.iter().find(|candidate| candidate.is_file()) {
        Some(found) => Ok(found.clone()),
        None => bail!(
            "No verification config found. Pass --config or create one of: {}",
            candidates
                .iter()
                .map(|c| c.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Verifier configuration: verifier type name to its settings, in file order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VerificationConfig {
    #[serde(default)]
    pub verifiers: Map<String, Value>,
}

impl VerificationConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse verification config JSON")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse verification config TOML")
    }

    /// Load a config file; the format follows the extension and defaults to
    /// JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let parsed = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        parsed.with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Add or replace a verifier entry, keeping the position of an existing one
    pub fn insert(&mut self, name: impl Into<String>, config: Value) -> &mut Self {
        self.verifiers.insert(name.into(), config);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.verifiers.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["markup-verify", "pages"]).unwrap();

        assert_eq!(args.targets, vec![PathBuf::from("pages")]);
        assert_eq!(args.encoding, "utf-8");
        assert_eq!(args.extensions, vec!["jsp"]);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.log_level, "warn");
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_repeatable_options() {
        let args = Args::try_parse_from([
            "markup-verify",
            "--verifier-dir",
            "a",
            "--verifier-dir",
            "b",
            "--extension",
            "jsp",
            "--extension",
            "tag",
            "--format",
            "json",
            "-c",
            "rules.toml",
            "x.jsp",
            "y.jsp",
        ])
        .unwrap();

        assert_eq!(args.verifier_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(args.extensions, vec!["jsp", "tag"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.targets.len(), 2);
    }

    #[test]
    fn test_args_require_a_target() {
        assert!(Args::try_parse_from(["markup-verify"]).is_err());
    }

    #[test]
    fn test_from_args_keeps_explicit_config() {
        let args = Args::try_parse_from(["markup-verify", "-c", "custom.json", "x.jsp"]).unwrap();
        let config = Config::from_args(args).unwrap();

        assert_eq!(config.config_path, PathBuf::from("custom.json"));
        assert_eq!(config.targets, vec![PathBuf::from("x.jsp")]);
    }

    #[test]
    fn test_resolve_config_path_uses_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("verification_config.json");
        let toml = dir.path().join("verification_config.toml");
        std::fs::write(&toml, "").unwrap();

        let candidates = vec![json.clone(), toml.clone()];
        assert_eq!(resolve_config_path(None, &candidates).unwrap(), toml);

        std::fs::write(&json, "{}").unwrap();
        assert_eq!(resolve_config_path(None, &candidates).unwrap(), json);
    }

    #[test]
    fn test_resolve_config_path_without_candidates() {
        let err = resolve_config_path(None, &[PathBuf::from("/no/such/config.json")]).unwrap_err();
        assert!(err.to_string().contains("/no/such/config.json"));
    }

    #[test]
    fn test_json_config_keeps_order() {
        let config = VerificationConfig::from_json_str(
            r#"{"verifiers": {"TagUsageVerifier": {"allowed_tags": {"html": ""}},
                              "RegexpBasedVerifier": {"forbidden": {"META": ""}}}}"#,
        )
        .unwrap();

        assert_eq!(
            config.names().collect::<Vec<_>>(),
            vec!["TagUsageVerifier", "RegexpBasedVerifier"]
        );
        assert_eq!(
            config.verifiers["TagUsageVerifier"],
            json!({"allowed_tags": {"html": ""}})
        );
    }

    #[test]
    fn test_toml_config_keeps_order() {
        let config = VerificationConfig::from_toml_str(
            r#"
[verifiers.WrappingTagVerifier]
required = [{ child = "table:plain", parent = "n\\:form" }]

[verifiers.SelectorBasedVerifier]
forbidden = ["jsp\\:attribute c\\:choose"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.names().collect::<Vec<_>>(),
            vec!["WrappingTagVerifier", "SelectorBasedVerifier"]
        );
        assert_eq!(
            config.verifiers["SelectorBasedVerifier"]["forbidden"][0],
            json!(r"jsp\:attribute c\:choose")
        );
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("rules.json");
        let toml_path = dir.path().join("rules.toml");
        std::fs::write(&json_path, r#"{"verifiers": {"TagUsageVerifier": {}}}"#).unwrap();
        std::fs::write(&toml_path, "[verifiers.TagUsageVerifier]\n").unwrap();

        let from_json = VerificationConfig::load(&json_path).unwrap();
        let from_toml = VerificationConfig::load(&toml_path).unwrap();
        assert_eq!(from_json, from_toml);

        std::fs::write(&json_path, "{not json").unwrap();
        let err = VerificationConfig::load(&json_path).unwrap_err();
        assert!(format!("{err:#}").contains("rules.json"));
    }
}
