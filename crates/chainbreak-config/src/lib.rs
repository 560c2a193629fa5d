//! Configuration management for chainbreak
//!
//! Provides hierarchical configuration loading from multiple sources, highest
//! precedence last:
//! 1. Built-in defaults
//! 2. `~/.config/chainbreak/config.toml` (user defaults)
//! 3. `chainbreak.toml` in the current directory (project overrides)
//! 4. `CHAINBREAK_*` environment variables
//!
//! CLI flags take precedence over all of the above; the CLI applies them on
//! top of the loaded [`ChainbreakConfig`] itself, since this crate has no
//! knowledge of `clap`. This is purely ambient configuration for the binary:
//! the core parser and facade crates take explicit arguments and never read
//! it themselves.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level chainbreak configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainbreakConfig {
    /// Export and output rendering settings.
    pub output: OutputConfig,
    /// How to resolve a credential when more than one kind is supplied.
    pub credential: CredentialConfig,
    /// `tracing::EnvFilter` directive installed by the binary's subscriber.
    pub log_level: String,
}

impl Default for ChainbreakConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            credential: CredentialConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Rendering format for dumped records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatName {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default directory name suggested to callers that build their own
    /// `--export-dir` value; exporting itself is always opt-in per run.
    pub export_dir: PathBuf,
    /// Default rendering format.
    pub format: OutputFormatName,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("chainbreak-export"),
            format: OutputFormatName::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// When more than one credential kind is supplied on the command line,
    /// try each in turn (password, then hex key, then unlock file) instead
    /// of requiring the caller to pick exactly one.
    pub try_all_kinds: bool,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self { try_all_kinds: true }
    }
}

impl ChainbreakConfig {
    /// Load configuration from default locations relative to the current
    /// working directory.
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration using `project_dir` as the `chainbreak.toml` lookup
    /// location instead of the current working directory.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChainbreakConfig::default();
        assert_eq!(config.output.format, OutputFormatName::Text);
        assert_eq!(config.output.export_dir, PathBuf::from("chainbreak-export"));
        assert!(config.credential.try_all_kinds);
        assert_eq!(config.log_level, "info");
    }
}
