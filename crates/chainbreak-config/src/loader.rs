//! Configuration loader with multi-source merging

use crate::{ChainbreakConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CHAINBREAK".to_string(),
        }
    }

    /// Set the project directory (where `chainbreak.toml` is looked up)
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CHAINBREAK")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources with proper precedence.
    ///
    /// Lowest to highest: built-in defaults, `~/.config/chainbreak/config.toml`,
    /// `chainbreak.toml` in the project directory, `CHAINBREAK_*` environment
    /// variables. CLI flags are applied by the caller on top of this, since
    /// this loader has no knowledge of `clap`'s `ArgMatches`.
    pub fn load(self) -> Result<ChainbreakConfig> {
        let mut builder = config::Config::builder();

        let defaults = ChainbreakConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build().context("failed to build configuration")?;

        let chainbreak_config: ChainbreakConfig = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        Ok(chainbreak_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> ChainbreakConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormatName;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("failed to load config");

        assert_eq!(config.output.format, OutputFormatName::Text);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
log_level = "debug"

[output]
format = "json"
export_dir = "recovered"

[credential]
try_all_kinds = false
"#;
        fs::write(project_dir.join("chainbreak.toml"), config_content)
            .expect("failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("failed to load config");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output.format, OutputFormatName::Json);
        assert_eq!(config.output.export_dir, PathBuf::from("recovered"));
        assert!(!config.credential.try_all_kinds);
    }
}
