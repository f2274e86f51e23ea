//! CLI configuration management.

use awc_compiler::CompilerOptions;
use awc_compiler::options::{DEFAULT_RUNS_ON, DEFAULT_TIMEOUT_MINUTES};
use awc_core::workflow::EngineKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory compiled documents are written to. Next to the source when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Engine for workflows without an `engine:` entry.
    #[serde(default)]
    pub default_engine: EngineKind,
    /// Runner label for workflows without `runs-on:`.
    #[serde(default = "default_runs_on")]
    pub runs_on: String,
    /// Agent timeout for workflows that set none.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,
    /// Output format of listing commands.
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_engine: EngineKind::default(),
            runs_on: default_runs_on(),
            timeout_minutes: default_timeout_minutes(),
            output_format: OutputFormat::default(),
        }
    }
}

fn default_runs_on() -> String {
    DEFAULT_RUNS_ON.to_string()
}

fn default_timeout_minutes() -> u32 {
    DEFAULT_TIMEOUT_MINUTES
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl CliConfig {
    /// Load configuration from file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = directories::ProjectDirs::from("dev", "awc", "awc-cli")
            .ok_or("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "output_dir" => self.output_dir = Some(PathBuf::from(value)),
            "default_engine" => {
                self.default_engine = value.parse().map_err(|e| format!("{e}"))?;
            }
            "runs_on" => self.runs_on = value.to_string(),
            "timeout_minutes" => {
                self.timeout_minutes = value
                    .parse()
                    .map_err(|_| format!("Invalid timeout: {}", value))?;
            }
            "output_format" => {
                self.output_format = match value {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    _ => return Err(format!("Invalid output format: {}", value)),
                };
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Compiler defaults derived from this configuration.
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions::default()
            .with_engine(self.default_engine)
            .with_runs_on(self.runs_on.clone())
            .with_timeout_minutes(self.timeout_minutes)
    }
}
