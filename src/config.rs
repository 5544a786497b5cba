//! Sassline Configuration Module
//!
//! Pipeline settings: environment signals, import conventions, batching,
//! the persisted artifact and the external compiler.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`SASSLINE_AUTHORITATIVE`, `SASSLINE_PACKAGING`,
//!    `SASSLINE_COMPILER`)
//! 2. Project file (`./sassline.toml`)
//! 3. User file (`~/.config/sassline/config.toml`)
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SasslineError};
use crate::util::{
    DEFAULT_ARTIFACT_DIR, DEFAULT_ARTIFACT_FILE, DEFAULT_COMPILER, DEFAULT_COMPILER_ARGS,
    DEFAULT_EXTENSION, DEFAULT_SETTLE_TICKS,
};

/// Project-local config file name
pub const PROJECT_CONFIG_FILE: &str = "sassline.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub imports: ImportSettings,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub artifact: ArtifactSettings,

    #[serde(default)]
    pub compiler: CompilerSettings,
}

/// Environment signals supplied by the surrounding process
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    /// This process produces the durable compiled artifact (server-like)
    #[serde(default)]
    pub authoritative: bool,

    /// Running as part of a packaging/build step
    #[serde(default)]
    pub packaging: bool,
}

impl Environment {
    /// Authoritative server-like process
    pub fn authoritative() -> Self {
        Self {
            authoritative: true,
            packaging: false,
        }
    }

    /// Non-authoritative process reusing a precompiled artifact (browser-like)
    pub fn follower() -> Self {
        Self::default()
    }

    /// Authoritative packaging step
    pub fn packaging() -> Self {
        Self {
            authoritative: true,
            packaging: true,
        }
    }

    /// Whether compiled output is persisted to the artifact path
    pub fn persists_artifact(&self) -> bool {
        self.authoritative && !self.packaging
    }
}

/// Import conventions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportSettings {
    /// Stylesheet extension without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

/// Batching behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSettings {
    /// Cooperative yields between finishing resolution and leaving the batch
    #[serde(default = "default_settle_ticks")]
    pub settle_ticks: u32,

    /// Answer the very first load empty without resolving it
    #[serde(default = "default_true")]
    pub defer_first_load: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            settle_ticks: default_settle_ticks(),
            defer_first_load: true,
        }
    }
}

/// Persisted dev artifact location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactSettings {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_artifact_file")]
    pub file: String,
}

impl ArtifactSettings {
    /// Full artifact path (`dir/file`)
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            file: default_artifact_file(),
        }
    }
}

/// External compiler command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerSettings {
    #[serde(default = "default_compiler")]
    pub command: String,

    #[serde(default = "default_compiler_args")]
    pub args: Vec<String>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            command: default_compiler(),
            args: default_compiler_args(),
        }
    }
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_settle_ticks() -> u32 {
    DEFAULT_SETTLE_TICKS
}

fn default_true() -> bool {
    true
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACT_DIR)
}

fn default_artifact_file() -> String {
    DEFAULT_ARTIFACT_FILE.to_string()
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

fn default_compiler_args() -> Vec<String> {
    DEFAULT_COMPILER_ARGS.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Get the user config directory path
    ///
    /// Returns `~/.config/sassline/` on Unix, `%APPDATA%/sassline/` on Windows
    pub fn user_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sassline")
    }

    /// Get the user config file path
    pub fn user_config_path() -> PathBuf {
        Self::user_config_dir().join("config.toml")
    }

    /// Load configuration: project file, else user file, else defaults
    ///
    /// Returns error if a file exists but is malformed.
    pub fn load() -> Result<Self> {
        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        if project.exists() {
            return Self::load_from(&project);
        }

        let user = Self::user_config_path();
        if user.exists() {
            return Self::load_from(&user);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SasslineError::ConfigError {
            reason: format!("Failed to read {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| SasslineError::ConfigError {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Save configuration to a file (creates parent directories)
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| SasslineError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| SasslineError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| SasslineError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(flag) = env_flag("SASSLINE_AUTHORITATIVE")? {
            self.environment.authoritative = flag;
        }

        if let Some(flag) = env_flag("SASSLINE_PACKAGING")? {
            self.environment.packaging = flag;
        }

        if let Ok(command) = std::env::var("SASSLINE_COMPILER") {
            let mut parts = command.split_whitespace().map(String::from);
            if let Some(program) = parts.next() {
                self.compiler.command = program;
                self.compiler.args = parts.collect();
            }
        }

        Ok(self)
    }
}

/// Parse a boolean environment flag (unset or empty → None)
fn env_flag(var: &str) -> Result<Option<bool>> {
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(SasslineError::InvalidEnvFlag {
            var: var.to_string(),
            value,
        }),
    }
}
