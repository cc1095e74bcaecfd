//! Configuration file support for Wharf.
//!
//! Wharf supports two configuration file locations:
//! - Global: `~/.wharf/config.toml` - User-wide defaults
//! - Project: `.wharf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Wharf configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository root override (defaults to ~/.wharf/repository)
    pub repository: Option<PathBuf>,

    /// Packaging settings
    pub package: PackageConfig,

    /// External tool overrides
    pub tools: ToolsConfig,
}

/// Packaging-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Policy for resource files that violate the name-prefix convention
    pub resource_policy: ResourcePolicy,

    /// Build output root, relative to the project root (defaults to `build`)
    pub build_root: Option<PathBuf>,

    /// Build command template, run once per architecture.
    ///
    /// `{name}`, `{configuration}` and `{arch}` placeholders are expanded
    /// per invocation. Defaults to `make CONFIGURATION={configuration} ARCH={arch}`.
    pub build_command: Vec<String>,
}

/// External tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Path to the binary fusion tool (defaults to `lipo` on PATH)
    pub lipo: Option<PathBuf>,
}

/// Policy for resource files violating the `<package>_` prefix convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourcePolicy {
    /// Emit an advisory warning per violation; packaging continues.
    #[default]
    Warn,
    /// The first violation aborts packaging.
    Reject,
}

impl FromStr for ResourcePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(ResourcePolicy::Warn),
            "reject" => Ok(ResourcePolicy::Reject),
            other => Err(format!(
                "unknown resource policy `{}` (expected `warn` or `reject`)",
                other
            )),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.repository.is_some() {
            self.repository = other.repository;
        }

        if other.package.resource_policy != ResourcePolicy::default() {
            self.package.resource_policy = other.package.resource_policy;
        }
        if other.package.build_root.is_some() {
            self.package.build_root = other.package.build_root;
        }
        if !other.package.build_command.is_empty() {
            self.package.build_command = other.package.build_command;
        }

        if other.tools.lipo.is_some() {
            self.tools.lipo = other.tools.lipo;
        }
    }

    /// The build command template, falling back to the `make` convention.
    pub fn build_command(&self) -> Vec<String> {
        if self.package.build_command.is_empty() {
            vec![
                "make".to_string(),
                "CONFIGURATION={configuration}".to_string(),
                "ARCH={arch}".to_string(),
            ]
        } else {
            self.package.build_command.clone()
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wharf/config.toml)
/// 2. Global config (~/.wharf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}
