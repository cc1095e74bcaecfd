//! Global context for Wharf operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::lists::HEADER_LIST_NAME;
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Wharf data (~/.wharf/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".wharf"))
            .unwrap_or_else(|| PathBuf::from(".wharf"));

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Wharf home directory (~/.wharf/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local Wharf directory.
    pub fn project_wharf_dir(&self) -> PathBuf {
        self.cwd.join(".wharf")
    }

    /// Get the default package repository (~/.wharf/repository).
    pub fn default_repository(&self) -> PathBuf {
        self.home.join("repository")
    }

    /// Resolve the repository root.
    ///
    /// Precedence: explicit override (CLI flag or `WHARF_REPOSITORY` through
    /// clap's env support) > config file > default under the home area.
    pub fn repository_root(&self, override_path: Option<&Path>, config: &Config) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }
        if let Some(ref path) = config.repository {
            return path.clone();
        }
        self.default_repository()
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the project root (directory containing Headers.list), starting
    /// from cwd and searching upward.
    pub fn find_project_root(&self) -> Result<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            if current.join(HEADER_LIST_NAME).is_file() {
                return Ok(current);
            }
            if !current.pop() {
                bail!(
                    "no {} found in `{}` or any parent directory\n{}",
                    HEADER_LIST_NAME,
                    self.cwd.display(),
                    suggestions::NO_HEADER_LIST
                );
            }
        }
    }
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new().expect("failed to create default GlobalContext")
    }
}
