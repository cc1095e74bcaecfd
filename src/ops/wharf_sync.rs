//! Implementation of `wharf sync`.
//!
//! Resolves the consumer's declared dependencies against the repository
//! and converges the workspace's reference directory to exactly the
//! declared set: missing references are created, retargeted ones are
//! replaced, and stale ones are pruned. Unresolved declarations are
//! advisory; this is a developer-facing tool, not a build gate.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::lists::{self, DEPS_LIST_NAME};
use crate::util::config::Config;
use crate::util::context::GlobalContext;
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::fs as wfs;

/// Directory of symbolic references inside the consumer workspace.
pub const REFERENCE_DIR_NAME: &str = "Packages";

/// Options for the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Repository root override
    pub repository: Option<PathBuf>,

    /// Dependency list override
    pub deps_list: Option<PathBuf>,
}

/// What one sync run did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Identities a reference now exists for
    pub linked: Vec<String>,

    /// Declared identities with no matching package in the repository
    pub unresolved: Vec<String>,

    /// Stale references removed from the reference directory
    pub pruned: Vec<String>,
}

/// Synchronize the workspace's references with its dependency list.
pub fn sync(ctx: &GlobalContext, config: &Config, opts: &SyncOptions) -> Result<SyncReport> {
    let workspace = ctx.cwd();
    let deps_list = opts
        .deps_list
        .clone()
        .unwrap_or_else(|| workspace.join(DEPS_LIST_NAME));

    let declarations = lists::load_declarations(&deps_list)
        .with_context(|| suggestions::NO_DEPS_LIST.to_string())?;

    let repository = ctx.repository_root(opts.repository.as_deref(), config);
    let reference_dir = workspace.join(REFERENCE_DIR_NAME);
    wfs::ensure_dir(&reference_dir).context("reference directory is not creatable")?;

    let mut report = SyncReport::default();
    let mut declared = BTreeSet::new();

    for declaration in &declarations {
        let identity = declaration.identity();
        declared.insert(identity.clone());

        let target = repository.join(&identity);
        if !target.is_dir() {
            diagnostic::emit(
                &Diagnostic::warning(format!(
                    "no package `{}` in repository {}",
                    identity,
                    repository.display()
                ))
                .with_suggestion(suggestions::MISSING_PACKAGE),
                ctx.color(),
            );
            report.unresolved.push(identity);
            continue;
        }

        let link = reference_dir.join(&identity);
        match fs::symlink_metadata(&link) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                let current = fs::read_link(&link).with_context(|| {
                    format!("failed to read reference: {}", link.display())
                })?;
                if current != target {
                    fs::remove_file(&link).with_context(|| {
                        format!("failed to replace reference: {}", link.display())
                    })?;
                    wfs::symlink(&target, &link).with_context(|| {
                        format!("failed to create reference: {}", link.display())
                    })?;
                    tracing::info!("retargeted reference {}", identity);
                }
            }
            Ok(_) => {
                // Not ours; never touch regular files or directories.
                diagnostic::emit(
                    &Diagnostic::warning(format!(
                        "`{}` exists in {} but is not a symbolic reference; leaving it alone",
                        identity, REFERENCE_DIR_NAME
                    )),
                    ctx.color(),
                );
                continue;
            }
            Err(_) => {
                wfs::symlink(&target, &link).with_context(|| {
                    format!("failed to create reference: {}", link.display())
                })?;
                tracing::info!("created reference {}", identity);
            }
        }

        report.linked.push(identity);
    }

    prune_stale(&reference_dir, &declared, &mut report)?;

    Ok(report)
}

/// Remove symbolic references that no longer correspond to any declared
/// dependency. Regular files and directories are never touched.
fn prune_stale(
    reference_dir: &std::path::Path,
    declared: &BTreeSet<String>,
    report: &mut SyncReport,
) -> Result<()> {
    for entry in fs::read_dir(reference_dir)
        .with_context(|| format!("failed to scan {}", reference_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_symlink() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if declared.contains(&name) {
            continue;
        }

        fs::remove_file(entry.path())
            .with_context(|| format!("failed to prune reference: {}", name))?;
        tracing::info!("pruned stale reference {}", name);
        report.pruned.push(name);
    }

    report.pruned.sort();
    Ok(())
}
