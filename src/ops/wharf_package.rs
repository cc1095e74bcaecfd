//! Implementation of `wharf package`.
//!
//! One assembly run is one linear pipeline:
//! load lists -> recover leftovers -> derive trampolines -> mutate ->
//! build per architecture -> restore -> fuse -> emit bootstrap -> assemble.
//! The external build system is behind the [`BuildStep`] seam; everything
//! after mutation restores the source units before an error propagates.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::descriptor::{Arch, PackageDescriptor};
use crate::core::lists::{self, FORCELINK_LIST_NAME, HEADER_LIST_NAME};
use crate::forcelink::{bootstrap, mutator, trampoline};
use crate::package::assembler::{AssembleOptions, Assembler, AssemblyReport};
use crate::package::combiner::Combiner;
use crate::util::config::{Config, ResourcePolicy};
use crate::util::context::GlobalContext;
use crate::util::diagnostic::{self, Diagnostic};
use crate::util::process::ProcessBuilder;

/// Options for the package command.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Package name (defaults to the project directory name)
    pub name: Option<String>,

    /// Build configuration name
    pub configuration: String,

    /// Optional version tag appended to the package identity
    pub version_tag: Option<String>,

    /// Target architectures
    pub archs: Vec<String>,

    /// Copy qualifying source units into the package
    pub embed_source: bool,

    /// Skip the binary entirely and ship sources only
    pub source_only: bool,

    /// Minimum platform version recorded in the framework metadata
    pub platform_floor: Option<String>,

    /// Repository root override
    pub repository: Option<PathBuf>,

    /// Public-header list override
    pub header_list: Option<PathBuf>,

    /// Forced-linkage list override
    pub forcelink_list: Option<PathBuf>,

    /// Resource naming policy override
    pub resource_policy: Option<ResourcePolicy>,
}

/// The external build system, invoked once per architecture.
pub trait BuildStep {
    /// Produce the static library for one architecture slot.
    fn run(&self, desc: &PackageDescriptor, arch: &Arch) -> Result<()>;
}

/// Default [`BuildStep`]: runs a configured command template with
/// `{name}`, `{configuration}` and `{arch}` placeholders expanded.
#[derive(Debug, Clone)]
pub struct CommandBuildStep {
    argv: Vec<String>,
    cwd: PathBuf,
}

impl CommandBuildStep {
    /// Create a build step from a command template.
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        CommandBuildStep {
            argv,
            cwd: cwd.into(),
        }
    }

    fn expand(&self, desc: &PackageDescriptor, arch: &Arch) -> Vec<String> {
        self.argv
            .iter()
            .map(|part| {
                part.replace("{name}", desc.name())
                    .replace("{configuration}", desc.configuration())
                    .replace("{arch}", arch.as_str())
            })
            .collect()
    }
}

impl BuildStep for CommandBuildStep {
    fn run(&self, desc: &PackageDescriptor, arch: &Arch) -> Result<()> {
        if self.argv.is_empty() {
            bail!("no build command configured\n\
                   hint: set `package.build_command` in .wharf/config.toml");
        }

        let argv = self.expand(desc, arch);
        let status = ProcessBuilder::new(&argv[0])
            .args(&argv[1..])
            .cwd(&self.cwd)
            .status()
            .with_context(|| format!("failed to run build step for {}", arch))?;

        if !status.success() {
            bail!(
                "build step failed for {} (exit code {:?})",
                arch,
                status.code()
            );
        }

        Ok(())
    }
}

/// The project root a package run operates on.
///
/// With an explicit header-list override the current directory is the
/// project root; otherwise it is found by walking up to `Headers.list`.
pub fn resolve_project_root(ctx: &GlobalContext, opts: &PackageOptions) -> Result<PathBuf> {
    match opts.header_list {
        Some(_) => Ok(ctx.cwd().to_path_buf()),
        None => ctx.find_project_root(),
    }
}

/// Assemble one package and publish it into the repository.
pub fn package(
    ctx: &GlobalContext,
    config: &Config,
    opts: &PackageOptions,
    build: &dyn BuildStep,
) -> Result<AssemblyReport> {
    let project_root = resolve_project_root(ctx, opts)?;

    let name = match opts.name {
        Some(ref name) => name.clone(),
        None => project_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot derive a package name from the project root")?,
    };

    let archs = opts
        .archs
        .iter()
        .map(|a| a.parse::<Arch>())
        .collect::<Result<Vec<_>>>()?;

    if archs.is_empty() && !opts.source_only {
        bail!(
            "no target architectures\n\
             hint: pass `--arch` once per architecture, or `--source-only` to skip the binary"
        );
    }

    let desc = PackageDescriptor::new(name, opts.version_tag.clone(), opts.configuration.clone(), archs)?;

    // Environment failures abort before any unit is mutated.
    let repository = ctx.repository_root(opts.repository.as_deref(), config);
    crate::util::fs::ensure_dir(&repository).context("repository root is not creatable")?;

    let build_root = project_root.join(
        config
            .package
            .build_root
            .as_deref()
            .unwrap_or(Path::new("build")),
    );

    // Public headers: the list is required, every listed file must exist.
    let header_list = opts
        .header_list
        .clone()
        .unwrap_or_else(|| project_root.join(HEADER_LIST_NAME));
    let headers = lists::load_path_list(&project_root, &header_list)?;
    for header in &headers {
        if !header.is_file() {
            bail!("missing declared public header: {}", header.display());
        }
    }

    // Forced linkage: an absent default list simply means no unit needs it.
    let forcelink_list = opts
        .forcelink_list
        .clone()
        .unwrap_or_else(|| project_root.join(FORCELINK_LIST_NAME));
    let units = if forcelink_list.is_file() || opts.forcelink_list.is_some() {
        lists::load_path_list(&project_root, &forcelink_list)?
    } else {
        Vec::new()
    };

    let trampolines = trampoline::derive_all(&units)?;

    let assemble_opts = AssembleOptions {
        embed_source: opts.embed_source || opts.source_only,
        resource_policy: opts
            .resource_policy
            .unwrap_or(config.package.resource_policy),
        platform_floor: opts.platform_floor.clone(),
    };
    let assembler = Assembler::new(&desc, &project_root, &build_root, &repository);

    // Source-only packages skip the whole binary pipeline: the consumer
    // compiles every unit itself, so no mutation or fusion is needed.
    if opts.source_only {
        return assembler.assemble(None, &headers, None, &assemble_opts);
    }

    let recovered = mutator::recover_leftover_backups(&units)?;
    if recovered > 0 {
        diagnostic::emit(
            &Diagnostic::warning(format!(
                "restored {} source unit(s) left mutated by an interrupted run",
                recovered
            )),
            ctx.color(),
        );
    }

    run_builds(&desc, &trampolines, build)?;

    let universal = build_root
        .join(format!("{}-universal", desc.configuration()))
        .join(desc.library_file_name());
    let combiner = Combiner::locate(config.tools.lipo.as_deref())?;
    combiner.fuse(&desc, &build_root, &universal)?;

    let bootstrap_source = if assemble_opts.embed_source || trampolines.is_empty() {
        None
    } else {
        Some(bootstrap::render(&desc, &trampolines))
    };

    assembler.assemble(
        Some(&universal),
        &headers,
        bootstrap_source.as_deref(),
        &assemble_opts,
    )
}

/// Mutate, run the build once per architecture, and always restore.
fn run_builds(
    desc: &PackageDescriptor,
    trampolines: &[trampoline::Trampoline],
    build: &dyn BuildStep,
) -> Result<()> {
    let txn = mutator::MutationTransaction::begin(trampolines)?;

    let mut build_error = None;
    for arch in desc.archs() {
        tracing::info!("building {} for {}", desc.name(), arch);
        if let Err(error) = build.run(desc, arch) {
            build_error = Some(error);
            break;
        }
    }

    // Restoration is unconditional; a build failure still wins the report.
    let restore_result = txn.restore();
    match build_error {
        Some(error) => Err(error),
        None => restore_result.map_err(Into::into),
    }
}
