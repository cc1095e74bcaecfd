//! Package directory assembly.
//!
//! Builds the final package layout in a staging directory inside the
//! repository, then publishes it atomically under its identity name:
//! the previous package of the same identity is removed and the staging
//! directory renamed into place, so a package is never partially visible
//! under its final name.
//!
//! Layout:
//! ```text
//! <name>[-<version>]-<configuration>/
//!   <name>.framework/<name>      universal binary (holder shape the IDE imports)
//!   <name>.framework/Headers/    mirrored public headers
//!   <name>.framework/Info.plist
//!   Headers/                     public headers
//!   Resources/                   everything that is not source/header/metadata
//!   <name>_bootstrap.c           forced-linkage bootstrap (binary packages only)
//!   Sources/                     embedded source units (embed mode only)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::{DirEntry, WalkDir};

use crate::core::descriptor::PackageDescriptor;
use crate::forcelink::bootstrap;
use crate::forcelink::mutator::BACKUP_SUFFIX;
use crate::util::config::ResourcePolicy;
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::fs as wfs;

/// File extensions treated as compilation units.
const SOURCE_EXTENSIONS: &[&str] = &["c", "m", "mm", "cc", "cpp", "cxx", "s", "asm"];

/// File extensions treated as headers.
const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "pch"];

/// File extensions and names treated as project metadata, never resources.
const METADATA_EXTENSIONS: &[&str] = &["list", "toml", "lock", "md"];
const METADATA_FILE_NAMES: &[&str] = &["Makefile", "CMakeLists.txt"];

/// Options controlling one assembly.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Copy qualifying source units into the package.
    pub embed_source: bool,

    /// Policy for resource files violating the name-prefix convention.
    pub resource_policy: ResourcePolicy,

    /// Minimum platform version recorded in the framework metadata.
    pub platform_floor: Option<String>,
}

/// Result of a successful assembly.
#[derive(Debug)]
pub struct AssemblyReport {
    /// Final package directory inside the repository.
    pub package_dir: PathBuf,

    /// Resource files (project-relative) that violated the prefix
    /// convention under the `warn` policy.
    pub resource_warnings: Vec<PathBuf>,
}

/// Assembles one package directory.
#[derive(Debug)]
pub struct Assembler<'a> {
    desc: &'a PackageDescriptor,
    project_root: &'a Path,
    build_root: &'a Path,
    repository: &'a Path,
}

impl<'a> Assembler<'a> {
    /// Create an assembler for one descriptor.
    pub fn new(
        desc: &'a PackageDescriptor,
        project_root: &'a Path,
        build_root: &'a Path,
        repository: &'a Path,
    ) -> Self {
        Assembler {
            desc,
            project_root,
            build_root,
            repository,
        }
    }

    /// Build the package layout and publish it into the repository.
    pub fn assemble(
        &self,
        binary: Option<&Path>,
        headers: &[PathBuf],
        bootstrap_source: Option<&str>,
        opts: &AssembleOptions,
    ) -> Result<AssemblyReport> {
        wfs::ensure_dir(self.repository)
            .with_context(|| "repository root is not creatable".to_string())?;

        // Stage inside the repository so publishing is a same-filesystem rename.
        let staging = tempfile::Builder::new()
            .prefix(".wharf-stage-")
            .tempdir_in(self.repository)
            .with_context(|| {
                format!("failed to create staging directory in {}", self.repository.display())
            })?;
        let root = staging.path();

        self.place_binary(root, binary, opts.platform_floor.as_deref())?;
        self.place_headers(root, headers)?;
        let resource_warnings = self.place_resources(root, opts.resource_policy)?;

        if let Some(source) = bootstrap_source {
            wfs::write_string(&root.join(bootstrap::file_name(self.desc)), source)?;
        }

        if opts.embed_source {
            self.place_sources(root)?;
        }

        let package_dir = self.publish(staging)?;

        tracing::info!("assembled package {}", package_dir.display());

        Ok(AssemblyReport {
            package_dir,
            resource_warnings,
        })
    }

    fn place_binary(
        &self,
        root: &Path,
        binary: Option<&Path>,
        platform_floor: Option<&str>,
    ) -> Result<()> {
        let framework = root.join(self.desc.framework_dir_name());
        wfs::ensure_dir(&framework)?;

        if let Some(binary) = binary {
            wfs::copy_file(binary, &framework.join(self.desc.name()))?;
        }

        wfs::write_string(
            &framework.join("Info.plist"),
            &render_metadata(self.desc, platform_floor),
        )?;

        Ok(())
    }

    fn place_headers(&self, root: &Path, headers: &[PathBuf]) -> Result<()> {
        let headers_dir = root.join("Headers");
        let framework_headers = root.join(self.desc.framework_dir_name()).join("Headers");

        for header in headers {
            if !header.is_file() {
                bail!("missing declared public header: {}", header.display());
            }
            let file_name = header
                .file_name()
                .with_context(|| format!("invalid header path: {}", header.display()))?;

            wfs::copy_file(header, &headers_dir.join(file_name))?;
            wfs::copy_file(header, &framework_headers.join(file_name))?;
        }

        Ok(())
    }

    fn place_resources(&self, root: &Path, policy: ResourcePolicy) -> Result<Vec<PathBuf>> {
        let resources_dir = root.join("Resources");
        let prefix = self.desc.resource_prefix();
        let mut warnings = Vec::new();

        for entry in self.walk_project() {
            let entry = entry.context("failed to scan resource tree")?;
            if !entry.file_type().is_file() || !is_resource_file(entry.path()) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(self.project_root)
                .expect("walk stays under the project root");

            let file_name = entry.file_name().to_string_lossy();
            if !file_name.starts_with(&prefix) {
                match policy {
                    ResourcePolicy::Warn => {
                        diagnostic::emit(
                            &Diagnostic::warning(format!(
                                "resource `{}` is not prefixed with `{}`",
                                rel.display(),
                                prefix
                            ))
                            .with_suggestion(suggestions::RESOURCE_PREFIX),
                            false,
                        );
                        warnings.push(rel.to_path_buf());
                    }
                    ResourcePolicy::Reject => {
                        bail!(
                            "resource `{}` is not prefixed with `{}` (policy: reject)",
                            rel.display(),
                            prefix
                        );
                    }
                }
            }

            wfs::copy_file(entry.path(), &resources_dir.join(rel))?;
        }

        Ok(warnings)
    }

    fn place_sources(&self, root: &Path) -> Result<()> {
        let sources_dir = root.join("Sources");

        for entry in self.walk_project() {
            let entry = entry.context("failed to scan source tree")?;
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(self.project_root)
                .expect("walk stays under the project root");

            wfs::copy_file(entry.path(), &sources_dir.join(rel))?;
        }

        Ok(())
    }

    fn walk_project(&self) -> impl Iterator<Item = walkdir::Result<DirEntry>> + '_ {
        WalkDir::new(self.project_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry))
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }
        if entry.file_type().is_dir()
            && (entry.path() == self.build_root || entry.path() == self.repository)
        {
            return false;
        }
        true
    }

    fn publish(&self, staging: tempfile::TempDir) -> Result<PathBuf> {
        let package_dir = self.repository.join(self.desc.identity());

        wfs::remove_dir_all_if_exists(&package_dir)?;

        let staged = staging.keep();
        if let Err(error) = fs::rename(&staged, &package_dir) {
            let _ = fs::remove_dir_all(&staged);
            return Err(error).with_context(|| {
                format!("failed to publish package at {}", package_dir.display())
            });
        }

        Ok(package_dir)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Whether a file is a compilation unit.
pub fn is_source_file(path: &Path) -> bool {
    matches!(extension(path), Some(ext) if SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file is a header.
pub fn is_header_file(path: &Path) -> bool {
    matches!(extension(path), Some(ext) if HEADER_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file qualifies as a resource.
///
/// There is no resource manifest; everything that is not a source,
/// header, or project-metadata file ships.
pub fn is_resource_file(path: &Path) -> bool {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };

    if file_name.starts_with('.') || file_name.ends_with(BACKUP_SUFFIX) {
        return false;
    }
    if METADATA_FILE_NAMES.contains(&file_name.as_str()) {
        return false;
    }
    if is_source_file(path) || is_header_file(path) {
        return false;
    }
    if matches!(extension(path), Some(ext) if METADATA_EXTENSIONS.contains(&ext.as_str())) {
        return false;
    }

    true
}

fn render_metadata(desc: &PackageDescriptor, platform_floor: Option<&str>) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
         \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n<dict>\n",
    );

    out.push_str(&format!(
        "\t<key>CFBundleName</key>\n\t<string>{}</string>\n",
        desc.name()
    ));
    out.push_str("\t<key>CFBundlePackageType</key>\n\t<string>FMWK</string>\n");
    out.push_str(&format!(
        "\t<key>CFBundleVersion</key>\n\t<string>{}</string>\n",
        desc.version_tag().unwrap_or("0")
    ));
    if let Some(floor) = platform_floor {
        out.push_str(&format!(
            "\t<key>MinimumOSVersion</key>\n\t<string>{}</string>\n",
            floor
        ));
    }

    out.push_str("</dict>\n</plist>\n");
    out
}
