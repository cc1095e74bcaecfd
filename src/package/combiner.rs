//! Universal binary fusion.
//!
//! The target build system links exactly one binary per reference, so the
//! per-architecture static libraries are fused into a single universal
//! binary before packaging. Fusion itself is the platform tool's job
//! (`lipo -create`); this module locates the inputs, fails early when an
//! architecture slot has no binary, and invokes the tool.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::descriptor::{Arch, PackageDescriptor};
use crate::util::process::{find_executable, ProcessBuilder};

/// Name of the platform fusion tool looked up on PATH.
pub const FUSION_TOOL: &str = "lipo";

/// The build-system-determined output path for one architecture.
///
/// The build output file name must match the package name (`lib<name>.a`);
/// a project whose product is named differently will fail the fusion
/// input check. Known limitation.
pub fn expected_binary_path(
    build_root: &Path,
    configuration: &str,
    arch: &Arch,
    name: &str,
) -> PathBuf {
    build_root
        .join(format!("{}-{}", configuration, arch))
        .join(format!("lib{}.a", name))
}

/// Fuses per-architecture static libraries into one universal binary.
#[derive(Debug, Clone)]
pub struct Combiner {
    tool: PathBuf,
}

impl Combiner {
    /// Create a combiner using a specific fusion tool.
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Combiner { tool: tool.into() }
    }

    /// Locate the fusion tool, preferring an explicit override.
    pub fn locate(override_tool: Option<&Path>) -> Result<Self> {
        if let Some(tool) = override_tool {
            return Ok(Combiner::new(tool));
        }
        match find_executable(FUSION_TOOL) {
            Some(tool) => Ok(Combiner::new(tool)),
            None => bail!(
                "`{}` not found on PATH\n\
                 hint: set `tools.lipo` in .wharf/config.toml to the fusion tool",
                FUSION_TOOL
            ),
        }
    }

    /// Collect the per-architecture inputs for a descriptor, failing on
    /// the first missing architecture slot.
    pub fn collect_inputs(
        &self,
        desc: &PackageDescriptor,
        build_root: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut inputs = Vec::with_capacity(desc.archs().len());

        for arch in desc.archs() {
            let path =
                expected_binary_path(build_root, desc.configuration(), arch, desc.name());
            if !path.is_file() {
                bail!(
                    "no {} binary for `{}`: expected {}\n\
                     hint: the build output file name must match the package name ({})",
                    arch,
                    desc.name(),
                    path.display(),
                    desc.library_file_name()
                );
            }
            inputs.push(path);
        }

        Ok(inputs)
    }

    /// Fuse every architecture slot of `desc` into `output`.
    ///
    /// Fusion order does not affect the result; each input occupies its
    /// own architecture slot, so no symbol deduplication happens here.
    pub fn fuse(
        &self,
        desc: &PackageDescriptor,
        build_root: &Path,
        output: &Path,
    ) -> Result<()> {
        if desc.archs().is_empty() {
            bail!("no target architectures to fuse for `{}`", desc.name());
        }

        let inputs = self.collect_inputs(desc, build_root)?;

        if let Some(parent) = output.parent() {
            crate::util::fs::ensure_dir(parent)?;
        }

        ProcessBuilder::new(&self.tool)
            .arg("-create")
            .args(&inputs)
            .arg("-output")
            .arg(output)
            .exec_and_check()
            .with_context(|| format!("failed to fuse universal binary for `{}`", desc.name()))?;

        tracing::info!(
            "fused {} architecture(s) into {}",
            inputs.len(),
            output.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn desc(archs: &[&str]) -> PackageDescriptor {
        PackageDescriptor::new(
            "mylib",
            None,
            "Release",
            archs.iter().map(|a| Arch::new(*a).unwrap()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_expected_binary_path() {
        let arch = Arch::new("arm64").unwrap();
        let path = expected_binary_path(Path::new("build"), "Release", &arch, "mylib");

        assert_eq!(path, Path::new("build/Release-arm64/libmylib.a"));
    }

    #[test]
    fn test_collect_inputs_missing_arch_names_it() {
        let tmp = TempDir::new().unwrap();
        let desc = desc(&["arm64", "x86_64"]);

        // Only the arm64 slot has a binary
        let arm64_dir = tmp.path().join("Release-arm64");
        std::fs::create_dir_all(&arm64_dir).unwrap();
        std::fs::write(arm64_dir.join("libmylib.a"), "arm64").unwrap();

        let combiner = Combiner::new("lipo");
        let err = combiner
            .collect_inputs(&desc, tmp.path())
            .unwrap_err()
            .to_string();

        assert!(err.contains("x86_64"));
        assert!(err.contains("libmylib.a"));
    }

    #[test]
    fn test_collect_inputs_all_present() {
        let tmp = TempDir::new().unwrap();
        let desc = desc(&["arm64", "x86_64"]);

        for arch in ["arm64", "x86_64"] {
            let dir = tmp.path().join(format!("Release-{}", arch));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("libmylib.a"), arch).unwrap();
        }

        let combiner = Combiner::new("lipo");
        let inputs = combiner.collect_inputs(&desc, tmp.path()).unwrap();

        assert_eq!(inputs.len(), 2);
        assert!(inputs[0].ends_with("Release-arm64/libmylib.a"));
    }

    #[test]
    fn test_fuse_rejects_empty_arch_set() {
        let tmp = TempDir::new().unwrap();
        let desc = desc(&[]);

        let combiner = Combiner::new("lipo");
        let err = combiner
            .fuse(&desc, tmp.path(), &tmp.path().join("out.a"))
            .unwrap_err()
            .to_string();

        assert!(err.contains("no target architectures"));
    }
}
