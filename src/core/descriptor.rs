//! Package identity - WHAT artifact (name + version tag + configuration).
//!
//! A PackageDescriptor names one assembled package and the architecture
//! slots its universal binary must cover. Its identity string doubles as
//! the package's directory name in the repository, so composition lives
//! here and nowhere else.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

/// Configuration assumed when a dependency declaration omits one.
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// A target architecture slot (e.g. `arm64`, `x86_64`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Arch(String);

impl Arch {
    /// Create a new architecture slot.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            bail!("architecture name must not be empty");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            bail!(
                "invalid architecture name `{}` (expected lowercase letters, digits, `_`)",
                name
            );
        }
        Ok(Arch(name))
    }

    /// Get the architecture name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Arch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Arch::new(s)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compose a package directory name from its identity parts.
///
/// This is the wire format of the repository: `<name>[-<version>]-<configuration>`.
/// The Reference Synchronizer composes the same string to resolve declarations,
/// so exact-match lookup falls out of using one function on both sides.
pub fn compose_identity(name: &str, version_tag: Option<&str>, configuration: &str) -> String {
    match version_tag {
        Some(version) => format!("{}-{}-{}", name, version, configuration),
        None => format!("{}-{}", name, configuration),
    }
}

/// Describes one package to assemble: name, optional version tag, build
/// configuration, and the architecture slots of its universal binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    name: String,
    version_tag: Option<String>,
    configuration: String,
    archs: Vec<Arch>,
}

impl PackageDescriptor {
    /// Create a new package descriptor.
    ///
    /// Duplicate architecture slots are a configuration error: each slot maps
    /// to exactly one per-architecture binary in the fused result.
    pub fn new(
        name: impl Into<String>,
        version_tag: Option<String>,
        configuration: impl Into<String>,
        archs: Vec<Arch>,
    ) -> Result<Self> {
        let name = name.into();
        let configuration = configuration.into();

        validate_component("package name", &name)?;
        validate_component("configuration", &configuration)?;
        if let Some(ref version) = version_tag {
            validate_component("version tag", version)?;
        }

        for (i, arch) in archs.iter().enumerate() {
            if archs[..i].contains(arch) {
                bail!("duplicate architecture slot `{}`", arch);
            }
        }

        Ok(PackageDescriptor {
            name,
            version_tag,
            configuration,
            archs,
        })
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the version tag, if any.
    pub fn version_tag(&self) -> Option<&str> {
        self.version_tag.as_deref()
    }

    /// Get the build configuration name.
    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Get the architecture slots.
    pub fn archs(&self) -> &[Arch] {
        &self.archs
    }

    /// The package's identity, which is also its repository directory name.
    pub fn identity(&self) -> String {
        compose_identity(&self.name, self.version_tag(), &self.configuration)
    }

    /// Directory name of the binary holder inside the package.
    pub fn framework_dir_name(&self) -> String {
        format!("{}.framework", self.name)
    }

    /// File name the build system must produce for each architecture.
    pub fn library_file_name(&self) -> String {
        format!("lib{}.a", self.name)
    }

    /// The prefix resource file names are expected to carry.
    pub fn resource_prefix(&self) -> String {
        format!("{}_", self.name)
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

fn validate_component(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("{} must not be empty", what);
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        bail!("{} `{}` must not contain whitespace or path separators", what, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arch(name: &str) -> Arch {
        Arch::new(name).unwrap()
    }

    #[test]
    fn test_identity_with_version() {
        let desc = PackageDescriptor::new(
            "mylib",
            Some("1.2".to_string()),
            "Release",
            vec![arch("arm64")],
        )
        .unwrap();

        assert_eq!(desc.identity(), "mylib-1.2-Release");
    }

    #[test]
    fn test_identity_without_version() {
        let desc = PackageDescriptor::new("mylib", None, "Debug", vec![arch("arm64")]).unwrap();

        assert_eq!(desc.identity(), "mylib-Debug");
        assert_eq!(desc.framework_dir_name(), "mylib.framework");
        assert_eq!(desc.library_file_name(), "libmylib.a");
        assert_eq!(desc.resource_prefix(), "mylib_");
    }

    #[test]
    fn test_duplicate_arch_rejected() {
        let result = PackageDescriptor::new(
            "mylib",
            None,
            "Release",
            vec![arch("arm64"), arch("x86_64"), arch("arm64")],
        );

        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate architecture slot"));
        assert!(err.contains("arm64"));
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(PackageDescriptor::new("", None, "Release", vec![]).is_err());
        assert!(PackageDescriptor::new("my lib", None, "Release", vec![]).is_err());
        assert!(PackageDescriptor::new("my/lib", None, "Release", vec![]).is_err());
    }

    #[test]
    fn test_arch_validation() {
        assert!(Arch::new("arm64").is_ok());
        assert!(Arch::new("x86_64").is_ok());
        assert!(Arch::new("").is_err());
        assert!(Arch::new("ARM64").is_err());
        assert!(Arch::new("arm 64").is_err());
    }

    #[test]
    fn test_compose_identity_matches_descriptor() {
        let desc = PackageDescriptor::new(
            "net",
            Some("2.0".to_string()),
            "Release",
            vec![arch("arm64")],
        )
        .unwrap();

        assert_eq!(
            compose_identity("net", Some("2.0"), "Release"),
            desc.identity()
        );
    }
}
