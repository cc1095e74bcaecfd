//! Forced-linkage error types.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Error during forced-linkage mutation or restoration.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ForceLinkError {
    #[error("forced-linkage unit not found: {}", unit.display())]
    #[diagnostic(
        code(wharf::forcelink::unit_not_found),
        help("check the paths listed in ForceLink.list; they are relative to the project root")
    )]
    UnitNotFound { unit: PathBuf },

    #[error("forced-linkage unit is not writable: {}", unit.display())]
    #[diagnostic(code(wharf::forcelink::unit_not_writable))]
    UnitNotWritable {
        unit: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "duplicate trampoline identifier `{}` derived from {} and {}",
        identifier, first.display(), second.display()
    )]
    #[diagnostic(
        code(wharf::forcelink::identifier_collision),
        help("identifiers are derived from file names; rename one of the colliding source files")
    )]
    IdentifierCollision {
        identifier: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("backup missing for mutated unit: {}", unit.display())]
    #[diagnostic(
        code(wharf::forcelink::backup_missing),
        help("the unit may be left in a mutated state; restore it from source control")
    )]
    BackupMissing { unit: PathBuf },

    #[error("restored unit does not match its pre-mutation checksum: {}", unit.display())]
    #[diagnostic(code(wharf::forcelink::checksum_mismatch))]
    ChecksumMismatch { unit: PathBuf },

    #[error("failed to {action} {}", path.display())]
    #[diagnostic(code(wharf::forcelink::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
