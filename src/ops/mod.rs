//! High-level operations.
//!
//! This module contains the implementation of Wharf commands.

pub mod wharf_package;
pub mod wharf_sync;

pub use wharf_package::{
    package, resolve_project_root, BuildStep, CommandBuildStep, PackageOptions,
};
pub use wharf_sync::{sync, SyncOptions, SyncReport, REFERENCE_DIR_NAME};
