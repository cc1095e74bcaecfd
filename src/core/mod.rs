//! Core data structures for Wharf.
//!
//! This module contains the foundational types used throughout Wharf:
//! - Package descriptors and architecture slots
//! - Line-oriented list files (headers, forced linkage, dependencies)

pub mod descriptor;
pub mod lists;

pub use descriptor::{compose_identity, Arch, PackageDescriptor, DEFAULT_CONFIGURATION};
pub use lists::{
    Declaration, DEPS_LIST_NAME, FORCELINK_LIST_NAME, HEADER_LIST_NAME,
};
