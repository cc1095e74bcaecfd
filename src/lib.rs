//! Wharf - a packager for prebuilt C libraries
//!
//! This crate provides the core library functionality for Wharf:
//! forced-linkage bootstrapping, multi-architecture package assembly,
//! and consumer-side reference synchronization.

pub mod core;
pub mod forcelink;
pub mod ops;
pub mod package;
pub mod util;

pub use crate::core::{
    descriptor::{Arch, PackageDescriptor},
    lists::Declaration,
};

pub use crate::util::context::GlobalContext;
