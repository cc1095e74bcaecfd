//! Forced-linkage bootstrapping.
//!
//! A dead-code-stripping linker drops compilation units whose only call
//! paths are indirect. This module keeps them alive without touching the
//! consumer's build settings: each listed source unit gets an inert,
//! uniquely named trampoline function appended (reversibly, under a
//! backed-up transaction), and a generated bootstrap unit calls every
//! trampoline so the linker must retain the enclosing units.

pub mod bootstrap;
pub mod errors;
pub mod mutator;
pub mod trampoline;

pub use errors::ForceLinkError;
pub use mutator::{recover_leftover_backups, MutationTransaction, BACKUP_SUFFIX};
pub use trampoline::{derive_all, Trampoline};
