//! Trampoline identity and rendering.
//!
//! A trampoline is an inert C function whose only purpose is to give the
//! linker a statically visible reference into a compilation unit. Both the
//! Source Mutator and the Bootstrap Emitter render trampoline text through
//! this module; no shared header exists on the C side, so this is the
//! single source of truth for the appended format.

use std::path::{Path, PathBuf};

use crate::forcelink::errors::ForceLinkError;

/// Marker line prepended to every appended trampoline block.
pub const MUTATION_MARKER: &str =
    "/* wharf: forced-linkage trampoline (generated, removed after build) */";

/// A trampoline bound to one forced-linkage source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trampoline {
    unit: PathBuf,
    identifier: String,
}

impl Trampoline {
    /// Get the source unit this trampoline is appended to.
    pub fn unit(&self) -> &Path {
        &self.unit
    }

    /// Get the derived identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The C symbol name of the trampoline function.
    pub fn symbol(&self) -> String {
        format!("wharf_keep_{}", self.identifier)
    }

    /// The block appended to the source unit: prototype declaration plus
    /// empty definition. Append-only, so line numbers of the original
    /// content stay valid for other tooling.
    pub fn definition_block(&self) -> String {
        let symbol = self.symbol();
        format!(
            "\n{}\nvoid {}(void);\nvoid {}(void) {{ }}\n",
            MUTATION_MARKER, symbol, symbol
        )
    }

    /// The extern declaration mirrored into the bootstrap unit.
    pub fn declaration(&self) -> String {
        format!("extern void {}(void);", self.symbol())
    }
}

/// Sanitize a string into a C identifier fragment: ASCII-lowercased,
/// everything else replaced with `_`. Pure and total.
pub fn sanitize_identifier(input: &str) -> String {
    let mut identifier = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            identifier.push(ch.to_ascii_lowercase());
        } else {
            identifier.push('_');
        }
    }
    if identifier.is_empty() {
        identifier.push('_');
    }
    identifier
}

/// Derive the trampoline identifier for one source unit from its file name.
pub fn derive_identifier(unit: &Path) -> String {
    let stem = unit
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_identifier(&stem)
}

/// Derive trampolines for every listed unit, checking identifier
/// uniqueness eagerly.
///
/// Two units deriving the same identifier is a fatal configuration error:
/// resolving it silently (e.g. with a numeric suffix) would make the
/// appended symbol depend on list order, and the collision would otherwise
/// only surface as a duplicate-symbol link failure in the consumer.
pub fn derive_all(units: &[PathBuf]) -> Result<Vec<Trampoline>, ForceLinkError> {
    let mut trampolines: Vec<Trampoline> = Vec::with_capacity(units.len());

    for unit in units {
        let identifier = derive_identifier(unit);

        if let Some(existing) = trampolines.iter().find(|t| t.identifier == identifier) {
            return Err(ForceLinkError::IdentifierCollision {
                identifier,
                first: existing.unit.clone(),
                second: unit.clone(),
            });
        }

        trampolines.push(Trampoline {
            unit: unit.clone(),
            identifier,
        });
    }

    Ok(trampolines)
}
