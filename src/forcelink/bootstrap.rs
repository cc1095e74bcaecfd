//! Bootstrap unit emission.
//!
//! The bootstrap unit is the consumer-facing half of forced linkage: one
//! generated compilation unit that declares every trampoline and calls
//! them all from a single driver function. Linking it into a consumer
//! pins every trampoline's enclosing unit through the dead-code strip.
//!
//! Emission is skipped for embedded-source packages; the consumer
//! compiles the units directly, so nothing is at risk of being dropped.

use crate::core::descriptor::PackageDescriptor;
use crate::forcelink::trampoline::{sanitize_identifier, Trampoline};

/// File name of the bootstrap unit inside the package.
pub fn file_name(desc: &PackageDescriptor) -> String {
    format!("{}_bootstrap.c", desc.name())
}

/// Name of the driver function a consumer can reference explicitly.
pub fn driver_symbol(desc: &PackageDescriptor) -> String {
    format!("{}_force_link", sanitize_identifier(desc.name()))
}

/// Render the bootstrap compilation unit.
pub fn render(desc: &PackageDescriptor, trampolines: &[Trampoline]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "/* {} - generated by wharf for package {} */\n",
        file_name(desc),
        desc.identity()
    ));
    out.push_str("/* Link this unit into the consumer; do not edit. */\n\n");

    for trampoline in trampolines {
        out.push_str(&trampoline.declaration());
        out.push('\n');
    }

    out.push_str(&format!("\nvoid {}(void) {{\n", driver_symbol(desc)));
    for trampoline in trampolines {
        out.push_str(&format!("    {}();\n", trampoline.symbol()));
    }
    out.push_str("}\n");

    out
}
