//! `wharf sync` command

use anyhow::Result;

use crate::cli::SyncArgs;
use wharf::ops::wharf_sync::{sync, SyncOptions};
use wharf::util::config::load_config;
use wharf::util::GlobalContext;

pub fn execute(args: SyncArgs, verbose: bool, no_color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);
    ctx.set_color(!no_color);

    let config = load_config(
        &ctx.config_path(),
        &ctx.project_wharf_dir().join("config.toml"),
    );

    let opts = SyncOptions {
        repository: args.repository,
        deps_list: args.deps_list,
    };

    let report = sync(&ctx, &config, &opts)?;

    for identity in &report.linked {
        eprintln!("    Linked {}", identity);
    }
    for identity in &report.pruned {
        eprintln!("    Pruned {}", identity);
    }
    if !report.unresolved.is_empty() {
        eprintln!("    {} declaration(s) unresolved", report.unresolved.len());
    }

    Ok(())
}
