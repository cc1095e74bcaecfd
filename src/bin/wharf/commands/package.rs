//! `wharf package` command

use anyhow::Result;

use crate::cli::PackageArgs;
use wharf::ops::wharf_package::{package, resolve_project_root, CommandBuildStep, PackageOptions};
use wharf::util::config::{load_config, ResourcePolicy};
use wharf::util::GlobalContext;

pub fn execute(args: PackageArgs, verbose: bool, no_color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);
    ctx.set_color(!no_color);

    // Load configuration (global + project)
    let config = load_config(
        &ctx.config_path(),
        &ctx.project_wharf_dir().join("config.toml"),
    );

    // Parse --resource-policy (CLI overrides config)
    let resource_policy = args
        .resource_policy
        .as_deref()
        .map(|s| s.parse::<ResourcePolicy>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let opts = PackageOptions {
        name: args.name,
        configuration: args.configuration,
        version_tag: args.version_tag,
        archs: args.arch,
        embed_source: args.embed_source,
        source_only: args.source_only,
        platform_floor: args.platform_floor,
        repository: args.repository,
        header_list: args.header_list,
        forcelink_list: args.forcelink_list,
        resource_policy,
    };

    let build = CommandBuildStep::new(config.build_command(), resolve_project_root(&ctx, &opts)?);

    let report = package(&ctx, &config, &opts, &build)?;

    eprintln!("    Packaged -> {}", report.package_dir.display());

    Ok(())
}
