mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use compatkit_core::adapters::{
    FsPackageRootLocator, FsWritePort, NodeModulesResolver, TracingDiagnostics, load_snapshot,
};
use compatkit_core::facade::LegacyAppFacade;
use compatkit_core::pipeline::{ToolError, run_build, write_build_artifacts};
use compatkit_core::settings::BuildSettings;
use compatkit_core::{EnvFlags, pipeline_cache_key};
use config::{CliOverrides, ConfigMerger, MergedConfig};
use serde_json::json;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "compatkit",
    version,
    about = "Turns a legacy app snapshot into cache-stable build artifacts."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive the full build plan and write its artifacts.
    Build(BuildArgs),
    /// Print the categorized implicit scripts and runtime meta as JSON.
    Imports(SnapshotArgs),
    /// Print the resolved plugin pipeline and its cache key as JSON.
    Pipeline(PipelineArgs),
}

#[derive(Debug, Args)]
struct SnapshotArgs {
    /// App snapshot exported from the legacy build.
    #[arg(long, default_value = "app.json")]
    snapshot: Utf8PathBuf,

    /// Directory searched for compatkit.toml (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Build environment; `production` disables debug-only code.
    #[arg(long, env = "EMBER_ENV")]
    build_env: Option<String>,

    /// Running under continuous integration.
    #[arg(long, env = "CI", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    ci: bool,
}

#[derive(Debug, Args)]
struct PipelineArgs {
    #[command(flatten)]
    common: SnapshotArgs,

    /// Final location of the build output; user plugins resolve from here
    /// (default: the app's package root).
    #[arg(long)]
    final_root: Option<Utf8PathBuf>,

    /// Where compatkit's own plugins are resolved from.
    #[arg(long)]
    tool_root: Option<Utf8PathBuf>,
}

#[derive(Debug, Args)]
struct BuildArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output directory for compatkit artifacts (default: artifacts/compatkit).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Extension-contributed tree merged beneath the app's own JS (repeatable).
    #[arg(long = "extension-tree")]
    extension_trees: Vec<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn real_main() -> Result<(), ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Imports(args) => cmd_imports(args),
        Command::Pipeline(args) => cmd_pipeline(args),
    }
}

fn env_flags(args: &SnapshotArgs) -> EnvFlags {
    EnvFlags {
        build_env: args.build_env.clone(),
        ci: args.ci,
    }
}

fn merged_config(args: &SnapshotArgs, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
    let file_config =
        config::load_or_default(&args.project_root).context("load compatkit.toml config")?;
    let merged = ConfigMerger::new(file_config).merge(cli);
    debug!(
        "merged config: out_dir={:?}, final_root={:?}, extension_trees={:?}, pipeline={:?}",
        merged.out_dir, merged.final_root, merged.extension_trees, merged.pipeline
    );
    Ok(merged)
}

fn settings_from(args: &SnapshotArgs, merged: MergedConfig) -> BuildSettings {
    let defaults = BuildSettings::default();
    BuildSettings {
        snapshot: args.snapshot.clone(),
        out_dir: merged.out_dir.unwrap_or(defaults.out_dir),
        final_root: merged.final_root,
        extension_trees: merged.extension_trees,
        standard_vendor_output: merged
            .standard_vendor_output
            .unwrap_or(defaults.standard_vendor_output),
        pipeline: merged.pipeline,
        env: env_flags(args),
    }
}

fn cmd_build(args: BuildArgs) -> Result<(), ToolError> {
    let common = &args.pipeline.common;
    let merged = merged_config(
        common,
        &CliOverrides {
            out_dir: args.out_dir.clone(),
            final_root: args.pipeline.final_root.clone(),
            tool_root: args.pipeline.tool_root.clone(),
            extension_trees: args.extension_trees.clone(),
        },
    )?;
    let settings = settings_from(common, merged);

    let app = load_snapshot(&settings.snapshot)
        .with_context(|| format!("load snapshot {}", settings.snapshot))?;
    let plan = run_build(&settings, &app, &FsPackageRootLocator, &NodeModulesResolver)?;
    write_build_artifacts(&plan, &settings.out_dir, &FsWritePort)
        .with_context(|| format!("write artifacts to {}", settings.out_dir))?;

    info!(
        diagnostics = plan.diagnostics.len(),
        "wrote build plan to {}", settings.out_dir
    );
    Ok(())
}

fn cmd_imports(args: SnapshotArgs) -> Result<(), ToolError> {
    let merged = merged_config(&args, &CliOverrides::default())?;
    let settings = settings_from(&args, merged);
    let app = load_snapshot(&settings.snapshot)
        .with_context(|| format!("load snapshot {}", settings.snapshot))?;

    let diagnostics = TracingDiagnostics;
    let facade =
        LegacyAppFacade::new(&app, &FsPackageRootLocator, &diagnostics, settings.facade());
    let imports = facade.tracked_imports();

    print_json(&json!({
        "imports": imports.categorized(),
        "meta": imports.meta(),
    }))
}

fn cmd_pipeline(args: PipelineArgs) -> Result<(), ToolError> {
    let merged = merged_config(
        &args.common,
        &CliOverrides {
            final_root: args.final_root.clone(),
            tool_root: args.tool_root.clone(),
            ..Default::default()
        },
    )?;
    let settings = settings_from(&args.common, merged);
    let app = load_snapshot(&settings.snapshot)
        .with_context(|| format!("load snapshot {}", settings.snapshot))?;

    let diagnostics = TracingDiagnostics;
    let facade =
        LegacyAppFacade::new(&app, &FsPackageRootLocator, &diagnostics, settings.facade());
    let final_root = match &settings.final_root {
        Some(root) => root.clone(),
        None => facade.root()?.to_path_buf(),
    };
    let pipeline = facade.babel_config(&final_root, &NodeModulesResolver, &settings.env)?;

    print_json(&json!({
        "cache_key": pipeline_cache_key(&pipeline),
        "babel": pipeline,
    }))
}

fn print_json(value: &serde_json::Value) -> Result<(), ToolError> {
    let s = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{}", s);
    Ok(())
}
