//! Core build pipeline, extracted from the CLI.
//!
//! The entry points are I/O-agnostic: the app, package-root lookup, plugin resolution and all
//! writes go through port traits.

use crate::adapters::CollectingDiagnostics;
use crate::facade::LegacyAppFacade;
use crate::ports::{LegacyApp, PackageRootLocator, WritePort};
use crate::render::render_build_md;
use crate::settings::BuildSettings;
use anyhow::Context;
use camino::Utf8Path;
use compatkit_domain::{CompatError, PluginResolver, pipeline_cache_key};
use compatkit_types::plan::{AppIdentity, BuildPlan, PlanTrees};
use compatkit_types::schema::COMPATKIT_BUILD_V1;
use compatkit_types::tree::Tree;
use serde::Serialize;
use tracing::debug;

/// Error type for pipeline results. Exit code 2 = compat failure, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Compat(#[from] CompatError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::Compat(_) => 2,
            ToolError::Internal(_) => 1,
        }
    }
}

/// Derive the build plan for one legacy app.
///
/// The caller writes it out, either through `WritePort` or `write_build_artifacts`.
pub fn run_build(
    settings: &BuildSettings,
    app: &dyn LegacyApp,
    locator: &dyn PackageRootLocator,
    resolver: &dyn PluginResolver,
) -> Result<BuildPlan, ToolError> {
    let diagnostics = CollectingDiagnostics::new();
    let facade = LegacyAppFacade::new(app, locator, &diagnostics, settings.facade());

    let root = facade.root()?.to_path_buf();
    let final_root = settings.final_root.clone().unwrap_or_else(|| root.clone());

    let pipeline = facade.babel_config(&final_root, resolver, &settings.env)?;
    let pipeline_cache_key = pipeline_cache_key(&pipeline);
    debug!(key = %pipeline_cache_key, plugins = pipeline.plugins.len(), "built plugin pipeline");

    let imports = facade.tracked_imports();
    let categorized = imports.categorized().clone();
    let meta = imports.meta();

    let html = facade.html_tree()?;
    let from_extensions = settings
        .extension_trees
        .iter()
        .map(|name| Tree::input(name.as_str()))
        .collect();
    let processed = facade.process_app_js(from_extensions, app.package_manifest());

    Ok(BuildPlan {
        schema: COMPATKIT_BUILD_V1.to_string(),
        app: AppIdentity {
            name: facade.name().to_string(),
            root: root.into_string(),
            environment: facade.environment().to_string(),
            module_unification: facade.is_module_unification(),
        },
        pipeline,
        pipeline_cache_key,
        imports: categorized,
        meta,
        trees: PlanTrees {
            html,
            app_js: processed.app_js,
            public: facade.public_tree(),
        },
        analyzer: processed.analyzer,
        diagnostics: diagnostics.records(),
    })
}

/// Write `build.json`, `babel.json`, `meta.json`, `trees.json` and `build.md` to `out_dir`.
pub fn write_build_artifacts(
    plan: &BuildPlan,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    write_json(writer, out_dir, "build.json", plan).context("serialize build plan")?;
    write_json(writer, out_dir, "babel.json", &plan.pipeline).context("serialize pipeline")?;
    write_json(writer, out_dir, "meta.json", &plan.meta).context("serialize meta")?;
    write_json(writer, out_dir, "trees.json", &plan.trees).context("serialize trees")?;

    let build_md = render_build_md(plan);
    writer.write_file(&out_dir.join("build.md"), build_md.as_bytes())?;

    Ok(())
}

fn write_json<T: Serialize>(
    writer: &dyn WritePort,
    out_dir: &Utf8Path,
    name: &str,
    value: &T,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    let path = out_dir.join(name);
    debug!(path = path.as_str(), "writing artifact");
    writer.write_file(&path, json.as_bytes())
}
