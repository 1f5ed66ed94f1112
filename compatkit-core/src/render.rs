//! Rendering helpers (markdown) for human-readable artifacts.

use compatkit_types::plan::BuildPlan;
use compatkit_types::tree::Tree;

pub fn render_build_md(plan: &BuildPlan) -> String {
    let mut out = String::new();
    out.push_str("# compatkit build\n\n");
    out.push_str(&format!("- App: `{}`\n", plan.app.name));
    out.push_str(&format!("- Root: `{}`\n", plan.app.root));
    out.push_str(&format!("- Environment: `{}`\n", plan.app.environment));
    out.push_str(&format!(
        "- Module unification: `{}`\n",
        plan.app.module_unification
    ));
    out.push_str(&format!("- Cache key: `{}`\n\n", plan.pipeline_cache_key));

    out.push_str("## Plugins\n\n");
    for (i, plugin) in plan.pipeline.plugins.iter().enumerate() {
        let marker = if plugin.options().is_some() {
            " (with options)"
        } else {
            ""
        };
        out.push_str(&format!("{}. `{}`{}\n", i + 1, plugin.path(), marker));
    }
    for preset in &plan.pipeline.presets {
        out.push_str(&format!("- Preset: `{}`\n", preset.0));
    }
    out.push('\n');

    out.push_str("## Implicit scripts\n\n");
    if plan.imports.app.is_empty() && plan.imports.test.is_empty() {
        out.push_str("_No tracked imports._\n\n");
    } else {
        for path in &plan.imports.app {
            out.push_str(&format!("- app: `{}`\n", path));
        }
        for path in &plan.imports.test {
            out.push_str(&format!("- test: `{}`\n", path));
        }
        out.push('\n');
    }

    out.push_str("## Trees\n\n");
    out.push_str(&format!("- html: {}\n", describe(&plan.trees.html)));
    out.push_str(&format!("- app js: {}\n", describe(&plan.trees.app_js)));
    out.push_str(&format!("- public: {}\n", describe(&plan.trees.public)));

    if !plan.diagnostics.is_empty() {
        out.push_str("\n## Diagnostics\n\n");
        for d in &plan.diagnostics {
            let pkg = d.package.as_deref().unwrap_or("-");
            out.push_str(&format!("- [{}] {}: {}\n", d.level, pkg, d.message));
        }
    }

    out
}

// One-line outline of a tree, e.g. `config_replace(merge(funnel(source), funnel(source)))`.
fn describe(tree: &Tree) -> String {
    let children: Vec<&Tree> = match tree {
        Tree::Source { .. } | Tree::Input { .. } | Tree::ConfigLoader { .. } => Vec::new(),
        Tree::Funnel { input, .. } | Tree::ConfigReplace { input, .. } => vec![input.as_ref()],
        Tree::Merge { inputs, .. } => inputs.iter().collect(),
        Tree::WriteConfig { config, .. } => vec![config.as_ref()],
    };
    let label = match tree {
        Tree::Input { name } => format!("input:{name}"),
        other => other.op_name().to_string(),
    };
    if children.is_empty() {
        return label;
    }
    let inner: Vec<String> = children.into_iter().map(describe).collect();
    format!("{}({})", label, inner.join(", "))
}
