//! Materializes the trees of a real build plan with the in-memory engine.

use camino::{Utf8Path, Utf8PathBuf};
use compatkit_core::adapters::{MemoryTreeEngine, StaticResolver, file_set};
use compatkit_core::pipeline::run_build;
use compatkit_core::ports::{PackageRootLocator, TreeEngine};
use compatkit_core::settings::BuildSettings;
use compatkit_types::app::AppSnapshot;
use compatkit_types::plan::BuildPlan;
use pretty_assertions::assert_eq;
use serde_json::json;

struct FixedRoot;

impl PackageRootLocator for FixedRoot {
    fn locate(&self, _start: &Utf8Path) -> Option<Utf8PathBuf> {
        Some(Utf8PathBuf::from("/work/demo"))
    }
}

fn snapshot(module_unification: bool) -> AppSnapshot {
    serde_json::from_value(json!({
        "package": { "name": "demo" },
        "environment": "development",
        "appRoot": "/work/demo/app",
        "configPath": "/work/demo/config/environment",
        "trees": { "src": true },
        "experiments": { "moduleUnification": module_unification },
        "options": { "storeConfigInMeta": false },
        "extensions": [{ "name": "ember-cli-babel", "moduleApi": {} }],
        "configReplacePatterns": [
            { "match": "{{rootURL}}", "replacement": { "kind": "config_value", "key": "rootURL" } }
        ]
    }))
    .expect("snapshot")
}

fn plan(module_unification: bool) -> BuildPlan {
    let resolver = StaticResolver::new()
        .with("./babel-plugin", "/tool/babel-plugin.js")
        .with("babel-plugin-debug-macros", "/tool/debug-macros.js");
    let settings = BuildSettings {
        extension_trees: vec!["addon-app".to_string()],
        ..Default::default()
    };
    run_build(&settings, &snapshot(module_unification), &FixedRoot, &resolver).expect("run_build")
}

fn engine() -> MemoryTreeEngine {
    MemoryTreeEngine::new()
        .with_source(
            "/work/demo",
            file_set([
                ("app/index.html", "classic {{rootURL}}"),
                ("src/ui/index.html", "unified {{rootURL}}"),
                ("package.json", "{}"),
            ]),
        )
        .with_input(
            "app",
            file_set([
                ("app.js", "app"),
                ("index.html", "stray"),
                ("styles/app.css", "css"),
            ]),
        )
        .with_input(
            "addon-app",
            file_set([("app.js", "addon default"), ("components/x.js", "x")]),
        )
        .with_input("public", file_set([("robots.txt", "")]))
        .with_config("development", json!({ "rootURL": "/demo/" }))
}

#[test]
fn classic_html_uses_app_index() {
    let out = engine().materialize(&plan(false).trees.html).expect("html");
    assert_eq!(out, file_set([("index.html", "classic /demo/")]));
}

#[test]
fn unified_html_overrides_classic() {
    let out = engine().materialize(&plan(true).trees.html).expect("html");
    assert_eq!(out, file_set([("index.html", "unified /demo/")]));
}

#[test]
fn app_js_prefers_app_files_over_extensions() {
    let out = engine().materialize(&plan(false).trees.app_js).expect("app js");
    assert_eq!(
        out.keys().cloned().collect::<Vec<_>>(),
        vec!["app.js", "components/x.js", "config/environment.js"]
    );
    assert_eq!(out["app.js"], "app");
    assert_eq!(
        out["config/environment.js"],
        "export default {\"rootURL\":\"/demo/\"};\n"
    );
}

#[test]
fn analyzer_input_excludes_styles_and_html() {
    let plan = plan(false);
    let engine = engine();
    let mut seen = Vec::new();
    for tree in &plan.analyzer.trees {
        seen.extend(engine.materialize(tree).expect("analyzer tree").into_keys());
    }
    assert_eq!(seen, vec!["app.js".to_string()]);
}

#[test]
fn public_tree_is_passed_through() {
    let out = engine().materialize(&plan(false).trees.public).expect("public");
    assert_eq!(out, file_set([("robots.txt", "")]));
}
