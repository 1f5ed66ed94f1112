use compatkit_types::app::AppSnapshot;
use compatkit_types::imports::{AssetImportDirective, ImportMeta};
use compatkit_types::pipeline::{PluginEntry, PluginPipeline, PresetEntry};
use compatkit_types::tree::{FunnelOptions, ReplacePattern, Replacement, Tree};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn directive_uses_legacy_type_key() {
    let directive = AssetImportDirective::new("vendor/x.js", "vendor")
        .with_output_file("/assets/vendor.js");
    let value = serde_json::to_value(&directive).expect("serialize");
    assert_eq!(
        value,
        json!({
            "assetPath": "vendor/x.js",
            "options": { "type": "vendor", "outputFile": "/assets/vendor.js" }
        })
    );

    let parsed: AssetImportDirective =
        serde_json::from_value(json!({ "assetPath": "a.js", "options": { "type": "test" } }))
            .expect("deserialize");
    assert_eq!(parsed.options.kind, "test");
    assert!(parsed.options.output_file.is_none());
}

#[test]
fn import_meta_omits_absent_buckets() {
    let empty = serde_json::to_value(ImportMeta::default()).expect("serialize");
    assert_eq!(empty, json!({}));

    let meta = ImportMeta {
        implicit_scripts: None,
        implicit_test_scripts: Some(vec!["y/z.js".to_string()]),
    };
    let value = serde_json::to_value(&meta).expect("serialize");
    assert_eq!(value, json!({ "implicit-test-scripts4": ["y/z.js"] }));
}

#[test]
fn plugin_entries_serialize_as_plain_values() {
    let pipeline = PluginPipeline {
        plugins: vec![
            PluginEntry::Path("/n/babel-plugin-a/index.js".to_string()),
            PluginEntry::WithOptions("/n/babel-plugin-b/index.js".to_string(), json!({"x": 1})),
        ],
        presets: vec![PresetEntry(
            "env".to_string(),
            serde_json::Map::from_iter([("targets".to_string(), json!({"browsers": ["ie 11"]}))]),
        )],
        ..Default::default()
    };

    let value = serde_json::to_value(&pipeline).expect("serialize");
    assert_eq!(
        value,
        json!({
            "moduleIds": true,
            "babelrc": false,
            "plugins": [
                "/n/babel-plugin-a/index.js",
                ["/n/babel-plugin-b/index.js", {"x": 1}]
            ],
            "presets": [["env", {"targets": {"browsers": ["ie 11"]}}]]
        })
    );

    let back: PluginPipeline = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, pipeline);
}

#[test]
fn tree_descriptors_are_tagged_by_op() {
    let tree = Tree::funnel(
        Tree::input("app"),
        FunnelOptions {
            exclude: vec!["styles/**".to_string(), "*.html".to_string()],
            ..Default::default()
        },
    );
    let value = serde_json::to_value(&tree).expect("serialize");
    assert_eq!(
        value,
        json!({
            "op": "funnel",
            "input": { "op": "input", "name": "app" },
            "exclude": ["styles/**", "*.html"],
            "allow_empty": false
        })
    );

    let back: Tree = serde_json::from_value(value).expect("deserialize");
    assert_eq!(back, tree);
}

#[test]
fn replace_pattern_wire_format() {
    let pattern = ReplacePattern {
        matcher: "{{rootURL}}".to_string(),
        replacement: Replacement::ConfigValue {
            key: "rootURL".to_string(),
        },
    };
    let value = serde_json::to_value(&pattern).expect("serialize");
    assert_eq!(
        value,
        json!({ "match": "{{rootURL}}", "replacement": { "kind": "config_value", "key": "rootURL" } })
    );
}

#[test]
fn snapshot_fills_legacy_defaults() {
    let snapshot: AppSnapshot = serde_json::from_value(json!({
        "package": { "name": "demo" },
        "environment": "development",
        "appRoot": "/work/demo",
        "configPath": "/work/demo/config/environment.js"
    }))
    .expect("deserialize");

    assert_eq!(snapshot.schema, compatkit_types::schema::COMPATKIT_SNAPSHOT_V1);
    assert!(snapshot.options.auto_run);
    assert!(snapshot.options.store_config_in_meta);
    assert_eq!(snapshot.options.output_paths.app.html, "index.html");
    assert_eq!(snapshot.options.output_paths.vendor.js, "/assets/vendor.js");
    assert!(snapshot.options.babel.plugins.is_none());
    assert!(snapshot.tracked_imports.is_none());
    assert!(!snapshot.trees.src);
    assert!(snapshot.extensions.is_empty());
}
