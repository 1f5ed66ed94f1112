//! Serializable capture of a legacy app's state.
//!
//! Produced by an adapter that talks to the legacy app object; compatkit
//! only ever reads it.

use crate::imports::AssetImportDirective;
use crate::tree::ReplacePattern;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    #[serde(default = "default_snapshot_schema")]
    pub schema: String,

    pub package: PackageInfo,
    pub environment: String,
    pub app_root: Utf8PathBuf,
    pub config_path: Utf8PathBuf,

    #[serde(default)]
    pub tests: bool,

    #[serde(default)]
    pub options: AppOptions,

    #[serde(default)]
    pub trees: AppTrees,

    #[serde(default)]
    pub experiments: Experiments,

    /// `None` when the app never registered any import.
    #[serde(default)]
    pub tracked_imports: Option<Vec<AssetImportDirective>>,

    #[serde(default)]
    pub extensions: Vec<ExtensionInfo>,

    /// Declared module name to canonical module name.
    #[serde(default)]
    pub renamed_modules: BTreeMap<String, String>,

    /// Placeholder patterns computed by the legacy app for its own options.
    #[serde(default)]
    pub config_replace_patterns: Vec<ReplacePattern>,
}

fn default_snapshot_schema() -> String {
    crate::schema::COMPATKIT_SNAPSHOT_V1.to_string()
}

/// The app's own package manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,

    /// The full `package.json`, handed to the dependency analyzer.
    #[serde(default)]
    pub manifest: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOptions {
    #[serde(default = "default_true")]
    pub auto_run: bool,

    #[serde(default = "default_true")]
    pub store_config_in_meta: bool,

    #[serde(default)]
    pub output_paths: OutputPaths,

    #[serde(default)]
    pub babel: BabelOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            auto_run: true,
            store_config_in_meta: true,
            output_paths: OutputPaths::default(),
            babel: BabelOptions::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BabelOptions {
    /// Raw configured plugins. Entries may be names, `[name, options]`
    /// pairs, or values that stood in for already-instantiated plugins.
    #[serde(default)]
    pub plugins: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputPaths {
    #[serde(default)]
    pub app: AppOutputPaths,

    #[serde(default)]
    pub vendor: VendorOutputPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppOutputPaths {
    pub html: String,
    pub js: String,
}

impl Default for AppOutputPaths {
    fn default() -> Self {
        Self {
            html: "index.html".to_string(),
            js: "/assets/app.js".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorOutputPaths {
    pub js: String,
}

impl Default for VendorOutputPaths {
    fn default() -> Self {
        Self {
            js: "/assets/vendor.js".to_string(),
        }
    }
}

/// Which optional trees the legacy app has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppTrees {
    #[serde(default)]
    pub src: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiments {
    #[serde(default)]
    pub module_unification: bool,
}

/// An installed extension (addon) of the legacy app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub name: String,

    /// Present on the extension that owns JS transpilation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_api: Option<ModuleApiInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleApiInfo {
    #[serde(default)]
    pub requires_polyfill: bool,

    /// Module name to export names the polyfill must leave alone.
    #[serde(default)]
    pub denylist: BTreeMap<String, Vec<String>>,

    /// Browser/runtime targets for the env preset.
    #[serde(default)]
    pub targets: Value,
}
