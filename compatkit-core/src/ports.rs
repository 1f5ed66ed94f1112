//! Port traits abstracting the legacy app and all I/O away from the pipeline.

use camino::{Utf8Path, Utf8PathBuf};
use compatkit_types::app::{ExtensionInfo, OutputPaths};
use compatkit_types::imports::AssetImportDirective;
use compatkit_types::tree::{ReplacePattern, Tree};
use serde_json::Value;
use std::collections::BTreeMap;

/// Relative path to file contents.
pub type FileSet = BTreeMap<String, String>;

/// Options the legacy app computes its config placeholders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternOptions {
    pub auto_run: bool,
    pub store_config_in_meta: bool,
    pub module_unification: bool,
}

/// Read-only view of the legacy app: only what compatkit consumes.
pub trait LegacyApp {
    /// Name from the app's own package manifest.
    fn package_name(&self) -> &str;
    fn package_manifest(&self) -> &Value;
    fn environment(&self) -> &str;
    fn app_root(&self) -> &Utf8Path;
    fn config_path(&self) -> &Utf8Path;
    fn tests_enabled(&self) -> bool;
    fn auto_run(&self) -> bool;
    fn store_config_in_meta(&self) -> bool;
    fn output_paths(&self) -> &OutputPaths;
    fn configured_plugins(&self) -> Option<&[Value]>;
    fn has_src_tree(&self) -> bool;
    fn module_unification_enabled(&self) -> bool;
    fn tracked_imports(&self) -> Option<&[AssetImportDirective]>;
    fn extensions(&self) -> &[ExtensionInfo];
    fn renamed_modules(&self) -> &BTreeMap<String, String>;
    fn config_replace_patterns(&self, opts: &PatternOptions) -> Vec<ReplacePattern>;
}

/// Finds the directory holding the app's `package.json`.
pub trait PackageRootLocator {
    fn locate(&self, start: &Utf8Path) -> Option<Utf8PathBuf>;
}

/// Materializes tree descriptors into files.
pub trait TreeEngine {
    fn materialize(&self, tree: &Tree) -> anyhow::Result<FileSet>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
