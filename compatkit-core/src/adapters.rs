//! Default port implementations.

use crate::ports::{FileSet, LegacyApp, PackageRootLocator, PatternOptions, WritePort};
use anyhow::{Context, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use compatkit_domain::{Diagnostic, DiagnosticLevel, DiagnosticsSink, PluginResolver};
use compatkit_types::app::{AppSnapshot, ExtensionInfo, OutputPaths};
use compatkit_types::imports::AssetImportDirective;
use compatkit_types::plan::DiagnosticRecord;
use compatkit_types::schema::COMPATKIT_SNAPSHOT_V1;
use compatkit_types::tree::ReplacePattern;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub use crate::engine::MemoryTreeEngine;

/// Routes diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
    }
}

fn log_diagnostic(diagnostic: &Diagnostic) {
    let package = diagnostic.package.as_deref().unwrap_or("-");
    match diagnostic.level {
        DiagnosticLevel::Warn => warn!(package, "{}", diagnostic.message),
        DiagnosticLevel::Debug => debug!(package, "{}", diagnostic.message),
    }
}

/// Logs like [`TracingDiagnostics`] and keeps every diagnostic for the plan.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    collected: RefCell<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.collected.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.borrow().is_empty()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.collected
            .borrow()
            .iter()
            .map(|d| DiagnosticRecord {
                level: d.level.as_str().to_string(),
                package: d.package.clone(),
                message: d.message.clone(),
            })
            .collect()
    }
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
        self.collected.borrow_mut().push(diagnostic);
    }
}

/// Node-style module resolution over the real filesystem.
///
/// Relative specifiers resolve against `basedir`; bare ones walk `node_modules` upward.
/// A directory resolves through `package.json#main`, then `index.js`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeModulesResolver;

impl PluginResolver for NodeModulesResolver {
    fn resolve(&self, specifier: &str, basedir: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
        if is_path_specifier(specifier) {
            let candidate = basedir.join(specifier.trim_start_matches("./"));
            return resolve_candidate(&candidate)?
                .ok_or_else(|| anyhow!("cannot find module '{specifier}' from {basedir}"));
        }

        for dir in basedir.ancestors() {
            let candidate = dir.join("node_modules").join(specifier);
            if let Some(found) = resolve_candidate(&candidate)? {
                debug!(specifier, path = found.as_str(), "resolved from node_modules");
                return Ok(found);
            }
        }
        bail!("cannot find module '{specifier}' from {basedir}")
    }
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Utf8Path::new(specifier).is_absolute()
}

fn resolve_candidate(candidate: &Utf8Path) -> anyhow::Result<Option<Utf8PathBuf>> {
    if let Some(file) = resolve_file(candidate) {
        return Ok(Some(file));
    }
    if !candidate.is_dir() {
        return Ok(None);
    }

    let manifest = candidate.join("package.json");
    if manifest.is_file() {
        let text = fs_err::read_to_string(&manifest)?;
        let parsed: Value =
            serde_json::from_str(&text).with_context(|| format!("parse {}", manifest))?;
        if let Some(main) = parsed.get("main").and_then(Value::as_str) {
            let main_path = candidate.join(main.trim_start_matches("./"));
            if let Some(file) = resolve_file(&main_path) {
                return Ok(Some(file));
            }
            let index = main_path.join("index.js");
            if index.is_file() {
                return Ok(Some(index));
            }
        }
    }

    let index = candidate.join("index.js");
    Ok(index.is_file().then_some(index))
}

fn resolve_file(candidate: &Utf8Path) -> Option<Utf8PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let with_ext = Utf8PathBuf::from(format!("{candidate}.js"));
    with_ext.is_file().then_some(with_ext)
}

/// Resolver backed by a fixed specifier table; relative targets join onto `basedir`.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: BTreeMap<String, Utf8PathBuf>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, specifier: impl Into<String>, target: impl Into<Utf8PathBuf>) -> Self {
        self.entries.insert(specifier.into(), target.into());
        self
    }
}

impl PluginResolver for StaticResolver {
    fn resolve(&self, specifier: &str, basedir: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
        let target = self
            .entries
            .get(specifier)
            .ok_or_else(|| anyhow!("cannot find module '{specifier}' from {basedir}"))?;
        if target.is_absolute() {
            Ok(target.clone())
        } else {
            Ok(basedir.join(target))
        }
    }
}

/// Walks up from `start` to the first directory holding a `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPackageRootLocator;

impl PackageRootLocator for FsPackageRootLocator {
    fn locate(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join("package.json").is_file())
            .map(Utf8Path::to_path_buf)
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs_err::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs_err::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}

/// Reads an app snapshot exported by the legacy build.
pub fn load_snapshot(path: &Utf8Path) -> anyhow::Result<AppSnapshot> {
    let text = fs_err::read_to_string(path)?;
    let snapshot: AppSnapshot =
        serde_json::from_str(&text).with_context(|| format!("parse snapshot {}", path))?;
    if snapshot.schema != COMPATKIT_SNAPSHOT_V1 {
        bail!(
            "unsupported snapshot schema '{}' in {} (expected {})",
            snapshot.schema,
            path,
            COMPATKIT_SNAPSHOT_V1
        );
    }
    Ok(snapshot)
}

/// Builds a [`FileSet`] from borrowed path/contents pairs.
pub fn file_set<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> FileSet {
    files
        .into_iter()
        .map(|(path, contents)| (path.to_string(), contents.to_string()))
        .collect()
}

impl LegacyApp for AppSnapshot {
    fn package_name(&self) -> &str {
        &self.package.name
    }

    fn package_manifest(&self) -> &Value {
        &self.package.manifest
    }

    fn environment(&self) -> &str {
        &self.environment
    }

    fn app_root(&self) -> &Utf8Path {
        &self.app_root
    }

    fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    fn tests_enabled(&self) -> bool {
        self.tests
    }

    fn auto_run(&self) -> bool {
        self.options.auto_run
    }

    fn store_config_in_meta(&self) -> bool {
        self.options.store_config_in_meta
    }

    fn output_paths(&self) -> &OutputPaths {
        &self.options.output_paths
    }

    fn configured_plugins(&self) -> Option<&[Value]> {
        self.options.babel.plugins.as_deref()
    }

    fn has_src_tree(&self) -> bool {
        self.trees.src
    }

    fn module_unification_enabled(&self) -> bool {
        self.experiments.module_unification
    }

    fn tracked_imports(&self) -> Option<&[AssetImportDirective]> {
        self.tracked_imports.as_deref()
    }

    fn extensions(&self) -> &[ExtensionInfo] {
        &self.extensions
    }

    fn renamed_modules(&self) -> &BTreeMap<String, String> {
        &self.renamed_modules
    }

    // A snapshot captures the patterns already computed for its own options.
    fn config_replace_patterns(&self, _opts: &PatternOptions) -> Vec<ReplacePattern> {
        self.config_replace_patterns.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp path");
        (temp, root)
    }

    fn touch(path: &Utf8Path, contents: &str) {
        FsWritePort
            .write_file(path, contents.as_bytes())
            .expect("write fixture file");
    }

    #[test]
    fn collecting_diagnostics_keeps_order_and_level() {
        let sink = CollectingDiagnostics::new();
        sink.emit(Diagnostic::warn("demo", "first"));
        sink.emit(Diagnostic::debug("second"));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.records(),
            vec![
                DiagnosticRecord {
                    level: "warn".to_string(),
                    package: Some("demo".to_string()),
                    message: "first".to_string(),
                },
                DiagnosticRecord {
                    level: "debug".to_string(),
                    package: None,
                    message: "second".to_string(),
                },
            ]
        );
    }

    #[test]
    fn node_modules_resolver_walks_upward() {
        let (_temp, root) = temp_root();
        touch(&root.join("node_modules/babel-plugin-x/index.js"), "");
        let nested = root.join("dist/deep");
        FsWritePort.create_dir_all(&nested).expect("mkdir");

        let resolved = NodeModulesResolver
            .resolve("babel-plugin-x", &nested)
            .expect("resolve");
        assert_eq!(resolved, root.join("node_modules/babel-plugin-x/index.js"));
    }

    #[test]
    fn node_modules_resolver_honours_main() {
        let (_temp, root) = temp_root();
        touch(
            &root.join("node_modules/babel-plugin-y/package.json"),
            r#"{"name":"babel-plugin-y","main":"./lib/plugin.js"}"#,
        );
        touch(&root.join("node_modules/babel-plugin-y/lib/plugin.js"), "");

        let resolved = NodeModulesResolver
            .resolve("babel-plugin-y", &root)
            .expect("resolve");
        assert_eq!(resolved, root.join("node_modules/babel-plugin-y/lib/plugin.js"));
    }

    #[test]
    fn node_modules_resolver_handles_relative_specifiers() {
        let (_temp, root) = temp_root();
        touch(&root.join("babel-plugin.js"), "");

        let resolved = NodeModulesResolver
            .resolve("./babel-plugin", &root)
            .expect("resolve");
        assert_eq!(resolved, root.join("babel-plugin.js"));
    }

    #[test]
    fn node_modules_resolver_reports_missing_module() {
        let (_temp, root) = temp_root();
        let err = NodeModulesResolver
            .resolve("babel-plugin-missing", &root)
            .expect_err("should fail");
        assert!(err.to_string().contains("babel-plugin-missing"));
    }

    #[test]
    fn static_resolver_joins_relative_targets() {
        let resolver = StaticResolver::new()
            .with("a", "node_modules/a/index.js")
            .with("b", "/abs/b.js");
        assert_eq!(
            resolver.resolve("a", Utf8Path::new("/dist")).expect("a"),
            Utf8PathBuf::from("/dist/node_modules/a/index.js")
        );
        assert_eq!(
            resolver.resolve("b", Utf8Path::new("/dist")).expect("b"),
            Utf8PathBuf::from("/abs/b.js")
        );
        assert!(resolver.resolve("c", Utf8Path::new("/dist")).is_err());
    }

    #[test]
    fn package_root_is_nearest_manifest() {
        let (_temp, root) = temp_root();
        touch(&root.join("package.json"), "{}");
        touch(&root.join("packages/app/package.json"), "{}");
        let start = root.join("packages/app/app");
        FsWritePort.create_dir_all(&start).expect("mkdir");

        assert_eq!(
            FsPackageRootLocator.locate(&start),
            Some(root.join("packages/app"))
        );
        assert_eq!(
            FsPackageRootLocator.locate(&root.join("packages")),
            Some(root.clone())
        );
    }

    #[test]
    fn load_snapshot_rejects_unknown_schema() {
        let (_temp, root) = temp_root();
        let path = root.join("app.json");
        touch(
            &path,
            r#"{"schema":"other.v9","package":{"name":"demo"},"environment":"development","appRoot":"/x","configPath":"/x/config/environment"}"#,
        );
        let err = load_snapshot(&path).expect_err("should fail");
        assert!(err.to_string().contains("other.v9"));
    }

    #[test]
    fn load_snapshot_reads_minimal_file() {
        let (_temp, root) = temp_root();
        let path = root.join("app.json");
        touch(
            &path,
            r#"{"package":{"name":"demo"},"environment":"development","appRoot":"/x","configPath":"/x/config/environment"}"#,
        );
        let snapshot = load_snapshot(&path).expect("load");
        assert_eq!(snapshot.package_name(), "demo");
        assert!(snapshot.auto_run());
        assert!(snapshot.configured_plugins().is_none());
        assert!(snapshot.tracked_imports().is_none());
    }
}
