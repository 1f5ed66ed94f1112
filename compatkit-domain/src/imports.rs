use crate::ports::{Diagnostic, DiagnosticsSink};
use compatkit_types::imports::{
    AssetImportDirective, CategorizedImports, ImportMeta, KIND_TEST, KIND_VENDOR,
};
use std::cell::OnceCell;
use tracing::debug;

/// Where the legacy build concatenates vendor imports by default.
pub const STANDARD_VENDOR_OUTPUT: &str = "/assets/vendor.js";

/// Map a declared asset path onto the path the output bundle imports it by.
///
/// `vendor/...` stays reachable relative to the output vendor tree; `node_modules/...` resolves as
/// a top-level module. Anything else is reported and dropped.
pub fn standardize_asset_path(
    package_name: &str,
    asset_path: &str,
    diagnostics: &dyn DiagnosticsSink,
) -> Option<String> {
    let (first, rest) = asset_path.split_once('/').unwrap_or((asset_path, ""));
    match first {
        "vendor" => Some(format!("./vendor/{rest}")),
        "node_modules" => Some(rest.to_string()),
        _ => {
            diagnostics.emit(Diagnostic::warn(
                package_name,
                format!("app.imported from unknown path {asset_path}"),
            ));
            None
        }
    }
}

fn is_script(asset_path: &str) -> bool {
    asset_path.to_ascii_lowercase().ends_with(".js")
}

/// Splits one package's asset imports into app and test scripts.
///
/// The result is computed on first access and then frozen for the lifetime of the categorizer.
pub struct ImportCategorizer<'d> {
    package_name: String,
    directives: Vec<AssetImportDirective>,
    standard_vendor_output: String,
    diagnostics: &'d dyn DiagnosticsSink,
    categorized: OnceCell<CategorizedImports>,
}

impl<'d> ImportCategorizer<'d> {
    pub fn new(
        package_name: impl Into<String>,
        directives: Vec<AssetImportDirective>,
        diagnostics: &'d dyn DiagnosticsSink,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            directives,
            standard_vendor_output: STANDARD_VENDOR_OUTPUT.to_string(),
            diagnostics,
            categorized: OnceCell::new(),
        }
    }

    pub fn with_standard_vendor_output(mut self, output: impl Into<String>) -> Self {
        self.standard_vendor_output = output.into();
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn directives(&self) -> &[AssetImportDirective] {
        &self.directives
    }

    pub fn categorized(&self) -> &CategorizedImports {
        self.categorized.get_or_init(|| {
            debug!(package = %self.package_name, directives = self.directives.len(), "categorizing imports");
            self.categorize()
        })
    }

    /// Runtime-config metadata; empty buckets contribute no key.
    pub fn meta(&self) -> ImportMeta {
        let categorized = self.categorized();
        ImportMeta {
            implicit_scripts: non_empty(&categorized.app),
            implicit_test_scripts: non_empty(&categorized.test),
        }
    }

    fn categorize(&self) -> CategorizedImports {
        let mut out = CategorizedImports::default();
        let pkg = self.package_name.as_str();

        for directive in &self.directives {
            let asset_path = directive.asset_path.as_str();
            if !is_script(asset_path) {
                self.diagnostics.emit(Diagnostic::warn(
                    pkg,
                    format!("skipping non-js app.import {asset_path}"),
                ));
                continue;
            }

            let Some(standard) = standardize_asset_path(pkg, asset_path, self.diagnostics) else {
                continue;
            };

            match directive.options.kind.as_str() {
                KIND_VENDOR => {
                    if let Some(output) = directive.options.output_file.as_deref()
                        && output != self.standard_vendor_output
                    {
                        self.diagnostics.emit(Diagnostic::warn(
                            pkg,
                            format!(
                                "app.importing vendor assets into a nonstandard output file {output}"
                            ),
                        ));
                    }
                    out.app.push(standard);
                }
                KIND_TEST => out.test.push(standard),
                other => {
                    self.diagnostics.emit(Diagnostic::warn(
                        pkg,
                        format!("non-standard app.import type {other} for asset {asset_path}"),
                    ));
                }
            }
        }

        out
    }
}

fn non_empty(items: &[String]) -> Option<Vec<String>> {
    if items.is_empty() {
        None
    } else {
        Some(items.to_vec())
    }
}
