use serde::{Deserialize, Serialize};

/// Import kind that routes an asset into the app bucket.
pub const KIND_VENDOR: &str = "vendor";

/// Import kind that routes an asset into the test bucket.
pub const KIND_TEST: &str = "test";

/// A single asset import declared by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetImportDirective {
    pub asset_path: String,
    pub options: ImportOptions,
}

impl AssetImportDirective {
    pub fn new(asset_path: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            options: ImportOptions {
                kind: kind.into(),
                output_file: None,
            },
        }
    }

    pub fn with_output_file(mut self, output_file: impl Into<String>) -> Self {
        self.options.output_file = Some(output_file.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Open-ended; only `vendor` and `test` are recognized.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// Standardized import paths split into script buckets, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedImports {
    pub app: Vec<String>,
    pub test: Vec<String>,
}

/// Metadata embedded into the app's runtime configuration.
///
/// Keys are only present when the matching bucket is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMeta {
    #[serde(
        rename = "implicit-scripts",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub implicit_scripts: Option<Vec<String>>,

    #[serde(
        rename = "implicit-test-scripts4",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub implicit_test_scripts: Option<Vec<String>>,
}

impl ImportMeta {
    pub fn is_empty(&self) -> bool {
        self.implicit_scripts.is_none() && self.implicit_test_scripts.is_none()
    }
}
