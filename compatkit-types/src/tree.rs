//! Declarative tree-operation descriptors.
//!
//! The tree engine materializes these; compatkit only describes them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Tree {
    /// A watched source directory on disk.
    Source { root: String },

    /// A tree owned by the legacy app or contributed by an extension.
    Input { name: String },

    Funnel {
        input: Box<Tree>,
        #[serde(flatten)]
        options: FunnelOptions,
    },

    Merge {
        inputs: Vec<Tree>,
        overwrite: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotation: Option<String>,
    },

    /// The app's evaluated configuration, one JSON file per environment.
    ConfigLoader {
        config_dir: String,
        environment: String,
        tests: bool,
    },

    ConfigReplace {
        input: Box<Tree>,
        config: Box<Tree>,
        config_path: String,
        files: Vec<String>,
        patterns: Vec<ReplacePattern>,
    },

    /// Generated configuration module for the app.
    WriteConfig {
        config: Box<Tree>,
        config_path: String,
        store_in_meta: bool,
        app_name: String,
    },
}

impl Tree {
    pub fn source(root: impl Into<String>) -> Self {
        Tree::Source { root: root.into() }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Tree::Input { name: name.into() }
    }

    pub fn funnel(input: Tree, options: FunnelOptions) -> Self {
        Tree::Funnel {
            input: Box::new(input),
            options,
        }
    }

    pub fn merge(inputs: Vec<Tree>, overwrite: bool, annotation: Option<&str>) -> Self {
        Tree::Merge {
            inputs,
            overwrite,
            annotation: annotation.map(str::to_string),
        }
    }

    /// Short label used in logs and rendered plans.
    pub fn op_name(&self) -> &'static str {
        match self {
            Tree::Source { .. } => "source",
            Tree::Input { .. } => "input",
            Tree::Funnel { .. } => "funnel",
            Tree::Merge { .. } => "merge",
            Tree::ConfigLoader { .. } => "config_loader",
            Tree::ConfigReplace { .. } => "config_replace",
            Tree::WriteConfig { .. } => "write_config",
        }
    }
}

/// Selection options for a funnel.
///
/// `files` selects exact relative paths; `include`/`exclude` are globs.
/// `destination` renames every selected file to a single output path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(default)]
    pub allow_empty: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// A literal placeholder and what replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacePattern {
    #[serde(rename = "match")]
    pub matcher: String,
    pub replacement: Replacement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Replacement {
    Literal { value: String },
    /// A top-level string value of the environment config.
    ConfigValue { key: String },
    /// The whole environment config as compact JSON.
    ConfigJson,
}

/// Input for the external dependency analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerRequest {
    pub trees: Vec<Tree>,
    pub package: Value,
    pub is_app: bool,
}

/// A script element already extracted from the entry HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl ScriptTag {
    pub fn with_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
        }
    }
}
