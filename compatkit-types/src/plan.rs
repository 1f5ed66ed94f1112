use crate::imports::{CategorizedImports, ImportMeta};
use crate::pipeline::PluginPipeline;
use crate::tree::{AnalyzerRequest, Tree};
use serde::{Deserialize, Serialize};

/// Everything compatkit derives for one legacy app, in one serializable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub schema: String,
    pub app: AppIdentity,
    pub pipeline: PluginPipeline,
    pub pipeline_cache_key: String,
    pub imports: CategorizedImports,
    pub meta: ImportMeta,
    pub trees: PlanTrees,
    pub analyzer: AnalyzerRequest,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub root: String,
    pub environment: String,
    pub module_unification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTrees {
    pub html: Tree,
    pub app_js: Tree,
    pub public: Tree,
}

/// An advisory message as recorded in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    pub message: String,
}
