//! In-memory tree engine.
//!
//! Gives tree descriptors a concrete meaning over named in-memory inputs, so composition can be
//! checked without a real build tool.

use crate::ports::{FileSet, TreeEngine};
use anyhow::{Context, anyhow, bail};
use compatkit_types::tree::{FunnelOptions, ReplacePattern, Replacement, Tree};
use glob::{MatchOptions, Pattern};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Path of an environment's evaluated config inside a config tree.
pub fn environment_config_path(environment: &str) -> String {
    format!("environments/{environment}.json")
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTreeEngine {
    sources: BTreeMap<String, FileSet>,
    inputs: BTreeMap<String, FileSet>,
    configs: BTreeMap<String, Value>,
}

impl MemoryTreeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, root: impl Into<String>, files: FileSet) -> Self {
        self.sources.insert(root.into(), files);
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, files: FileSet) -> Self {
        self.inputs.insert(name.into(), files);
        self
    }

    /// Evaluated app config for one environment.
    pub fn with_config(mut self, environment: impl Into<String>, config: Value) -> Self {
        self.configs.insert(environment.into(), config);
        self
    }

    fn config_module(
        &self,
        config: &Tree,
        config_path: &str,
        store_in_meta: bool,
        app_name: &str,
    ) -> anyhow::Result<String> {
        let cfg = self.load_config(config, config_path)?;
        if store_in_meta {
            return Ok(format!(
                "const meta = document.querySelector('meta[name=\"{app_name}/config/environment\"]');\n\
                 export default JSON.parse(decodeURIComponent(meta.getAttribute('content')));\n"
            ));
        }
        Ok(format!("export default {};\n", serde_json::to_string(&cfg)?))
    }

    fn load_config(&self, config: &Tree, config_path: &str) -> anyhow::Result<Value> {
        let files = self.materialize(config)?;
        let text = files
            .get(config_path)
            .ok_or_else(|| anyhow!("config tree has no {config_path}"))?;
        serde_json::from_str(text).with_context(|| format!("parse {config_path}"))
    }
}

impl TreeEngine for MemoryTreeEngine {
    fn materialize(&self, tree: &Tree) -> anyhow::Result<FileSet> {
        debug!(op = tree.op_name(), "materialize");
        match tree {
            Tree::Source { root } => self
                .sources
                .get(root)
                .cloned()
                .ok_or_else(|| anyhow!("no source tree at {root}")),
            Tree::Input { name } => self
                .inputs
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("no input tree named {name}")),
            Tree::Funnel { input, options } => funnel(self.materialize(input)?, options),
            Tree::Merge {
                inputs,
                overwrite,
                annotation,
            } => {
                let mut out = FileSet::new();
                for input in inputs {
                    for (path, contents) in self.materialize(input)? {
                        if !overwrite && out.contains_key(&path) {
                            bail!(
                                "merge conflict on {path}{}",
                                annotation
                                    .as_deref()
                                    .map(|a| format!(" ({a})"))
                                    .unwrap_or_default()
                            );
                        }
                        out.insert(path, contents);
                    }
                }
                Ok(out)
            }
            Tree::ConfigLoader {
                environment, tests, ..
            } => {
                let mut out = FileSet::new();
                let cfg = self
                    .configs
                    .get(environment)
                    .ok_or_else(|| anyhow!("no config for environment {environment}"))?;
                out.insert(
                    environment_config_path(environment),
                    serde_json::to_string(cfg)?,
                );
                if *tests && let Some(test_cfg) = self.configs.get("test") {
                    out.insert(environment_config_path("test"), serde_json::to_string(test_cfg)?);
                }
                Ok(out)
            }
            Tree::ConfigReplace {
                input,
                config,
                config_path,
                files,
                patterns,
            } => {
                let mut out = self.materialize(input)?;
                let cfg = self.load_config(config, config_path)?;
                for file in files {
                    if let Some(contents) = out.get_mut(file.trim_start_matches('/')) {
                        *contents = apply_patterns(contents, patterns, &cfg);
                    }
                }
                Ok(out)
            }
            Tree::WriteConfig {
                config,
                config_path,
                store_in_meta,
                app_name,
            } => {
                let module = self.config_module(config, config_path, *store_in_meta, app_name)?;
                Ok(FileSet::from([("config/environment.js".to_string(), module)]))
            }
        }
    }
}

fn compile(globs: &[String]) -> anyhow::Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| Pattern::new(g).with_context(|| format!("invalid glob {g}")))
        .collect()
}

fn funnel(files: FileSet, options: &FunnelOptions) -> anyhow::Result<FileSet> {
    let include = compile(&options.include)?;
    let exclude = compile(&options.exclude)?;

    let selected: Vec<(String, String)> = files
        .into_iter()
        .filter(|(path, _)| {
            let wanted = if options.files.is_empty() {
                include.is_empty() || include.iter().any(|g| g.matches_with(path, MATCH))
            } else {
                options.files.iter().any(|f| f == path)
            };
            wanted && !exclude.iter().any(|g| g.matches_with(path, MATCH))
        })
        .collect();

    if selected.is_empty() && !options.allow_empty {
        bail!(
            "funnel{} selected no files",
            options
                .annotation
                .as_deref()
                .map(|a| format!(" ({a})"))
                .unwrap_or_default()
        );
    }

    match &options.destination {
        None => Ok(selected.into_iter().collect()),
        Some(dest) => {
            if selected.len() > 1 {
                bail!("cannot rename {} files onto {dest}", selected.len());
            }
            Ok(selected
                .into_iter()
                .map(|(_, contents)| (dest.trim_start_matches('/').to_string(), contents))
                .collect())
        }
    }
}

fn apply_patterns(contents: &str, patterns: &[ReplacePattern], cfg: &Value) -> String {
    patterns.iter().fold(contents.to_string(), |acc, pattern| {
        let replacement = match &pattern.replacement {
            Replacement::Literal { value } => value.clone(),
            Replacement::ConfigValue { key } => match cfg.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            Replacement::ConfigJson => cfg.to_string(),
        };
        acc.replace(&pattern.matcher, &replacement)
    })
}
