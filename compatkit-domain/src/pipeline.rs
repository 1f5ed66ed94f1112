//! Plugin-pipeline assembly.
//!
//! The legacy build resolves and instantiates plugins up front, which leaves live functions in the
//! configuration. Here every entry is resolved to a path and kept as plain data, so the output can
//! be hashed into a cache key.

use crate::error::CompatError;
use crate::ports::{Diagnostic, DiagnosticsSink, PluginResolver};
use camino::{Utf8Path, Utf8PathBuf};
use compatkit_types::app::{ExtensionInfo, ModuleApiInfo};
use compatkit_types::pipeline::{PluginEntry, PluginPipeline, PresetEntry};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Literal build environment that turns debug-only code off.
pub const PRODUCTION_ENV: &str = "production";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Prefix applied to every configured plugin name.
    pub plugin_prefix: String,
    /// Where compatkit's own plugins are resolved from.
    pub tool_root: Utf8PathBuf,
    pub compat_plugin: String,
    pub debug_macros_plugin: String,
    pub modules_api_polyfill_plugin: String,
    pub env_preset: String,
    /// Extension that owns JS transpilation and carries module-API metadata.
    pub module_api_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plugin_prefix: "babel-plugin-".to_string(),
            tool_root: Utf8PathBuf::from("."),
            compat_plugin: "./babel-plugin".to_string(),
            debug_macros_plugin: "babel-plugin-debug-macros".to_string(),
            modules_api_polyfill_plugin: "babel-plugin-ember-modules-api-polyfill".to_string(),
            env_preset: "env".to_string(),
            module_api_extension: "ember-cli-babel".to_string(),
        }
    }
}

/// Build environment flags that affect generated code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFlags {
    pub build_env: Option<String>,
    pub ci: bool,
}

impl EnvFlags {
    pub fn is_production(&self) -> bool {
        self.build_env.as_deref() == Some(PRODUCTION_ENV)
    }
}

/// The package whose code the pipeline compiles.
#[derive(Debug, Clone, Copy)]
pub struct OwnPackage<'a> {
    pub name: &'a str,
    pub renamed_modules: &'a BTreeMap<String, String>,
}

/// Module-API metadata, as exposed by the transpilation extension.
pub type ModuleApi = ModuleApiInfo;

/// A configured plugin that can be expressed as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSpec {
    Named(String),
    WithOptions(String, Value),
}

impl PluginSpec {
    pub fn name(&self) -> &str {
        match self {
            PluginSpec::Named(n) => n,
            PluginSpec::WithOptions(n, _) => n,
        }
    }
}

/// Why a configured plugin was left out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginRejection {
    Null,
    EmptyName,
    /// Already required or constructed; no specifier to serialize.
    Instantiated,
    NonStringSpecifier,
}

impl fmt::Display for PluginRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginRejection::Null => "empty entry",
            PluginRejection::EmptyName => "empty plugin name",
            PluginRejection::Instantiated => "already-instantiated plugin",
            PluginRejection::NonStringSpecifier => "specifier is not a string",
        };
        f.write_str(s)
    }
}

pub fn classify_plugin(value: &Value) -> Result<PluginSpec, PluginRejection> {
    match value {
        Value::String(name) if name.is_empty() => Err(PluginRejection::EmptyName),
        Value::String(name) => Ok(PluginSpec::Named(name.clone())),
        Value::Array(items) => match items.as_slice() {
            [Value::String(name)] => Ok(PluginSpec::Named(name.clone())),
            [Value::String(name), options, ..] => {
                Ok(PluginSpec::WithOptions(name.clone(), options.clone()))
            }
            _ => Err(PluginRejection::NonStringSpecifier),
        },
        Value::Null => Err(PluginRejection::Null),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => Err(PluginRejection::Instantiated),
    }
}

/// Find the module-API metadata on the named extension.
pub fn find_module_api<'a>(
    extensions: &'a [ExtensionInfo],
    name: &str,
) -> Result<&'a ModuleApi, CompatError> {
    extensions
        .iter()
        .find(|e| e.name == name)
        .and_then(|e| e.module_api.as_ref())
        .ok_or_else(|| CompatError::MissingExtension {
            name: name.to_string(),
        })
}

/// Inputs for one pipeline build.
#[derive(Debug, Clone, Copy)]
pub struct PipelineInputs<'a> {
    pub configured: &'a [Value],
    /// Final location of the build output; user plugins resolve from here.
    pub final_root: &'a Utf8Path,
    pub own: OwnPackage<'a>,
    pub env: &'a EnvFlags,
    pub module_api: &'a ModuleApi,
}

pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn build(
        &self,
        inputs: &PipelineInputs<'_>,
        resolver: &dyn PluginResolver,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<PluginPipeline, CompatError> {
        let mut plugins = Vec::new();

        for (idx, value) in inputs.configured.iter().enumerate() {
            let spec = match classify_plugin(value) {
                Ok(spec) => spec,
                Err(reason) => {
                    debug!(index = idx, %reason, "skipping configured plugin");
                    diagnostics.emit(Diagnostic::debug(format!(
                        "skipping configured plugin #{idx}: {reason}"
                    )));
                    continue;
                }
            };

            let specifier = format!("{}{}", self.config.plugin_prefix, spec.name());
            let path = resolve(resolver, &specifier, inputs.final_root)?;
            plugins.push(match spec {
                PluginSpec::Named(_) => PluginEntry::Path(path),
                PluginSpec::WithOptions(_, options) => PluginEntry::WithOptions(path, options),
            });
        }

        plugins.push(self.compat_plugin(inputs, resolver)?);
        plugins.push(self.debug_macros_plugin(inputs.env, resolver)?);

        if inputs.module_api.requires_polyfill {
            let path = resolve(
                resolver,
                &self.config.modules_api_polyfill_plugin,
                &self.config.tool_root,
            )?;
            plugins.push(PluginEntry::WithOptions(
                path,
                json!({ "blacklist": inputs.module_api.denylist }),
            ));
        }

        let mut preset_options = Map::new();
        preset_options.insert("targets".to_string(), inputs.module_api.targets.clone());

        Ok(PluginPipeline {
            module_ids: true,
            babelrc: false,
            plugins,
            presets: vec![PresetEntry(self.config.env_preset.clone(), preset_options)],
        })
    }

    // Patches up implicit template extensions and packages importing their own names.
    fn compat_plugin(
        &self,
        inputs: &PipelineInputs<'_>,
        resolver: &dyn PluginResolver,
    ) -> Result<PluginEntry, CompatError> {
        let path = resolve(resolver, &self.config.compat_plugin, &self.config.tool_root)?;
        Ok(PluginEntry::WithOptions(
            path,
            json!({
                "ownName": inputs.own.name,
                "basedir": inputs.final_root.as_str(),
                "rename": inputs.own.renamed_modules,
            }),
        ))
    }

    fn debug_macros_plugin(
        &self,
        env: &EnvFlags,
        resolver: &dyn PluginResolver,
    ) -> Result<PluginEntry, CompatError> {
        let path = resolve(resolver, &self.config.debug_macros_plugin, &self.config.tool_root)?;
        Ok(PluginEntry::WithOptions(path, debug_macros_options(env)))
    }
}

fn debug_macros_options(env: &EnvFlags) -> Value {
    json!({
        "envFlags": {
            "source": "@glimmer/env",
            "flags": { "DEBUG": !env.is_production(), "CI": env.ci },
        },
        "externalizeHelpers": { "global": "Ember" },
        "debugTools": { "source": "@ember/debug", "assertPredicateIndex": 1 },
    })
}

fn resolve(
    resolver: &dyn PluginResolver,
    specifier: &str,
    basedir: &Utf8Path,
) -> Result<String, CompatError> {
    resolver
        .resolve(specifier, basedir)
        .map(|p| p.into_string())
        .map_err(|source| CompatError::UnresolvedPlugin {
            specifier: specifier.to_string(),
            basedir: basedir.to_path_buf(),
            source,
        })
}

/// Hex SHA-256 over the canonical JSON form of the pipeline.
pub fn pipeline_cache_key(pipeline: &PluginPipeline) -> String {
    let value = serde_json::to_value(pipeline).unwrap_or(Value::Null);
    let canonical = canonicalize_json(&value);
    let s = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonicalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut out = Map::new();
            for k in keys {
                if let Some(v) = map.get(&k) {
                    out.insert(k, canonicalize_json(v));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_json).collect()),
        other => other.clone(),
    }
}
