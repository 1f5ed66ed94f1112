//! Configuration file loading for compatkit.
//!
//! Discovers and loads `compatkit.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use compatkit_core::PipelineConfig;
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "compatkit.toml";

/// Top-level configuration from compatkit.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompatkitConfig {
    /// Plugin naming and resolution.
    pub pipeline: PipelineSection,

    /// Asset import normalization.
    pub imports: ImportsSection,

    /// Where artifacts go and which extra trees join the app JS.
    pub output: OutputSection,
}

/// Pipeline section of the config. Unset keys keep the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub plugin_prefix: Option<String>,
    pub tool_root: Option<Utf8PathBuf>,
    pub compat_plugin: Option<String>,
    pub debug_macros_plugin: Option<String>,
    pub modules_api_polyfill_plugin: Option<String>,
    pub env_preset: Option<String>,
    pub module_api_extension: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportsSection {
    /// Output file vendor imports are expected to land in.
    pub standard_vendor_output: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub out_dir: Option<Utf8PathBuf>,
    pub final_root: Option<Utf8PathBuf>,
    pub extension_trees: Vec<String>,
}

/// Discover the compatkit.toml config file in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a compatkit.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<CompatkitConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<CompatkitConfig> {
    let config: CompatkitConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<CompatkitConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(CompatkitConfig::default()),
    }
}

/// CLI values that may override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub out_dir: Option<Utf8PathBuf>,
    pub final_root: Option<Utf8PathBuf>,
    pub tool_root: Option<Utf8PathBuf>,
    pub extension_trees: Vec<String>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub out_dir: Option<Utf8PathBuf>,
    pub final_root: Option<Utf8PathBuf>,
    pub extension_trees: Vec<String>,
    pub standard_vendor_output: Option<String>,
    pub pipeline: PipelineConfig,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: CompatkitConfig,
}

impl ConfigMerger {
    pub fn new(config: CompatkitConfig) -> Self {
        Self { config }
    }

    /// CLI scalars replace config values; CLI extension trees extend the config list.
    pub fn merge(self, cli: &CliOverrides) -> MergedConfig {
        let section = self.config.pipeline;
        let defaults = PipelineConfig::default();
        let pipeline = PipelineConfig {
            plugin_prefix: section.plugin_prefix.unwrap_or(defaults.plugin_prefix),
            tool_root: cli
                .tool_root
                .clone()
                .or(section.tool_root)
                .unwrap_or(defaults.tool_root),
            compat_plugin: section.compat_plugin.unwrap_or(defaults.compat_plugin),
            debug_macros_plugin: section
                .debug_macros_plugin
                .unwrap_or(defaults.debug_macros_plugin),
            modules_api_polyfill_plugin: section
                .modules_api_polyfill_plugin
                .unwrap_or(defaults.modules_api_polyfill_plugin),
            env_preset: section.env_preset.unwrap_or(defaults.env_preset),
            module_api_extension: section
                .module_api_extension
                .unwrap_or(defaults.module_api_extension),
        };

        let mut extension_trees = self.config.output.extension_trees;
        for name in &cli.extension_trees {
            if !extension_trees.contains(name) {
                extension_trees.push(name.clone());
            }
        }

        MergedConfig {
            out_dir: cli.out_dir.clone().or(self.config.output.out_dir),
            final_root: cli.final_root.clone().or(self.config.output.final_root),
            extension_trees,
            standard_vendor_output: self.config.imports.standard_vendor_output,
            pipeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[pipeline]
plugin_prefix = "babel-plugin-"
tool_root = "/opt/compatkit"
module_api_extension = "ember-cli-babel"

[imports]
standard_vendor_output = "/assets/vendor.js"

[output]
out_dir = "artifacts/compatkit"
extension_trees = ["ember-data-app"]
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.pipeline.plugin_prefix.as_deref(), Some("babel-plugin-"));
        assert_eq!(
            config.pipeline.tool_root,
            Some(Utf8PathBuf::from("/opt/compatkit"))
        );
        assert_eq!(
            config.imports.standard_vendor_output.as_deref(),
            Some("/assets/vendor.js")
        );
        assert_eq!(config.output.extension_trees, vec!["ember-data-app"]);
        assert!(config.output.final_root.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.pipeline.plugin_prefix.is_none());
        assert!(config.output.extension_trees.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        let err = parse_config("[pipeline\n").expect_err("bad toml");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_merge_defaults_without_config() {
        let merged = ConfigMerger::new(CompatkitConfig::default()).merge(&CliOverrides::default());
        assert_eq!(merged.pipeline, PipelineConfig::default());
        assert!(merged.out_dir.is_none());
        assert!(merged.standard_vendor_output.is_none());
    }

    #[test]
    fn test_merge_cli_wins_for_scalars() {
        let config = parse_config(
            r#"
[pipeline]
tool_root = "/from/config"
plugin_prefix = "custom-"

[output]
out_dir = "config-out"
final_root = "/config/dist"
"#,
        )
        .unwrap();

        let cli = CliOverrides {
            out_dir: Some(Utf8PathBuf::from("cli-out")),
            tool_root: Some(Utf8PathBuf::from("/from/cli")),
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge(&cli);

        assert_eq!(merged.out_dir, Some(Utf8PathBuf::from("cli-out")));
        assert_eq!(merged.final_root, Some(Utf8PathBuf::from("/config/dist")));
        assert_eq!(merged.pipeline.tool_root, Utf8PathBuf::from("/from/cli"));
        assert_eq!(merged.pipeline.plugin_prefix, "custom-");
    }

    #[test]
    fn test_merge_cli_extends_extension_trees() {
        let config = CompatkitConfig {
            output: OutputSection {
                extension_trees: vec!["a".to_string(), "b".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = CliOverrides {
            extension_trees: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge(&cli);
        assert_eq!(merged.extension_trees, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root).expect("load default");
        assert!(cfg.output.out_dir.is_none());
    }
}
