use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A resolved plugin: either a bare path or a `[path, options]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    Path(String),
    WithOptions(String, Value),
}

impl PluginEntry {
    pub fn path(&self) -> &str {
        match self {
            PluginEntry::Path(p) => p,
            PluginEntry::WithOptions(p, _) => p,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            PluginEntry::Path(_) => None,
            PluginEntry::WithOptions(_, opts) => Some(opts),
        }
    }
}

/// A preset entry, serialized as `[name, options]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry(pub String, pub Map<String, Value>);

/// Serializable source-transformation configuration.
///
/// Every member is plain data so the whole value can be hashed into a build
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginPipeline {
    pub module_ids: bool,
    pub babelrc: bool,
    pub plugins: Vec<PluginEntry>,
    pub presets: Vec<PresetEntry>,
}

impl Default for PluginPipeline {
    fn default() -> Self {
        Self {
            module_ids: true,
            babelrc: false,
            plugins: Vec::new(),
            presets: Vec::new(),
        }
    }
}
