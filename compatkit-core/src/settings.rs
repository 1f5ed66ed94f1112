//! Clap-free settings for the build pipeline.

use camino::Utf8PathBuf;
use compatkit_domain::{EnvFlags, PipelineConfig, STANDARD_VENDOR_OUTPUT};

/// Settings for one `run_build` invocation.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub snapshot: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    /// Where the compat build lands; user plugins resolve from here.
    /// Defaults to the app's package root when unset.
    pub final_root: Option<Utf8PathBuf>,

    /// Names of extension-contributed trees merged under the app's own JS.
    pub extension_trees: Vec<String>,

    // Normalization
    pub standard_vendor_output: String,
    pub pipeline: PipelineConfig,

    // Environment
    pub env: EnvFlags,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            snapshot: Utf8PathBuf::from("app.json"),
            out_dir: Utf8PathBuf::from("artifacts/compatkit"),
            final_root: None,
            extension_trees: Vec::new(),
            standard_vendor_output: STANDARD_VENDOR_OUTPUT.to_string(),
            pipeline: PipelineConfig::default(),
            env: EnvFlags::default(),
        }
    }
}

impl BuildSettings {
    /// The subset the facade needs.
    pub fn facade(&self) -> FacadeSettings {
        FacadeSettings {
            standard_vendor_output: self.standard_vendor_output.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Settings consumed by [`LegacyAppFacade`](crate::facade::LegacyAppFacade).
#[derive(Debug, Clone)]
pub struct FacadeSettings {
    pub standard_vendor_output: String,
    pub pipeline: PipelineConfig,
}

impl Default for FacadeSettings {
    fn default() -> Self {
        Self {
            standard_vendor_output: STANDARD_VENDOR_OUTPUT.to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}
