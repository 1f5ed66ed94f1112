//! Domain logic: turn a legacy app's raw declarations into cache-stable build inputs.
//!
//! This crate owns *what* the normalized imports and plugin pipeline are. It does not own how the
//! legacy app is read or how trees are materialized; that's the `compatkit-core` crate.

mod error;
mod imports;
mod pipeline;
mod ports;

pub use error::CompatError;
pub use imports::{ImportCategorizer, STANDARD_VENDOR_OUTPUT, standardize_asset_path};
pub use pipeline::{
    EnvFlags, ModuleApi, OwnPackage, PRODUCTION_ENV, PipelineBuilder, PipelineConfig,
    PipelineInputs, PluginRejection, PluginSpec, classify_plugin, find_module_api,
    pipeline_cache_key,
};
pub use ports::{Diagnostic, DiagnosticLevel, DiagnosticsSink, NullDiagnostics, PluginResolver};
