//! Embeddable core library for compatkit.
//!
//! Provides a clap-free, I/O-abstracted entry point that reads a legacy app through a narrow port
//! and produces a serializable build plan.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`LegacyApp`](ports::LegacyApp): read-only view of the legacy app
//! - [`PackageRootLocator`](ports::PackageRootLocator): find the app's package root
//! - [`TreeEngine`](ports::TreeEngine): materialize tree descriptors
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides default implementations.
//!
//! # Entry points
//!
//! - [`run_build`](pipeline::run_build): derive the build plan for one app
//! - [`write_build_artifacts`](pipeline::write_build_artifacts): persist it

pub mod adapters;
pub mod engine;
pub mod facade;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod settings;

// Re-export the domain's ports so embedders don't need compatkit-domain directly.
pub use compatkit_domain::{
    CompatError, Diagnostic, DiagnosticLevel, DiagnosticsSink, EnvFlags, PipelineConfig,
    PluginResolver, pipeline_cache_key,
};
