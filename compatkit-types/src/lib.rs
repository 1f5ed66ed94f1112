//! Shared DTOs (schemas-as-code) for the compatkit workspace.
//!
//! # Design constraints
//! - Everything here is plain data and serializes deterministically.
//! - Object-valued options use `serde_json::Map`, which keeps keys sorted.
//! - Prefer adding optional fields over changing semantics.

pub mod app;
pub mod imports;
pub mod pipeline;
pub mod plan;
pub mod tree;

/// Schema identifiers.
pub mod schema {
    pub const COMPATKIT_BUILD_V1: &str = "compatkit.build.v1";
    pub const COMPATKIT_SNAPSHOT_V1: &str = "compatkit.snapshot.v1";
}
