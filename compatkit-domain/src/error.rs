//! Structural failures.
//!
//! Advisory problems (odd asset paths, unknown import kinds, unserializable plugins) are reported
//! through the diagnostics sink instead; anything here means the build output would be wrong.

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompatError {
    /// A configured or internal plugin could not be resolved.
    #[error("cannot resolve plugin `{specifier}` from {basedir}")]
    UnresolvedPlugin {
        specifier: String,
        basedir: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// A required installed extension is missing, or lacks module-API metadata.
    #[error("required extension `{name}` is not installed or has no module-api metadata")]
    MissingExtension { name: String },

    /// No `package.json` was found at or above the app root.
    #[error("no package.json found at or above {start}")]
    PackageRootNotFound { start: Utf8PathBuf },
}
