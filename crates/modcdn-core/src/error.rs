//! Error type for modcdn operations.
//!
//! `Resolver::resolve` only ever returns `InvalidArgument`; "not found" is
//! `Ok(None)`. Every other variant is a load-time defect raised while reading
//! the registry, the URL template or the config.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdnError {
    /// Caller passed an empty module name or version.
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    #[error("invalid version range '{range}' for module '{module}': {reason}")]
    InvalidRange {
        module: String,
        range: String,
        reason: String,
    },

    /// A registry path that is neither `/`-prefixed nor a `[version]` template.
    #[error("invalid path '{path}' for module '{module}' (range '{range}'): {reason}")]
    InvalidPath {
        module: String,
        range: String,
        path: String,
        reason: String,
    },

    #[error("invalid URL template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid environment '{0}' (expected 'development' or 'production')")]
    InvalidEnvironment(String),

    #[error("failed to parse registry: {0}")]
    Registry(#[from] serde_json::Error),

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CdnError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        CdnError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CdnError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for caller misuse, as opposed to configuration defects.
    pub fn is_misuse(&self) -> bool {
        matches!(self, CdnError::InvalidArgument { .. })
    }
}

pub type Result<T> = std::result::Result<T, CdnError>;
