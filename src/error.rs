use std::path::PathBuf;

use thiserror::Error;

/// Per-module conditions the orchestrator gates on the permissive flag.
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("module {module}: no license detected, check and add manually")]
    NoLicenseFound { module: String },

    #[error("{module} is under a restricted license {license}")]
    RestrictedLicense { module: String, license: String },
}

/// A single failed filesystem operation while replicating a directory tree.
#[derive(Debug, Error)]
#[error("{op} on '{}': {source}", .path.display())]
pub struct CopyError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl CopyError {
    pub fn new(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }
}
