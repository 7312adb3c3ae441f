use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A third-party module with a resolved on-disk source directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub path: String,
    pub version: String,
    pub source_dir: PathBuf,
}

impl ModuleDependency {
    /// Identity key used for deduplication, e.g. `github.com/pkg/errors@v0.9.1`.
    pub fn key(&self) -> String {
        module_key(&self.path, &self.version)
    }
}

pub fn module_key(path: &str, version: &str) -> String {
    format!("{}@{}", path, version)
}

/// A tentative license identification tied to the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseCandidate {
    pub license_id: String,
    pub confidence: f32,
    pub source_file: PathBuf,
}

/// Compliance obligation attached to a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Attribution only.
    Notice,
    /// The dependency's source must be shipped.
    Reciprocal,
    /// Redistribution is restricted absent a specific exception.
    Restricted,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Notice => write!(f, "notice"),
            Category::Reciprocal => write!(f, "reciprocal"),
            Category::Restricted => write!(f, "restricted"),
        }
    }
}

/// The classification result for one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLicense {
    pub library_name: String,
    pub library_version: String,
    pub license_file: PathBuf,
    pub source_dir: PathBuf,
    pub canonical_name: String,
    pub category: Category,
    pub web_link: String,
}

impl ClassifiedLicense {
    pub fn key(&self) -> String {
        module_key(&self.library_name, &self.library_version)
    }
}

/// What the orchestrator did for a module, as shown in the run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Attribution,
    SourceCopied,
    SourceAndFirstPartyCopied,
    Skipped { reason: String },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Attribution => write!(f, "attribution"),
            Action::SourceCopied => write!(f, "source copied"),
            Action::SourceAndFirstPartyCopied => write!(f, "source + first-party copied"),
            Action::Skipped { reason } => write!(f, "skipped ({})", reason),
        }
    }
}

/// One row of the end-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleOutcome {
    pub module: String,
    pub license: Option<String>,
    pub category: Option<Category>,
    /// Where the license file can be browsed upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub action: Action,
}
