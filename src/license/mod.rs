//! License identification and categorization for a single module.
//!
//! - [`matcher`]: content-similarity matching of file bytes against known license wording.
//! - [`detector`]: whole-directory detection over conventional license files.
//! - [`resolver`]: two-tier resolution (detector, then deep tree scan) to one best candidate.
//! - [`taxonomy`]: coarse license types, built-in table plus config overrides.
//! - [`classifier`]: canonical names and the notice/reciprocal/restricted split.

pub mod classifier;
pub mod detector;
pub mod matcher;
pub mod resolver;
pub mod taxonomy;

use std::path::Path;

use anyhow::Result;

use crate::models::{ClassifiedLicense, ModuleDependency};
use classifier::categorize;
use resolver::{Resolution, Resolver};
use taxonomy::Taxonomy;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Classified(ClassifiedLicense),
    /// Expected for some modules; the caller decides whether it is fatal.
    NoLicenseFound,
}

/// Resolve and categorize the license of `module`.
pub fn classify_module(
    module: &ModuleDependency,
    resolver: &Resolver<'_>,
    taxonomy: &dyn Taxonomy,
) -> Result<Classification> {
    let candidate = match resolver.resolve(&module.source_dir)? {
        Resolution::Found(candidate) => candidate,
        Resolution::NotFound => return Ok(Classification::NoLicenseFound),
    };
    let (canonical_name, category) = categorize(&candidate.license_id, taxonomy);
    let web_link = web_link(module, &candidate.source_file);

    Ok(Classification::Classified(ClassifiedLicense {
        library_name: module.path.clone(),
        library_version: module.version.clone(),
        license_file: candidate.source_file,
        source_dir: module.source_dir.clone(),
        canonical_name,
        category,
        web_link,
    }))
}

fn web_link(module: &ModuleDependency, license_file: &Path) -> String {
    let relative = license_file
        .strip_prefix(&module.source_dir)
        .unwrap_or(license_file);
    let relative: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!(
        "https://{}/tree/{}/{}",
        module.path,
        module.version,
        relative.join("/")
    )
}
