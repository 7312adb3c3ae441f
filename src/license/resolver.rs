use std::path::{Component, Path};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::license::detector::{Detection, DirectoryDetector};
use crate::license::matcher::ContentMatcher;
use crate::models::LicenseCandidate;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(LicenseCandidate),
    NotFound,
}

/// Picks the single best license candidate for a module directory.
///
/// The whole-directory detector is tried first; only when it finds nothing
/// usable is every license-looking file in the tree run through the matcher.
pub struct Resolver<'a> {
    detector: &'a dyn DirectoryDetector,
    matcher: &'a dyn ContentMatcher,
    possible_license: Regex,
}

impl<'a> Resolver<'a> {
    pub fn new(detector: &'a dyn DirectoryDetector, matcher: &'a dyn ContentMatcher) -> Result<Self> {
        Ok(Self {
            detector,
            matcher,
            possible_license: Regex::new(r"(?i)^(LICEN[SC]E|COPYING|README|NOTICE)(\..+)?$")?,
        })
    }

    pub fn resolve(&self, source_dir: &Path) -> Result<Resolution> {
        match self.detector.detect(source_dir)? {
            Detection::Found(groups) => {
                let candidates = groups.into_iter().flat_map(|group| {
                    let dir = group.dir;
                    group.matches.into_iter().map(move |m| LicenseCandidate {
                        license_id: m.license_id,
                        confidence: m.confidence,
                        source_file: dir.join(m.file),
                    })
                });
                if let Some(best) = select_best(source_dir, candidates) {
                    return Ok(Resolution::Found(best));
                }
                debug!(dir = %source_dir.display(), "no usable match in license files, scanning whole tree");
            }
            Detection::NotFound => {
                debug!(dir = %source_dir.display(), "no license file, scanning whole tree");
            }
        }

        let candidates = self.deep_candidates(source_dir)?;
        Ok(match select_best(source_dir, candidates) {
            Some(best) => Resolution::Found(best),
            None => Resolution::NotFound,
        })
    }

    /// Match every LICENSE/COPYING/README/NOTICE file in the tree, in sorted walk order.
    fn deep_candidates(&self, source_dir: &Path) -> Result<Vec<LicenseCandidate>> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", source_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !self
                .possible_license
                .is_match(&entry.file_name().to_string_lossy())
            {
                continue;
            }
            let content = std::fs::read(entry.path())
                .with_context(|| format!("reading {}", entry.path().display()))?;
            for (license_id, confidence) in self.matcher.match_content(&content) {
                candidates.push(LicenseCandidate {
                    license_id,
                    confidence,
                    source_file: entry.path().to_path_buf(),
                });
            }
        }
        Ok(candidates)
    }
}

/// Highest confidence wins; on a tie the earlier candidate stays.
/// Documentation licenses never govern the code and are ignored.
fn select_best(
    source_dir: &Path,
    candidates: impl IntoIterator<Item = LicenseCandidate>,
) -> Option<LicenseCandidate> {
    let mut best: Option<LicenseCandidate> = None;
    let mut max = 0.0_f32;
    for candidate in candidates {
        if is_documentation(source_dir, &candidate.source_file) {
            continue;
        }
        if candidate.confidence > max {
            max = candidate.confidence;
            best = Some(candidate);
        }
    }
    best
}

fn is_documentation(source_dir: &Path, file: &Path) -> bool {
    let relative = file.strip_prefix(source_dir).unwrap_or(file);
    relative.components().any(|c| match c {
        Component::Normal(part) => {
            let part = part.to_string_lossy().to_lowercase();
            part == "docs" || part.ends_with(".docs")
        }
        _ => false,
    })
}
