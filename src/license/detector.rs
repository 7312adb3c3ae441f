use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::license::matcher::ContentMatcher;

/// One `(file, license id, confidence)` triple reported by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMatch {
    /// Relative to the match group's directory.
    pub file: PathBuf,
    pub license_id: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchGroup {
    pub dir: PathBuf,
    pub matches: Vec<FileMatch>,
}

/// Outcome of a whole-directory detection. Errors travel in the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Found(Vec<MatchGroup>),
    /// The directory has no license file at all.
    NotFound,
}

/// Whole-directory license detection.
pub trait DirectoryDetector {
    fn detect(&self, dir: &Path) -> Result<Detection>;
}

/// Looks at the files at the top of a module directory that are conventionally
/// license files and runs the content matcher over each of them.
pub struct LicenseFileScanner<'a> {
    matcher: &'a dyn ContentMatcher,
    license_name: Regex,
}

impl<'a> LicenseFileScanner<'a> {
    pub fn new(matcher: &'a dyn ContentMatcher) -> Result<Self> {
        Ok(Self {
            matcher,
            license_name: Regex::new(r"(?i)^(UN)?(LICEN[SC]E|COPYING)([.\-_].+)?$")?,
        })
    }
}

impl DirectoryDetector for LicenseFileScanner<'_> {
    fn detect(&self, dir: &Path) -> Result<Detection> {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("listing module directory {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if self.license_name.is_match(&name.to_string_lossy()) {
                files.push(PathBuf::from(name));
            }
        }

        if files.is_empty() {
            return Ok(Detection::NotFound);
        }
        files.sort();

        let mut matches = Vec::new();
        for file in files {
            let content = std::fs::read(dir.join(&file))
                .with_context(|| format!("reading {}", dir.join(&file).display()))?;
            for (license_id, confidence) in self.matcher.match_content(&content) {
                matches.push(FileMatch {
                    file: file.clone(),
                    license_id,
                    confidence,
                });
            }
        }

        Ok(Detection::Found(vec![MatchGroup {
            dir: dir.to_path_buf(),
            matches,
        }]))
    }
}
