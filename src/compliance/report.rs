use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::ClassifiedLicense;

const SEPARATOR: &str = "\n==============================\n\n";

/// Append-only license report; truncated when opened, one entry per module.
pub struct CompletionReport {
    path: PathBuf,
    file: File,
}

impl CompletionReport {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Write the header, the verbatim license text and a separator.
    pub fn append(&mut self, license: &ClassifiedLicense) -> Result<()> {
        let text = std::fs::read(&license.license_file).with_context(|| {
            format!("reading license file {}", license.license_file.display())
        })?;

        let header = format!(
            "Library {} used under the {} License, reproduced below:\n\n",
            license.key(),
            license.canonical_name
        );
        self.write(header.as_bytes())?;
        self.write(&text)?;
        self.write(SEPARATOR.as_bytes())?;
        self.file
            .flush()
            .with_context(|| format!("writing report {}", self.path.display()))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .with_context(|| format!("writing report {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use tempfile::tempdir;

    fn license(dir: &Path, name: &str) -> ClassifiedLicense {
        ClassifiedLicense {
            library_name: name.to_string(),
            library_version: "v1.0.0".to_string(),
            license_file: dir.join("LICENSE"),
            source_dir: dir.to_path_buf(),
            canonical_name: "MIT".to_string(),
            category: Category::Notice,
            web_link: String::new(),
        }
    }

    #[test]
    fn test_entry_format() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "MIT text").unwrap();
        let report_path = dir.path().join("LICENSES.txt");

        let mut report = CompletionReport::create(&report_path).unwrap();
        report.append(&license(dir.path(), "libX")).unwrap();

        assert_eq!(
            std::fs::read_to_string(&report_path).unwrap(),
            "Library libX@v1.0.0 used under the MIT License, reproduced below:\n\n\
             MIT text\n==============================\n\n"
        );
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let dir = tempdir().unwrap();
        let report_path = dir.path().join("LICENSES.txt");
        std::fs::write(&report_path, "stale").unwrap();

        CompletionReport::create(&report_path).unwrap();

        assert_eq!(std::fs::read_to_string(&report_path).unwrap(), "");
    }

    #[test]
    fn test_entries_are_appended_in_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "text").unwrap();
        let report_path = dir.path().join("LICENSES.txt");

        let mut report = CompletionReport::create(&report_path).unwrap();
        report.append(&license(dir.path(), "first")).unwrap();
        report.append(&license(dir.path(), "second")).unwrap();

        let content = std::fs::read_to_string(&report_path).unwrap();
        let first = content.find("Library first@").unwrap();
        let second = content.find("Library second@").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_unreadable_license_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut report = CompletionReport::create(&dir.path().join("LICENSES.txt")).unwrap();
        assert!(report.append(&license(dir.path(), "ghost")).is_err());
    }
}
