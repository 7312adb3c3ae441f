use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::license::taxonomy::LicenseType;

/// Root configuration structure, deserialized from `.providence/config.toml`.
///
/// Every section is optional; missing values fall back to [`Config::default`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub policy: PolicyConfig,
    pub matcher: MatcherConfig,
    /// License name → coarse type, consulted before the built-in taxonomy.
    pub taxonomy: HashMap<String, LicenseType>,
}

/// Where a compliance run writes its artifacts.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report reproducing every license text; truncated at the start of a run.
    pub report: PathBuf,
    /// Root for copies of reciprocal and LGPL dependency sources.
    pub thirdparty: PathBuf,
    /// Root for the one-off copy of the root module's own source.
    pub firstparty: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report: PathBuf::from("LICENSES.txt"),
            thirdparty: PathBuf::from("thirdparty"),
            firstparty: PathBuf::from("firstparty"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Downgrade missing licenses and non-LGPL restricted licenses to warnings.
    pub permissive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum confidence for a content match to count as a candidate.
    pub threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { threshold: 0.2 }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.providence/config.toml`
/// 3. `~/.config/providence/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".providence").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("providence").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.output.report, PathBuf::from("LICENSES.txt"));
        assert_eq!(cfg.output.thirdparty, PathBuf::from("thirdparty"));
        assert_eq!(cfg.output.firstparty, PathBuf::from("firstparty"));
        assert!(!cfg.policy.permissive);
        assert_eq!(cfg.matcher.threshold, 0.2);
        assert!(cfg.taxonomy.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[policy]
permissive = true

[taxonomy]
"Commercial-EULA" = "forbidden"
"Acme-1.0" = "notice"
"#,
        )
        .unwrap();
        assert!(cfg.policy.permissive);
        assert_eq!(cfg.output.report, PathBuf::from("LICENSES.txt"));
        assert_eq!(cfg.taxonomy["Acme-1.0"], LicenseType::Notice);
        assert_eq!(cfg.taxonomy["Commercial-EULA"], LicenseType::Forbidden);
    }

    #[test]
    fn test_project_config_is_found() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".providence")).unwrap();
        std::fs::write(
            dir.path().join(".providence/config.toml"),
            "[output]\nreport = \"NOTICE.txt\"\n[matcher]\nthreshold = 0.5\n",
        )
        .unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.output.report, PathBuf::from("NOTICE.txt"));
        assert_eq!(cfg.matcher.threshold, 0.5);
    }

    #[test]
    fn test_override_path_must_exist() {
        let dir = tempdir().unwrap();
        assert!(load_config(dir.path(), Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_unknown_license_type_is_rejected() {
        let parsed: Result<Config, _> = toml::from_str("[taxonomy]\nMIT = \"cheap\"\n");
        assert!(parsed.is_err());
    }
}
