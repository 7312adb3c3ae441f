//! Module listing and download through the Go toolchain.
//!
//! [`GoModules::init`] prepares a private workspace holding a copy of the root
//! module, downloads every dependency into the module cache, and afterwards
//! answers `go list -m -json all` and `go mod download -json` queries from it.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::models::ModuleDependency;
use crate::replicate::replicate_into;

/// Supplies the modules of a build and where their sources live on disk.
pub trait ModuleSource {
    /// Every module of the build, the root included, in toolchain order.
    fn list_all(&self) -> Result<Vec<ModuleDependency>>;

    /// Resolve a single `path@version` module.
    fn module_info(&self, module: &str) -> Result<ModuleDependency>;
}

/// Split `github.com/acme/app@v0.1.0` into path and version.
pub fn parse_module_id(id: &str) -> Result<(&str, &str)> {
    match id.rsplit_once('@') {
        Some((path, version)) if !path.is_empty() && !version.is_empty() => Ok((path, version)),
        _ => bail!("module must be given as <path>@<version>, got '{}'", id),
    }
}

/// One object of the `go list -m -json` / `go mod download -json` stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoModuleInfo {
    path: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    main: bool,
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    replace: Option<Box<GoModuleInfo>>,
    #[serde(default)]
    error: Option<GoModuleError>,
}

#[derive(Debug, Deserialize)]
struct GoModuleError {
    #[serde(rename = "Err")]
    err: String,
}

/// The toolchain prints concatenated JSON objects rather than an array.
fn parse_module_stream(out: &[u8]) -> Result<Vec<GoModuleInfo>> {
    serde_json::Deserializer::from_slice(out)
        .into_iter::<GoModuleInfo>()
        .collect::<Result<Vec<_>, _>>()
        .context("parsing go module JSON output")
}

/// Environment variables forwarded to the toolchain when set.
const FORWARDED_ENV: &[&str] = &["PATH", "HOME", "GOPROXY", "GOPRIVATE", "GONOSUMDB", "GOSUMDB"];

pub struct GoModules {
    root: String,
    /// The root as downloaded by `init`, before the workspace became its main module.
    root_info: Option<ModuleDependency>,
    gopath: String,
    workspace: TempDir,
    cache: TempDir,
}

impl GoModules {
    /// Download `root` and all of its dependencies.
    ///
    /// A failing `go mod download` of the dependency graph is fatal unless
    /// `permissive` is set, in which case listing proceeds with what is there.
    pub fn init(root: &str, permissive: bool, show_progress: bool) -> Result<Self> {
        parse_module_id(root)?;
        let gopath = go_env_gopath()?;
        let mut modules = Self {
            root: root.to_string(),
            root_info: None,
            gopath,
            workspace: tempfile::Builder::new()
                .prefix("providence-work-")
                .tempdir()
                .context("creating temporary working directory")?,
            cache: tempfile::Builder::new()
                .prefix("providence-cache-")
                .tempdir()
                .context("creating temporary GOCACHE")?,
        };

        let spinner = show_progress.then(|| spinner(&format!("downloading {}", root)));

        info!(module = %root, dir = %modules.workspace.path().display(), "downloading root module");
        let root_info = modules
            .download(root)
            .with_context(|| format!("could not download the root module {}", root))?;
        replicate_into(&root_info.source_dir, modules.workspace.path()).with_context(|| {
            format!(
                "could not copy the root module's dir '{}' into '{}'",
                root_info.source_dir.display(),
                modules.workspace.path().display()
            )
        })?;
        modules.root_info = Some(root_info);

        if let Some(pb) = &spinner {
            pb.set_message("downloading transitive dependencies");
        }
        info!("downloading transitive dependencies");
        let out = modules.run(&["mod", "download"])?;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        if !out.status.success() {
            let detail = String::from_utf8_lossy(&out.stderr);
            if !permissive {
                bail!(
                    "module {}: 'go mod download' failed in '{}': {}\nUse --permissive to ignore.",
                    root,
                    modules.workspace.path().display(),
                    detail.trim()
                );
            }
            warn!(module = %root, "'go mod download' failed, continuing: {}", detail.trim());
        }

        Ok(modules)
    }

    fn download(&self, module: &str) -> Result<ModuleDependency> {
        let mut modules = self.run_json(&["mod", "download", "-json", module])?;
        if modules.len() != 1 {
            bail!(
                "'go mod download -json {}' returned {} modules, expected one",
                module,
                modules.len()
            );
        }
        let info = modules.remove(0);
        let path = info.path.clone();
        self.to_dependency(info)
            .with_context(|| format!("resolving {}", path))
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("go");
        cmd.args(args)
            .current_dir(self.workspace.path())
            .env_clear()
            .env("GO111MODULE", "on")
            .env("GOCACHE", self.cache.path())
            .env("GOPATH", &self.gopath);
        for key in FORWARDED_ENV {
            if let Ok(value) = std::env::var(key) {
                cmd.env(key, value);
            }
        }
        debug!(command = %format!("go {}", args.join(" ")), "running");
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        self.command(args)
            .output()
            .with_context(|| format!("while running 'go {}'", args.join(" ")))
    }

    fn run_json(&self, args: &[&str]) -> Result<Vec<GoModuleInfo>> {
        let out = self.run(args)?;
        if !out.status.success() {
            bail!(
                "while running 'go {}': {}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        parse_module_stream(&out.stdout)
            .with_context(|| format!("parsing the output of 'go {}'", args.join(" ")))
    }

    fn to_dependency(&self, info: GoModuleInfo) -> Result<ModuleDependency> {
        if let Some(err) = &info.error {
            bail!("module {}@{}: {}", info.path, info.version, err.err);
        }
        if info.main {
            // The main module is the workspace copy of the root.
            let (_, version) = parse_module_id(&self.root)?;
            return Ok(ModuleDependency {
                path: info.path,
                version: version.to_string(),
                source_dir: self.workspace.path().to_path_buf(),
            });
        }
        let dir = info
            .replace
            .as_ref()
            .and_then(|r| r.dir.clone())
            .or(info.dir);
        match dir {
            Some(source_dir) => Ok(ModuleDependency {
                path: info.path,
                version: info.version,
                source_dir,
            }),
            None => bail!(
                "module {}@{} has no source directory; it was not downloaded",
                info.path,
                info.version
            ),
        }
    }
}

impl ModuleSource for GoModules {
    fn list_all(&self) -> Result<Vec<ModuleDependency>> {
        self.run_json(&["list", "-m", "-json", "all"])?
            .into_iter()
            .map(|info| self.to_dependency(info))
            .collect()
    }

    fn module_info(&self, module: &str) -> Result<ModuleDependency> {
        // Inside the workspace the root is the main module and cannot be
        // queried by version again.
        match &self.root_info {
            Some(info) if module == self.root => Ok(info.clone()),
            _ => self.download(module),
        }
    }
}

fn go_env_gopath() -> Result<String> {
    let out = Command::new("go")
        .args(["env", "GOPATH"])
        .output()
        .context("while running 'go env GOPATH' to guess your GOPATH")?;
    if !out.status.success() {
        bail!(
            "'go env GOPATH' failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_module_id() {
        assert_eq!(
            parse_module_id("github.com/acme/app@v0.1.0").unwrap(),
            ("github.com/acme/app", "v0.1.0")
        );
        assert!(parse_module_id("github.com/acme/app").is_err());
        assert!(parse_module_id("github.com/acme/app@").is_err());
        assert!(parse_module_id("@v1.0.0").is_err());
    }

    #[test]
    fn test_parse_module_stream() {
        let out = br#"{
	"Path": "github.com/acme/app",
	"Main": true,
	"Dir": "/tmp/work",
	"GoMod": "/tmp/work/go.mod",
	"GoVersion": "1.21"
}
{
	"Path": "github.com/pkg/errors",
	"Version": "v0.9.1",
	"Dir": "/go/pkg/mod/github.com/pkg/errors@v0.9.1"
}
{
	"Path": "golang.org/x/text",
	"Version": "v0.3.0",
	"Replace": {
		"Path": "../text",
		"Dir": "/src/text"
	}
}
"#;
        let modules = parse_module_stream(out).unwrap();
        assert_eq!(modules.len(), 3);
        assert!(modules[0].main);
        assert_eq!(modules[0].version, "");
        assert_eq!(modules[1].version, "v0.9.1");
        assert_eq!(
            modules[1].dir.as_deref(),
            Some(Path::new("/go/pkg/mod/github.com/pkg/errors@v0.9.1"))
        );
        assert_eq!(
            modules[2].replace.as_ref().and_then(|r| r.dir.as_deref()),
            Some(Path::new("/src/text"))
        );
    }

    #[test]
    fn test_parse_module_stream_reports_module_errors() {
        let out = br#"{"Path": "example.com/gone", "Version": "v1.0.0", "Error": {"Err": "not found"}}"#;
        let modules = parse_module_stream(out).unwrap();
        assert_eq!(modules[0].error.as_ref().map(|e| e.err.as_str()), Some("not found"));
    }

    #[test]
    fn test_root_module_info_reuses_initial_download() {
        let root_info = ModuleDependency {
            path: "github.com/acme/app".to_string(),
            version: "v0.1.0".to_string(),
            source_dir: PathBuf::from("/go/pkg/mod/github.com/acme/app@v0.1.0"),
        };
        let modules = GoModules {
            root: "github.com/acme/app@v0.1.0".to_string(),
            root_info: Some(root_info.clone()),
            gopath: String::new(),
            workspace: tempfile::tempdir().unwrap(),
            cache: tempfile::tempdir().unwrap(),
        };

        let info = modules.module_info("github.com/acme/app@v0.1.0").unwrap();

        assert_eq!(info.source_dir, root_info.source_dir);
        assert_eq!(info.key(), "github.com/acme/app@v0.1.0");
    }

    #[test]
    fn test_parse_module_stream_rejects_garbage() {
        assert!(parse_module_stream(b"go: not a module").is_err());
    }
}
