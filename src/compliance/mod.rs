//! The per-module compliance loop.
//!
//! For every dependency, in list order: deduplicate on `path@version`, classify,
//! refuse non-LGPL restricted licenses, reproduce the license text in the
//! report, then copy sources as the category demands. The first LGPL
//! dependency additionally triggers a single copy of the root module's own
//! source.

pub mod report;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::error::ComplianceError;
use crate::license::resolver::Resolver;
use crate::license::taxonomy::Taxonomy;
use crate::license::{classify_module, Classification};
use crate::models::{Action, Category, ClassifiedLicense, ModuleDependency, ModuleOutcome};
use crate::modules::ModuleSource;
use crate::replicate::replicate_into;
use report::CompletionReport;

/// Run-scoped state. Create one per run so nothing leaks between runs.
#[derive(Debug, Default)]
pub struct Ledger {
    seen: HashSet<String>,
    firstparty_copied: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; `false` if it was already reported this run.
    pub fn mark_seen(&mut self, key: &str) -> bool {
        self.seen.insert(key.to_string())
    }

    /// `true` exactly once per ledger: the caller owns the first-party copy.
    pub fn claim_firstparty(&mut self) -> bool {
        if self.firstparty_copied {
            return false;
        }
        self.firstparty_copied = true;
        true
    }

    pub fn firstparty_copied(&self) -> bool {
        self.firstparty_copied
    }
}

pub struct Orchestrator<'a> {
    resolver: &'a Resolver<'a>,
    taxonomy: &'a dyn Taxonomy,
    modules: &'a dyn ModuleSource,
    output: OutputConfig,
    permissive: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        resolver: &'a Resolver<'a>,
        taxonomy: &'a dyn Taxonomy,
        modules: &'a dyn ModuleSource,
        output: OutputConfig,
        permissive: bool,
    ) -> Self {
        Self {
            resolver,
            taxonomy,
            modules,
            output,
            permissive,
        }
    }

    /// Process `dependencies` of `root` (`path@version`) in order.
    ///
    /// Returns one outcome per module that was reported or skipped. Any I/O
    /// failure aborts the run, as do missing and non-LGPL restricted licenses
    /// unless running permissively.
    pub fn run(
        &self,
        root: &str,
        dependencies: &[ModuleDependency],
        ledger: &mut Ledger,
    ) -> Result<Vec<ModuleOutcome>> {
        let mut report = CompletionReport::create(&self.output.report)?;
        let mut outcomes = Vec::new();

        for dependency in dependencies {
            let key = dependency.key();
            if !ledger.mark_seen(&key) {
                debug!(module = %key, "already processed");
                continue;
            }
            let license = match classify_module(dependency, self.resolver, self.taxonomy)
                .with_context(|| format!("classifying {}", key))?
            {
                Classification::Classified(license) => license,
                Classification::NoLicenseFound => {
                    let err = ComplianceError::NoLicenseFound {
                        module: key.clone(),
                    };
                    if !self.permissive {
                        return Err(err.into());
                    }
                    warn!(event = "module.skipped", module = %key, "{}", err);
                    outcomes.push(skipped(key, None, "no license found"));
                    continue;
                }
            };

            info!(
                event = "module.classified",
                module = %key,
                license = %license.canonical_name,
                category = %license.category,
            );

            if license.category == Category::Restricted && !license.canonical_name.starts_with("LGPL") {
                let err = ComplianceError::RestrictedLicense {
                    module: key.clone(),
                    license: license.canonical_name.clone(),
                };
                if !self.permissive {
                    return Err(err.into());
                }
                warn!(event = "module.violation", module = %key, "{}", err);
                outcomes.push(skipped(key, Some(&license), "restricted license"));
                continue;
            }

            report.append(&license)?;
            let action = self.dispatch(root, &license, ledger)?;
            outcomes.push(ModuleOutcome {
                module: key,
                license: Some(license.canonical_name),
                category: Some(license.category),
                link: Some(license.web_link),
                action,
            });
        }

        Ok(outcomes)
    }

    fn dispatch(&self, root: &str, license: &ClassifiedLicense, ledger: &mut Ledger) -> Result<Action> {
        match license.category {
            Category::Notice => Ok(Action::Attribution),
            Category::Reciprocal => {
                self.copy_thirdparty(license)?;
                Ok(Action::SourceCopied)
            }
            // Only LGPL gets this far; anything else was refused by the caller.
            Category::Restricted => {
                self.copy_thirdparty(license)?;
                if !ledger.claim_firstparty() {
                    return Ok(Action::SourceCopied);
                }
                self.copy_firstparty(root)?;
                Ok(Action::SourceAndFirstPartyCopied)
            }
        }
    }

    fn copy_thirdparty(&self, license: &ClassifiedLicense) -> Result<()> {
        let dest = self.output.thirdparty.join(&license.library_name);
        replicate_into(&license.source_dir, &dest)
            .with_context(|| format!("copying source of {} into {}", license.key(), dest.display()))?;
        info!(event = "sources.copied", module = %license.key(), dest = %dest.display());
        Ok(())
    }

    fn copy_firstparty(&self, root: &str) -> Result<()> {
        let info = self
            .modules
            .module_info(root)
            .with_context(|| format!("locating root module {}", root))?;
        let dest: PathBuf = self.output.firstparty.join(&info.path);
        replicate_into(&info.source_dir, &dest)
            .with_context(|| format!("copying root module source into {}", dest.display()))?;
        info!(event = "firstparty.copied", module = %root, dest = %dest.display());
        Ok(())
    }
}

fn skipped(module: String, license: Option<&ClassifiedLicense>, reason: &str) -> ModuleOutcome {
    ModuleOutcome {
        module,
        license: license.map(|l| l.canonical_name.clone()),
        category: license.map(|l| l.category),
        link: license.map(|l| l.web_link.clone()),
        action: Action::Skipped {
            reason: reason.to_string(),
        },
    }
}
