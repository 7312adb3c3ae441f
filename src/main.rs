//! `providence`: find the license of every module a Go module depends on and
//! carry out what each license requires.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and initialise logging ([`logging`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Prepare a workspace and list modules through the Go toolchain ([`modules`]).
//! 4. Resolve and categorize each module's license ([`license`]).
//! 5. Write the license report and copy sources as required ([`compliance`], [`replicate`]).
//! 6. Render the summary ([`report`]).
//! 7. Exit `0`, or `1` with the reason when the run was aborted.

mod cli;
mod compliance;
mod config;
mod error;
mod license;
mod logging;
mod models;
mod modules;
mod replicate;
mod report;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::Level;

use cli::{Cli, Command, SummaryFormat};
use compliance::{Ledger, Orchestrator};
use config::{load_config, Config};
use error::ComplianceError;
use license::detector::LicenseFileScanner;
use license::matcher::PhraseMatcher;
use license::resolver::Resolver;
use license::taxonomy::{BuiltinTaxonomy, ConfiguredTaxonomy, Taxonomy};
use license::{classify_module, Classification};
use modules::{GoModules, ModuleSource};

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    logging::init_tracing(cli.json_logs, level);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;
    let permissive = cli.permissive || config.policy.permissive;

    let matcher = PhraseMatcher::new(config.matcher.threshold)?;
    let scanner = LicenseFileScanner::new(&matcher)?;
    let resolver = Resolver::new(&scanner, &matcher)?;
    let taxonomy = ConfiguredTaxonomy::new(std::mem::take(&mut config.taxonomy), BuiltinTaxonomy);

    match &cli.command {
        Command::Check { module } => check(module, &resolver, &taxonomy, permissive, cli.quiet),
        Command::Dependencies { module } => {
            dependencies(&cli, module, config, &resolver, &taxonomy, permissive)
        }
    }
}

fn check(
    module: &str,
    resolver: &Resolver<'_>,
    taxonomy: &dyn Taxonomy,
    permissive: bool,
    quiet: bool,
) -> Result<()> {
    let modules = GoModules::init(module, permissive, !quiet)?;
    let info = modules.module_info(module)?;

    match classify_module(&info, resolver, taxonomy)? {
        Classification::Classified(license) => {
            println!(
                "{} {} ({})",
                license.license_file.display(),
                license.canonical_name,
                license.category
            );
            println!("  {}", license.web_link.dimmed());
            Ok(())
        }
        Classification::NoLicenseFound => Err(ComplianceError::NoLicenseFound {
            module: info.key(),
        }
        .into()),
    }
}

fn dependencies(
    cli: &Cli,
    root: &str,
    config: Config,
    resolver: &Resolver<'_>,
    taxonomy: &dyn Taxonomy,
    permissive: bool,
) -> Result<()> {
    let modules = GoModules::init(root, permissive, !cli.quiet)?;
    let list = modules.list_all()?;
    if !cli.quiet {
        eprintln!("  {} {} modules", "→".cyan(), list.len());
    }

    let report_path = config.output.report.display().to_string();
    let firstparty = config.output.firstparty.clone();
    let orchestrator = Orchestrator::new(resolver, taxonomy, &modules, config.output, permissive);
    let mut ledger = Ledger::new();
    let outcomes = orchestrator.run(root, &list, &mut ledger)?;

    if ledger.firstparty_copied() && !cli.quiet {
        eprintln!(
            "  {} LGPL dependency found, source of {} copied under {}",
            "→".cyan(),
            root,
            firstparty.display()
        );
    }

    match cli.format {
        SummaryFormat::Terminal => {
            report::terminal::render(&outcomes, root, &report_path, cli.verbose, cli.quiet);
        }
        SummaryFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
    }

    Ok(())
}
