use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "providence",
    about = "Find the licenses of a Go module's dependencies and carry out the compliance actions they require",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Warn instead of failing on modules without a license or under a restricted non-LGPL license
    #[arg(long, global = true, env = "PROVIDENCE_PERMISSIVE")]
    pub permissive: bool,

    /// Config file [default: ./.providence/config.toml, fallback ~/.config/providence/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Format of the end-of-run summary
    #[arg(long, global = true, default_value = "terminal", value_name = "FORMAT")]
    pub format: SummaryFormat,

    /// Debug logging and list every module in the summary
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as newline-delimited JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Retrieve the license of a single module
    Check {
        /// Module as <path>@<version>
        module: String,
    },
    /// Check every dependency of a module, write the license report and copy required sources
    Dependencies {
        /// Module as <path>@<version>
        module: String,
    },
}

#[derive(Debug, Clone, PartialEq, clap::ValueEnum)]
pub enum SummaryFormat {
    Terminal,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "providence",
            "dependencies",
            "github.com/acme/app@v0.1.0",
            "--permissive",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.permissive);
        assert_eq!(cli.format, SummaryFormat::Json);
        match cli.command {
            Command::Dependencies { module } => assert_eq!(module, "github.com/acme/app@v0.1.0"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_module_argument_is_required() {
        assert!(Cli::try_parse_from(["providence", "check"]).is_err());
    }
}
