//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// End-to-end contract tests for the mercado API
#[derive(Parser, Debug)]
#[command(name = "mercado-tests")]
#[command(version = "0.1.0")]
#[command(about = "Run the mercado API contract suite against a live service")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the suite
    Run(RunArgs),

    /// List available cases
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Base URL of the API under test
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Case number to run (1-13); repeat for several. Cases that capture
    /// values the selection reads are added automatically.
    #[arg(long = "case", value_name = "N")]
    pub cases: Vec<u8>,

    /// Console format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write the report to this file; format follows the extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum concurrent requests during a fan-out
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// Delete the captured mercado instead of the fixed id
    #[arg(long)]
    pub delete_captured: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show category and context dependencies
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write a configuration file with default values
    Init {
        /// Output path
        #[arg(default_value = "./mercado-tests.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show supported environment variables and their current values
    Env,

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["mercado-tests", "list", "--detailed"]);
        match args.command {
            Command::List(list_args) => {
                assert!(list_args.detailed);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "mercado-tests",
            "run",
            "--base-url",
            "http://localhost:3000",
            "--case",
            "2",
            "--case",
            "13",
            "--output",
            "reports/run.json",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Run(run_args) => {
                assert_eq!(run_args.base_url.as_deref(), Some("http://localhost:3000"));
                assert_eq!(run_args.cases, vec![2, 13]);
                assert_eq!(run_args.output, Some(PathBuf::from("reports/run.json")));
                assert_eq!(run_args.timeout, None);
                assert!(!run_args.delete_captured);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_config_actions() {
        let args = Args::parse_from(["mercado-tests", "config", "init"]);
        match args.command {
            Command::Config(ConfigArgs {
                action: ConfigAction::Init { output, force },
            }) => {
                assert_eq!(output, PathBuf::from("./mercado-tests.yaml"));
                assert!(!force);
            }
            _ => panic!("Expected Config Init command"),
        }

        let args = Args::parse_from(["mercado-tests", "--log-level", "warn", "config", "env"]);
        assert_eq!(args.log_level.as_deref(), Some("warn"));
        assert!(matches!(
            args.command,
            Command::Config(ConfigArgs {
                action: ConfigAction::Env
            })
        ));
    }
}
