//! Mercado API contract tests
//!
//! A CLI tool that runs an end-to-end suite against the "mercado" REST
//! resource: create, read, update, delete, list and validation failures.
//!
//! ## Features
//!
//! - 13 cases covering CRUD, validation, listing, not-found and concurrency
//! - Declarative request specs with status and body-shape expectations
//! - Values captured by one case (the created id) are threaded to later ones
//! - Concurrent fan-out for the bulk-create case
//! - Multiple output formats (Table, JSON, CSV, Summary) and report files
//!
//! ## Usage
//!
//! ```bash
//! # Run the whole suite against the hosted API
//! mercado-tests run
//!
//! # Run against a local server and keep a report
//! mercado-tests run --base-url http://localhost:3000 --output reports/run.json
//!
//! # Run specific cases (the create case is added when needed)
//! mercado-tests run --case 2 --case 13
//!
//! # List available cases
//! mercado-tests list --detailed
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

mod cases;
mod cli;
mod config;
mod context;
mod executor;
mod fake;
mod http;
mod matcher;
mod models;
mod output;
mod reporter;
mod spec;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Args, Command};
use config::{AppConfig, EnvConfig};
use executor::{Suite, SuiteRunner, SuiteSettings};
use http::HttpClient;
use models::MercadoCase;
use output::{OutputFormat, ResultFormatter};
use reporter::{ConsoleSink, FileSink, RunReporter};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    // Initialize logging
    init_logger(LogLevel::resolve(
        args.log_level.as_deref(),
        args.verbose,
        env.log_level.as_deref(),
    ));

    match args.command {
        Command::Run(run_args) => {
            let config = load_config(args.config.as_deref(), &env)?;
            let passed = run_suite(config, run_args).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Command::List(list_args) => {
            list_cases(list_args);
        }
        Command::Config(config_args) => {
            manage_config(config_args, args.config.as_deref(), &env)?;
        }
    }

    Ok(())
}

/// File (explicit, `MERCADO_TESTS_CONFIG`, or a standard location), then env
fn load_config(explicit: Option<&Path>, env: &EnvConfig) -> Result<AppConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.config_file.as_ref().map(PathBuf::from));

    let config = match path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::load_default()?,
    };

    if env.has_any() {
        debug!("Applying MERCADO_TESTS_* overrides");
    }
    Ok(config.merge_env(env))
}

/// Command-line flags win over file and environment
fn apply_run_args(mut config: AppConfig, args: &cli::RunArgs) -> Result<AppConfig> {
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(concurrent) = args.concurrent {
        config.max_concurrent = concurrent;
    }
    if let Some(format) = &args.format {
        config.report.format = format.clone();
    }
    if let Some(output) = &args.output {
        config.report.output = Some(output.clone());
    }
    if args.delete_captured {
        config.delete_id = None;
    }
    if args.no_color {
        config.report.color = false;
    }

    config.validate()?;
    Ok(config)
}

fn select_suite(numbers: &[u8], settings: SuiteSettings) -> Result<Suite> {
    if numbers.is_empty() {
        return Ok(Suite::all(settings)?);
    }

    let selected = numbers
        .iter()
        .map(|&n| {
            MercadoCase::from_number(n)
                .ok_or_else(|| anyhow::anyhow!("Unknown case: {n} (expected 1-13)"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Suite::with_prerequisites(&selected, settings)?)
}

fn build_reporter(config: &AppConfig) -> Result<RunReporter> {
    let format = OutputFormat::from_str(&config.report.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown report format: {}", config.report.format))?;

    let formatter = if config.report.color {
        ResultFormatter::new(format)
    } else {
        ResultFormatter::new(format).no_color()
    };

    let mut reporter = RunReporter::new().with_sink(ConsoleSink::new(formatter));

    if let Some(path) = &config.report.output {
        let file_format = OutputFormat::from_extension(path).unwrap_or(OutputFormat::JsonPretty);
        let sink = FileSink::new(path, file_format);
        info!("Report will be written to {} ({:?})", sink.path().display(), file_format);
        reporter = reporter.with_sink(sink);
    }

    Ok(reporter)
}

async fn run_suite(config: AppConfig, args: cli::RunArgs) -> Result<bool> {
    let config = apply_run_args(config, &args)?;
    let suite = select_suite(&args.cases, SuiteSettings::from(&config))?;
    let reporter = build_reporter(&config)?;

    let client = HttpClient::with_timeout(config.base_url.clone(), config.timeout_secs)?;

    info!(
        "Testing {} ({} cases, timeout {}s)",
        config.base_url,
        suite.cases().len(),
        config.timeout_secs
    );

    let runner = SuiteRunner::new(client, Arc::new(reporter));
    let report = runner
        .run(&suite)
        .await
        .context("Failed to write run report")?;

    Ok(!report.has_failures())
}

fn list_cases(args: cli::ListArgs) {
    let all = MercadoCase::all();
    println!("\nMercado API Test Cases ({} total)\n", all.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if args.detailed {
        for case in all {
            let requires: Vec<_> = case.requires().iter().map(|k| k.name()).collect();
            let provides: Vec<_> = case.provides().iter().map(|k| k.name()).collect();
            println!(
                "  {:2}. {:30} [{:11}] reads: {:12} writes: {}",
                case.number(),
                case.name(),
                case.category(),
                if requires.is_empty() { "-".to_string() } else { requires.join(",") },
                if provides.is_empty() { "-".to_string() } else { provides.join(",") },
            );
        }
    } else {
        let mut current_category = "";
        for case in all {
            let category = case.category();
            if category != current_category {
                println!("\n{category}:");
                println!("──────────────────────────────────────────────────────────────────────");
                current_category = category;
            }
            println!("  {:2}. {}", case.number(), case.name());
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn manage_config(args: cli::ConfigArgs, explicit: Option<&Path>, env: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Show { format } => {
            let config = load_config(explicit, env)?;
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            AppConfig::default().save(&output)?;
            println!("✓ Configuration file created: {}", output.display());
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Env => {
            config::print_env_help();
            println!();
            env.print_summary();
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| explicit.map(Path::to_path_buf))
                .or_else(AppConfig::find)
                .ok_or_else(|| anyhow::anyhow!("No configuration file found"))?;

            match AppConfig::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {}", path.display());
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> cli::RunArgs {
        let mut argv = vec!["mercado-tests", "run"];
        argv.extend_from_slice(extra);
        match Args::parse_from(argv).command {
            Command::Run(run_args) => run_args,
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let args = run_args(&["--base-url", "http://localhost:9", "--timeout", "3", "--delete-captured"]);
        let config = apply_run_args(AppConfig::default(), &args).unwrap();
        assert_eq!(config.base_url, "http://localhost:9");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.delete_id, None);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let args = run_args(&["--format", "xml"]);
        assert!(apply_run_args(AppConfig::default(), &args).is_err());
    }

    #[test]
    fn test_select_suite() {
        let settings = SuiteSettings::default();
        assert_eq!(select_suite(&[], settings.clone()).unwrap().cases().len(), 13);
        assert_eq!(
            select_suite(&[13], settings.clone()).unwrap().cases(),
            &[MercadoCase::Create, MercadoCase::FetchDetails]
        );
        assert!(select_suite(&[14], settings).is_err());
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"base_url": "http://localhost:4000", "fan_out": 3}"#).unwrap();

        let env = EnvConfig {
            timeout: Some(7),
            ..EnvConfig::default()
        };
        let config = load_config(Some(&path), &env).unwrap();
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.fan_out, 3);
        assert_eq!(config.timeout_secs, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_suite_writes_report_file() {
        let stub = testing::MercadoStub::start().await;
        stub.seed(3);
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("out").join("run.csv");

        let config = AppConfig {
            base_url: stub.base_url(),
            ..AppConfig::default()
        };
        let args = run_args(&["--output", report_path.to_str().unwrap(), "--format", "summary"]);

        let passed = run_suite(config, args).await.unwrap();
        assert!(passed);

        let csv = std::fs::read_to_string(&report_path).unwrap();
        assert!(csv.starts_with("case_num,case_name"));
        assert!(csv.contains("Create many and count"));
    }
}
