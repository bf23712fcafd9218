//! SSML Check CLI - JSON bridge
//!
//! Commands: tags, check, fix
//! Reads an xml-js style JSON tree, writes JSON to stdout, logs to stderr
//! Returns 2 when a check is blocked by violations

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use ssml_check_core::{CheckConfig, CheckError, Checker, Platform, Tag, ENGINE_VERSION};

#[derive(Parser)]
#[command(name = "ssml-check-cli")]
#[command(about = "SSML Check CLI - platform-aware speech markup sanitizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON check configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Target platform: generic, amazon or google
    #[arg(short, long, global = true)]
    platform: Option<String>,

    /// Target locale, e.g. en-US
    #[arg(short, long, global = true)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported tags and their attributes
    Tags,

    /// Check a document and print the report
    Check {
        /// JSON document path, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },

    /// Repair a document and print it with the report
    Fix {
        /// JSON document path, or - for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
}

fn resolve_config(cli: &Cli) -> Result<CheckConfig, CheckError> {
    let mut config = match &cli.config {
        Some(path) => CheckConfig::load_from_file(path)?,
        None => CheckConfig::default(),
    };
    if let Some(platform) = &cli.platform {
        config.platform = Platform::from_name(platform);
    }
    if let Some(locale) = &cli.locale {
        config.locale = locale.parse()?;
    }
    Ok(config)
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(input)
    }
}

fn print_json(value: &impl Serialize) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            true
        }
        Err(e) => {
            eprintln!("failed to serialize output: {}", e);
            false
        }
    }
}

fn fail(message: String) -> ExitCode {
    print_json(&serde_json::json!({ "valid": false, "error": message }));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(c) => c,
        Err(e) => return fail(e.to_string()),
    };
    log::debug!("ssml-check {} targeting {}/{}", ENGINE_VERSION, config.platform, config.locale);
    let platform = config.platform;
    let checker = Checker::with_config(config);

    match cli.command {
        Commands::Tags => {
            let tags: Vec<_> = Tag::ALL
                .iter()
                .map(|tag| serde_json::json!({
                    "name": tag.as_str(),
                    "attributes": tag.allowed_attributes(platform),
                }))
                .collect();

            if print_json(&tags) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Check { input } => {
            let source = match read_input(&input) {
                Ok(s) => s,
                Err(e) => return fail(format!("Failed to read {}: {}", input, e)),
            };

            match checker.check_json(&source) {
                Ok((_, report)) => {
                    if !print_json(&report) {
                        return ExitCode::FAILURE;
                    }
                    if report.valid {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(2) // Blocked by violations
                    }
                }
                Err(e) => fail(e.to_string()),
            }
        }

        Commands::Fix { input } => {
            let source = match read_input(&input) {
                Ok(s) => s,
                Err(e) => return fail(format!("Failed to read {}: {}", input, e)),
            };

            match checker.check_json(&source) {
                Ok((document, report)) => {
                    let output = serde_json::json!({
                        "report": report,
                        "document": document,
                    });
                    if print_json(&output) {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => fail(e.to_string()),
            }
        }
    }
}
