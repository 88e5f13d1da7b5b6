//! CLI entrypoint for the mockhard harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mockhard_core::structured_log::validate_log_file;
use mockhard_harness::{HarnessError, summarize_log_file};

/// Tooling for mockhard event logs.
#[derive(Debug, Parser)]
#[command(name = "mockhard-harness")]
#[command(about = "Validate and summarize mockhard verification logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check every line of a JSONL event log against the log contract.
    ValidateLog {
        /// Path to the JSONL log.
        #[arg(long)]
        log: PathBuf,
    },
    /// Fold the verification events of a log into a report.
    SummarizeLog {
        /// Path to the JSONL log.
        #[arg(long)]
        log: PathBuf,
        /// Report format.
        #[arg(long, value_enum, default_value = "markdown")]
        format: Format,
        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Report title.
        #[arg(long, default_value = "mockhard contract report")]
        title: String,
        /// Exit non-zero when any fake failed verification.
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::ValidateLog { log } => {
            let (line_count, errors) =
                validate_log_file(&log).map_err(|source| HarnessError::Io {
                    path: log.clone(),
                    source,
                })?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!(
                "Validated {}: lines={}, violations={}",
                log.display(),
                line_count,
                errors.len()
            );
            if !errors.is_empty() {
                return Err(format!("{} log contract violation(s)", errors.len()).into());
            }
        }
        Command::SummarizeLog {
            log,
            format,
            output,
            title,
            strict,
        } => {
            let report = summarize_log_file(&title, &log)?;
            let rendered = match format {
                Format::Markdown => report.to_markdown(),
                Format::Json => report.to_json(),
            };
            match output {
                Some(path) => {
                    eprintln!("Writing report to {}", path.display());
                    std::fs::write(&path, rendered)
                        .map_err(|source| HarnessError::Write { path, source })?;
                }
                None => println!("{rendered}"),
            }
            eprintln!(
                "Summary: total={}, passed={}, failed={}, digest={}",
                report.total,
                report.passed,
                report.failed,
                report.digest()
            );
            if strict && !report.all_passed() {
                return Err(format!("{} fake(s) failed verification", report.failed).into());
            }
        }
    }

    Ok(())
}
