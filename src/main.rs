use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use markup_verifier::config::{Config, OutputFormat, VerificationConfig};
use markup_verifier::fileutil::{has_extension, list_matching_files};
use markup_verifier::{VerificationEngine, VerificationError, VerificationReport};

/// Findings were reported
const EXIT_FINDINGS: u8 = 1;
/// Configuration or I/O failure
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    // Parse configuration from command line
    let config = match Config::from_args_and_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    match run(&config) {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FINDINGS),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(config: &Config) -> Result<VerificationReport> {
    let rules = VerificationConfig::load(&config.config_path)?;
    log::info!(
        "Using verification config {} ({} verifier(s))",
        config.config_path.display(),
        rules.verifiers.len()
    );

    let engine = VerificationEngine::with_verifier_dirs(&rules, &config.verifier_dirs)
        .context("Failed to set up verifiers")?;

    let mut report = VerificationReport::new();
    for file in collect_targets(config)? {
        let errors = engine
            .verify_file(&file, &config.encoding)
            .with_context(|| format!("Failed to verify {}", file.display()))?;
        if config.format == OutputFormat::Text {
            print_errors(&errors);
        }
        report.add_file(errors);
    }

    match config.format {
        OutputFormat::Text => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(report)
}

/// Files named directly are always verified; directories are walked for the
/// configured extensions
fn collect_targets(config: &Config) -> Result<Vec<PathBuf>> {
    let accept = has_extension(&config.extensions);
    let mut files = Vec::new();

    for target in &config.targets {
        if target.is_file() {
            files.push(target.clone());
        } else {
            files.extend(list_matching_files(target, &accept)?);
        }
    }

    log::debug!("Found {} file(s) to verify", files.len());
    Ok(files)
}

fn print_errors(errors: &[VerificationError]) {
    for error in errors {
        println!("{error}");
        for line in error.offending_content().lines() {
            println!("    {line}");
        }
    }
}

fn print_summary(report: &VerificationReport) {
    if report.is_clean() {
        println!("Checked {} file(s): no findings", report.files_checked);
    } else {
        println!(
            "Checked {} file(s): {} finding(s) in {} file(s)",
            report.files_checked,
            report.errors.len(),
            report.files_with_errors()
        );
    }
}
