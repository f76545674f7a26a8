use anyhow::Context;
use colored::Colorize;
use linesplit_pipeline::{
    run_batch, BatchReport, FileReport, FileState, PipelineConfig, EXIT_USAGE,
};

use crate::cli::{Cli, OutputFormat};
use crate::inputs;

/// Run the batch described by `cli` and return the process exit status.
pub async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return Ok(EXIT_USAGE);
        }
    };

    let resolved = inputs::resolve(&cli.inputs, &config.split_marker)?;
    for path in &resolved.skipped {
        tracing::info!(path = %path.display(), "skipped: already a split artifact");
    }
    if resolved.files.is_empty() {
        eprintln!("{} no input files to process", "error:".red().bold());
        return Ok(EXIT_USAGE);
    }

    let policy = config.exit_policy;
    let batch = run_batch(resolved.files, config).await;

    match cli.format {
        OutputFormat::Text => print_text(&batch),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&batch).context("cannot encode batch report")?;
            println!("{json}");
        }
    }
    Ok(batch.exit_code(policy))
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let base = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    let config = cli.apply(base);
    config.validate()?;
    Ok(config)
}

fn print_text(batch: &BatchReport) {
    for report in &batch.reports {
        println!("{}", file_line(report));
    }

    let summary = batch.summary();
    println!();
    println!(
        "{} {} files: {} reported, {} failed, {} with audit errors ({} segments, {} errors)",
        "Batch:".bold(),
        summary.files,
        summary.reported.to_string().green(),
        colored_count(summary.failed, |s| s.red()),
        colored_count(summary.with_mismatches, |s| s.yellow()),
        summary.segments,
        summary.errors,
    );

    let failed: Vec<&FileReport> = batch.failed().collect();
    if !failed.is_empty() {
        println!("{}", "Failed:".red().bold());
        for report in failed {
            println!("  {}", report.source.display());
        }
    }
    let mismatched: Vec<&FileReport> = batch.with_mismatches().collect();
    if !mismatched.is_empty() {
        println!("{}", "Audit errors:".yellow().bold());
        for report in mismatched {
            println!(
                "  {} ({} errors, see {})",
                report.source.display(),
                report.error_count(),
                report
                    .audit_log()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
        }
    }
}

fn file_line(report: &FileReport) -> String {
    let source = report.source.display().to_string();
    match report.state {
        FileState::Failed => {
            let (stage, message) = report
                .failure
                .as_ref()
                .map(|f| (f.stage.to_string(), f.message.as_str()))
                .unwrap_or_default();
            format!(
                "{} {} failed during {}: {}",
                "✗".red().bold(),
                source.bold(),
                stage,
                message
            )
        }
        _ => {
            let marker = if report.has_mismatches() {
                "!".yellow().bold()
            } else {
                "✓".green().bold()
            };
            let errors = report.error_count();
            let errors = if errors > 0 {
                errors.to_string().yellow()
            } else {
                errors.to_string().green()
            };
            format!(
                "{} {} -> {} segments, {} errors, audit log {}",
                marker,
                source.bold(),
                report.segments.len(),
                errors,
                report
                    .audit_log()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
                    .cyan()
            )
        }
    }
}

fn colored_count(count: usize, paint: impl Fn(String) -> colored::ColoredString) -> String {
    if count > 0 {
        paint(count.to_string()).to_string()
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use linesplit_pipeline::{FileFailure, EXIT_FAILED, EXIT_OK};
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["linesplit"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn splits_and_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        fs::write(&src, "a\nb\nc\n").unwrap();

        let code = run(cli(&["-l", "2", src.to_str().unwrap()])).await.unwrap();
        assert_eq!(code, EXIT_OK);
        assert!(dir.path().join("in.txt-split").join("file-00001").is_file());
    }

    #[tokio::test]
    async fn missing_file_exits_failed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").join("in.txt");
        let code = run(cli(&[missing.to_str().unwrap()])).await.unwrap();
        assert_eq!(code, EXIT_FAILED);
    }

    #[tokio::test]
    async fn no_inputs_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("*.none");
        let code = run(cli(&[pattern.to_str().unwrap()])).await.unwrap();
        assert_eq!(code, EXIT_USAGE);
    }

    #[tokio::test]
    async fn bad_config_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bad.toml");
        fs::write(&config, "max_lines = \"lots\"\n").unwrap();
        let code = run(cli(&["-c", config.to_str().unwrap(), "x"])).await.unwrap();
        assert_eq!(code, EXIT_USAGE);
    }

    #[test]
    fn file_line_names_failed_stage() {
        colored::control::set_override(false);
        let mut report = FileReport::new("in.txt", 10);
        report.state = FileState::Failed;
        report.failure = Some(FileFailure {
            stage: FileState::Splitting,
            message: "disk full".into(),
        });
        assert_eq!(file_line(&report), "✗ in.txt failed during SPLITTING: disk full");
    }
}
