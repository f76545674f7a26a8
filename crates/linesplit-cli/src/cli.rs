use std::path::PathBuf;

use clap::Parser;
use linesplit_pipeline::{BoundaryNormalizer, ExitPolicy, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "linesplit",
    about = "Split text files into line-bounded segments and verify the reassembly",
    version
)]
pub struct Cli {
    /// Files, directories or glob patterns to split
    #[arg(required = true, value_name = "SRC")]
    pub inputs: Vec<String>,

    /// Maximum lines per segment [default: 6000]
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub lines: Option<u64>,

    /// Echo every audit event and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Files processed at once [default: 2]
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Exit with status 3 when any audit finds errors
    #[arg(long)]
    pub strict: bool,

    /// Reassemble segments byte for byte, without join-point repair
    #[arg(long)]
    pub no_normalize: bool,

    /// Audit lookahead in lines per side [default: 512]
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Summary output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with pipeline settings; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Layer the command-line flags over `base`.
    pub fn apply(&self, mut base: PipelineConfig) -> PipelineConfig {
        if let Some(lines) = self.lines {
            base.max_lines = lines;
        }
        if let Some(jobs) = self.jobs {
            base.concurrency = jobs;
        }
        if let Some(window) = self.window {
            base.audit_window = window;
        }
        if self.verbose {
            base.echo_events = true;
        }
        if self.strict {
            base.exit_policy = ExitPolicy::Strict;
        }
        if self.no_normalize {
            base.normalizer = BoundaryNormalizer::Verbatim;
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults() {
        let cli = Cli::try_parse_from(["linesplit", "big.txt"]).unwrap();
        assert_eq!(cli.inputs, vec!["big.txt"]);
        assert_eq!(cli.lines, None);
        assert!(!cli.verbose);
        assert_eq!(cli.format, OutputFormat::Text);

        let config = cli.apply(PipelineConfig::default());
        assert_eq!(config.max_lines, 6000);
        assert!(!config.echo_events);
    }

    #[test]
    fn parse_lines_and_verbose() {
        let cli = Cli::try_parse_from(["linesplit", "-l", "3000", "-v", "a.txt", "b/*.log"]).unwrap();
        assert_eq!(cli.lines, Some(3000));
        assert!(cli.verbose);
        assert_eq!(cli.inputs, vec!["a.txt", "b/*.log"]);

        let config = cli.apply(PipelineConfig::default());
        assert_eq!(config.max_lines, 3000);
        assert!(config.echo_events);
    }

    #[test]
    fn parse_long_flags() {
        let cli = Cli::try_parse_from([
            "linesplit",
            "--lines",
            "10",
            "--jobs",
            "4",
            "--strict",
            "--no-normalize",
            "--window",
            "64",
            "--format",
            "json",
            "x",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);

        let config = cli.apply(PipelineConfig::default());
        assert_eq!(config.max_lines, 10);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.audit_window, 64);
        assert_eq!(config.exit_policy, ExitPolicy::Strict);
        assert_eq!(config.normalizer, BoundaryNormalizer::Verbatim);
    }

    #[test]
    fn flags_override_config_values() {
        let base = PipelineConfig {
            max_lines: 50,
            concurrency: 8,
            ..PipelineConfig::default()
        };
        let cli = Cli::try_parse_from(["linesplit", "-l", "7", "x"]).unwrap();
        let config = cli.apply(base);
        assert_eq!(config.max_lines, 7);
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn zero_lines_rejected() {
        assert!(Cli::try_parse_from(["linesplit", "-l", "0", "x"]).is_err());
    }

    #[test]
    fn inputs_required() {
        assert!(Cli::try_parse_from(["linesplit"]).is_err());
        assert!(Cli::try_parse_from(["linesplit", "-v"]).is_err());
    }

    #[test]
    fn help_is_available() {
        let err = Cli::try_parse_from(["linesplit", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
