//! Pipeline settings: defaults, TOML loading and validation.

use std::fs;
use std::path::Path;

use linesplit_diff::DEFAULT_WINDOW;
use linesplit_join::BoundaryNormalizer;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum number of lines per segment.
pub const DEFAULT_MAX_LINES: u64 = 6000;
/// Default number of files processed at once.
pub const DEFAULT_CONCURRENCY: usize = 2;
/// Default marker appended to a source path to name its working set.
pub const DEFAULT_SPLIT_MARKER: &str = "-split";

/// How audit findings map onto the process exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Only failed files produce a non-zero status.
    #[default]
    Lenient,
    /// Audit errors also produce a non-zero status.
    Strict,
}

/// Settings for a split-and-verify run.
///
/// Every field has a default, so a config file only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum lines per segment.
    pub max_lines: u64,
    /// Files processed concurrently.
    pub concurrency: usize,
    /// Suffix used to name working sets. Inputs containing it are skipped.
    pub split_marker: String,
    /// Audit lookahead, in lines per side.
    pub audit_window: usize,
    /// Join-point repair applied during reassembly.
    pub normalizer: BoundaryNormalizer,
    /// Echo every audit event through the log as it is recorded.
    pub echo_events: bool,
    pub exit_policy: ExitPolicy,
    /// Numbered working set names tried before giving up.
    pub max_working_set_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            concurrency: DEFAULT_CONCURRENCY,
            split_marker: DEFAULT_SPLIT_MARKER.to_string(),
            audit_window: DEFAULT_WINDOW,
            normalizer: BoundaryNormalizer::default(),
            echo_events: false,
            exit_policy: ExitPolicy::default(),
            max_working_set_attempts: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load a TOML config file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lines == 0 {
            return Err(ConfigError::Invalid("max_lines must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.split_marker.is_empty() {
            return Err(ConfigError::Invalid("split_marker must not be empty".into()));
        }
        if self.audit_window == 0 {
            return Err(ConfigError::Invalid("audit_window must be at least 1".into()));
        }
        if self.max_working_set_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_working_set_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_lines, 6000);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.split_marker, "-split");
        assert_eq!(config.normalizer, BoundaryNormalizer::CollapseDoubled);
        assert_eq!(config.exit_policy, ExitPolicy::Lenient);
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linesplit.toml");
        fs::write(
            &path,
            "max_lines = 3000\nnormalizer = \"verbatim\"\nexit_policy = \"strict\"\n",
        )
        .unwrap();

        let config = PipelineConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_lines, 3000);
        assert_eq!(config.normalizer, BoundaryNormalizer::Verbatim);
        assert_eq!(config.exit_policy, ExitPolicy::Strict);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linesplit.toml");
        fs::write(&path, "max_line = 10\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_toml_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_limit_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linesplit.toml");
        fs::write(&path, "max_lines = 0\n").unwrap();
        assert!(matches!(
            PipelineConfig::from_toml_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PipelineConfig::from_toml_file(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
