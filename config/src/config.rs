//! Merge configuration.
//!
//! Names the ordered sources of one command and how to treat them.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! command: Get-Foo
//! mode: full
//! fail_on: error
//! sources:
//!   - id: windows
//!     path: windows/Get-Foo.md
//!   - id: linux
//!     path: linux/Get-Foo.md
//! ```

use std::collections::HashSet;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use cmdoc_core::Severity;
use cmdoc_markdown::LexicalMode;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Configuration format version written by [`MergeConfig::new`].
pub const CONFIG_VERSION: &str = "1.0";

/// Diagnostic severity at which a merge run is reported as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    #[default]
    Error,
    Warning,
    Never,
}

impl FailOn {
    /// Returns `true` when a log whose worst entry is `worst` should fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdoc_config::FailOn;
    /// use cmdoc_core::Severity;
    ///
    /// assert!(FailOn::Warning.is_reached(Some(Severity::Error)));
    /// assert!(!FailOn::Error.is_reached(Some(Severity::Warning)));
    /// assert!(!FailOn::Never.is_reached(Some(Severity::Error)));
    /// assert!(!FailOn::Error.is_reached(None));
    /// ```
    pub fn is_reached(self, worst: Option<Severity>) -> bool {
        let threshold = match self {
            Self::Error => Severity::Error,
            Self::Warning => Severity::Warning,
            Self::Never => return false,
        };
        worst.is_some_and(|severity| severity >= threshold)
    }
}

/// One named input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Identifier recorded in `applicable` lists and diagnostics.
    pub id: String,
    /// Markdown file, relative to the configuration file.
    pub path: PathBuf,
}

impl SourceEntry {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Parses an `ID=PATH` pair as given on the command line.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdoc_config::SourceEntry;
    ///
    /// let entry = SourceEntry::parse_pair("linux=docs/linux/Get-Foo.md").unwrap();
    /// assert_eq!(entry.id, "linux");
    /// assert!(SourceEntry::parse_pair("no-separator").is_err());
    /// ```
    pub fn parse_pair(pair: &str) -> Result<Self> {
        match pair.split_once('=') {
            Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => {
                Ok(Self::new(id.trim(), path.trim()))
            }
            _ => Err(ConfigError::InvalidConfig(format!(
                "expected ID=PATH, got '{pair}'"
            ))),
        }
    }
}

/// Top-level merge configuration.
///
/// # Examples
///
/// ```no_run
/// use cmdoc_config::MergeConfig;
///
/// let config = MergeConfig::load("cmdoc.yml").unwrap();
/// for source in &config.sources {
///     println!("{} -> {}", source.id, config.resolve(&source.path).display());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Command to select from multi-command source files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Lexical mode used to parse every source.
    #[serde(default)]
    pub mode: LexicalMode,
    #[serde(default)]
    pub fail_on: FailOn,
    /// Sources in merge order.
    pub sources: Vec<SourceEntry>,
    /// Directory relative source paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl MergeConfig {
    /// Creates a configuration for `sources` with default settings.
    pub fn new(sources: Vec<SourceEntry>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            command: None,
            mode: LexicalMode::default(),
            fail_on: FailOn::default(),
            sources,
            base_dir: None,
        }
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// Relative source paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// [`YamlError`](ConfigError::YamlError) if parsing fails, or
    /// [`InvalidConfig`](ConfigError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the version and the source list.
    pub fn validate(&self) -> Result<()> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major.trim() != "1" {
            return Err(ConfigError::InvalidConfig(format!(
                "unsupported version '{}'",
                self.version
            )));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "at least one source is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            let id = source.id.trim();
            if id.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "source id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(id) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate source id '{id}'"
                )));
            }
        }
        Ok(())
    }

    /// Resolves a source path against [`base_dir`](Self::base_dir).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
command: Get-Foo
mode: formatting_preserve
fail_on: warning
sources:
  - id: windows
    path: windows/Get-Foo.md
  - id: linux
    path: /abs/linux/Get-Foo.md
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: MergeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.command.as_deref(), Some("Get-Foo"));
        assert_eq!(config.mode, LexicalMode::FormattingPreserve);
        assert_eq!(config.fail_on, FailOn::Warning);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0], SourceEntry::new("windows", "windows/Get-Foo.md"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let yaml = "version: \"1.0\"\nsources:\n  - id: a\n    path: a.md\n";
        let config: MergeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mode, LexicalMode::Full);
        assert_eq!(config.fail_on, FailOn::Error);
        assert_eq!(config.command, None);
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let config = MergeConfig::new(vec![
            SourceEntry::new("a", "a.md"),
            SourceEntry::new("a", "b.md"),
        ]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate source id 'a'"));
    }

    #[test]
    fn test_validate_rejects_empty_sources_and_ids() {
        assert!(MergeConfig::new(Vec::new()).validate().is_err());
        assert!(
            MergeConfig::new(vec![SourceEntry::new(" ", "a.md")])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_rejects_unsupported_version() {
        let mut config = MergeConfig::new(vec![SourceEntry::new("a", "a.md")]);
        config.version = "2.0".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported version '2.0'"));
    }

    #[test]
    fn test_resolve_relative_and_absolute_paths() {
        let mut config: MergeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        config.base_dir = Some(PathBuf::from("/work/docs"));
        assert_eq!(
            config.resolve(&config.sources[0].path),
            PathBuf::from("/work/docs/windows/Get-Foo.md")
        );
        assert_eq!(
            config.resolve(&config.sources[1].path),
            PathBuf::from("/abs/linux/Get-Foo.md")
        );
    }

    #[test]
    fn test_fail_on_thresholds() {
        assert!(FailOn::Error.is_reached(Some(Severity::Error)));
        assert!(FailOn::Warning.is_reached(Some(Severity::Warning)));
        assert!(!FailOn::Warning.is_reached(Some(Severity::Information)));
    }
}
