//! Merge configuration for cmdoc.
//!
//! A [`MergeConfig`] lists the ordered sources of one command, the lexical
//! mode used to parse them, and the diagnostic severity that fails a run.
//! [`load_sources`] reads and parses those sources into command models.
//!
//! # Example
//!
//! ```
//! use cmdoc_config::{FailOn, MergeConfig};
//!
//! let yaml = r#"
//! version: "1.0"
//! sources:
//!   - id: windows
//!     path: windows/Get-Foo.md
//!   - id: linux
//!     path: linux/Get-Foo.md
//! "#;
//! let config: MergeConfig = serde_yaml::from_str(yaml).unwrap();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.fail_on, FailOn::Error);
//! ```

pub mod config;
pub mod error;
pub mod loader;

pub use config::{CONFIG_VERSION, FailOn, MergeConfig, SourceEntry};
pub use error::{ConfigError, Result};
pub use loader::{LoadedSource, load_source, load_sources, select_command};
