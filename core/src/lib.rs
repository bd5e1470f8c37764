//! Command documentation model, validation and merging.
//!
//! This crate defines the structured representation of a documented command
//! and the algorithms that operate on it without touching any text:
//!
//! - [`CommandModel`]: one documented command (synopsis, syntax, parameters,
//!   examples, inputs/outputs, notes, related links).
//! - [`Parameter`], [`SyntaxSet`], [`Example`], [`TypedEntry`], [`Link`]:
//!   the entries of a model.
//! - [`CommandPackage`]: the ordered models of one module.
//!
//! Merging ([`merge_sources`]) combines models of the same command authored
//! for different sources into one canonical model plus an ordered
//! [`Diagnostic`] log. Updating ([`update_from_live`]) is a separate,
//! two-way policy that refreshes an authored model from a live command.
//!
//! Validation ([`validate_model`], [`validate_package`]) catches structural
//! errors such as duplicate parameters and dangling syntax members.
//!
//! # Example
//!
//! ```
//! use cmdoc_core::*;
//!
//! let mut first = CommandModel::new("Get-Foo");
//! first.synopsis.text = "Gets a foo.".into();
//! first.parameters.push(Parameter::new("Name").at_position(0));
//!
//! let mut second = first.clone();
//! second.parameters.push(Parameter::new("Remove"));
//!
//! let outcome = merge_sources(&[
//!     MergeSource::new("First", &first),
//!     MergeSource::new("Second", &second),
//! ]);
//! assert_eq!(outcome.model.synopsis.text, "Gets a foo.");
//! assert_eq!(outcome.model.parameters.len(), 2);
//! assert!(validate_model(&outcome.model).is_empty());
//! ```

mod diagnostics;
mod merge;
mod package;
mod types;
mod update;
mod validate;

pub use diagnostics::{Diagnostic, DiagnosticArea, Severity, render_change_report};
pub use merge::{MergeOutcome, MergeSource, merge_sources};
pub use package::CommandPackage;
pub use types::*;
pub use update::{AUTHORED_SOURCE, LIVE_SOURCE, update_from_live};
pub use validate::{ValidationError, validate_model, validate_package};
