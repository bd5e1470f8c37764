//! Merge diagnostics and the human-readable change report.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Severity of one diagnostic, ordered `Information < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Information => write!(f, "information"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Model section a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticArea {
    Sources,
    Name,
    Metadata,
    Synopsis,
    Description,
    Notes,
    Links,
    Examples,
    Inputs,
    Outputs,
    Parameters,
    Syntax,
    Flags,
}

impl fmt::Display for DiagnosticArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Sources => "Sources",
            Self::Name => "Name",
            Self::Metadata => "Metadata",
            Self::Synopsis => "Synopsis",
            Self::Description => "Description",
            Self::Notes => "Notes",
            Self::Links => "Related Links",
            Self::Examples => "Examples",
            Self::Inputs => "Inputs",
            Self::Outputs => "Outputs",
            Self::Parameters => "Parameters",
            Self::Syntax => "Syntax",
            Self::Flags => "Flags",
        };
        write!(f, "{label}")
    }
}

/// One merge decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub area: DiagnosticArea,
    pub message: String,
    /// Source identifiers involved in the decision, in input order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.area, self.message)?;
        if !self.sources.is_empty() {
            write!(f, " ({})", self.sources.join(", "))?;
        }
        Ok(())
    }
}

/// Append-only diagnostic accumulator shared by the merge policies.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub(crate) fn push(
        &mut self,
        severity: Severity,
        area: DiagnosticArea,
        message: String,
        sources: &[&str],
    ) {
        debug!(%severity, %area, %message, "Merge decision");
        self.entries.push(Diagnostic {
            severity,
            area,
            message,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub(crate) fn info(&mut self, area: DiagnosticArea, message: String, sources: &[&str]) {
        self.push(Severity::Information, area, message, sources);
    }

    pub(crate) fn warn(&mut self, area: DiagnosticArea, message: String, sources: &[&str]) {
        self.push(Severity::Warning, area, message, sources);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Renders diagnostics as a deterministic Markdown change report.
///
/// Diagnostics are grouped by area in order of first appearance; within an
/// area they keep log order.
///
/// # Examples
///
/// ```
/// use cmdoc_core::{Diagnostic, DiagnosticArea, Severity, render_change_report};
///
/// let diagnostics = vec![Diagnostic {
///     severity: Severity::Warning,
///     area: DiagnosticArea::Synopsis,
///     message: "synopsis differs across sources".into(),
///     sources: vec!["linux".into(), "windows".into()],
/// }];
/// let report = render_change_report("Get-Foo", &diagnostics);
/// assert!(report.starts_with("# Merge report: Get-Foo"));
/// assert!(report.contains("- [warning] synopsis differs across sources (linux, windows)"));
/// ```
pub fn render_change_report(command: &str, diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("# Merge report: {command}\n");

    if diagnostics.is_empty() {
        out.push_str("\nNo merge decisions were recorded.\n");
        return out;
    }

    let mut areas: Vec<DiagnosticArea> = Vec::new();
    for diagnostic in diagnostics {
        if !areas.contains(&diagnostic.area) {
            areas.push(diagnostic.area);
        }
    }

    for area in areas {
        out.push_str(&format!("\n## {area}\n\n"));
        for diagnostic in diagnostics.iter().filter(|d| d.area == area) {
            out.push_str(&format!("- [{}] {}", diagnostic.severity, diagnostic.message));
            if !diagnostic.sources.is_empty() {
                out.push_str(&format!(" ({})", diagnostic.sources.join(", ")));
            }
            out.push('\n');
        }
    }

    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    out.push_str(&format!(
        "\n{} decision(s), {warnings} warning(s), {errors} error(s).\n",
        diagnostics.len()
    ));

    out
}
