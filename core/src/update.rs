//! Two-way update of an authored model from a live command description.
//!
//! This is a separate policy from [`merge_sources`](crate::merge_sources).
//! The live model is reflected from the installed command, so its metadata
//! (types, positions, parameter sets) is authoritative, while the authored
//! model owns the prose.
//!
//! # Example
//!
//! ```
//! use cmdoc_core::*;
//!
//! let mut authored = CommandModel::new("Get-Foo");
//! authored.parameters.push(Parameter::new("Name").with_description("Foo name."));
//! authored.parameters.push(Parameter::new("Legacy"));
//!
//! let mut live = CommandModel::new("Get-Foo");
//! live.parameters.push(Parameter::new("Name").with_type("System.String").at_position(0));
//!
//! let outcome = update_from_live(&authored, &live);
//! let name = outcome.model.find_parameter("Name").unwrap();
//! assert_eq!(name.description, "Foo name.");
//! assert_eq!(name.position, Position::Index(0));
//! assert!(outcome.model.find_parameter("Legacy").is_none());
//! ```

use tracing::info;

use crate::diagnostics::{DiagnosticArea, DiagnosticLog};
use crate::{CommandModel, MergeOutcome, Parameter, TypedEntry};

/// Source label used for the authored side in diagnostics.
pub const AUTHORED_SOURCE: &str = "authored";
/// Source label used for the live side in diagnostics.
pub const LIVE_SOURCE: &str = "live";

/// Updates `authored` with metadata from `live`.
///
/// Live metadata overrides authored values; textual fields (descriptions,
/// default values, synopsis, examples, notes, links) stay authored unless
/// they are empty there.
pub fn update_from_live(authored: &CommandModel, live: &CommandModel) -> MergeOutcome {
    let mut log = DiagnosticLog::default();
    let mut model = authored.clone();
    info!(command = %authored.name, "Updating authored model from live command");

    if !live.name.is_empty() && !live.name.eq_ignore_ascii_case(&authored.name) {
        log.warn(
            DiagnosticArea::Name,
            format!(
                "live command is named '{}'; keeping authored name '{}'",
                live.name, authored.name
            ),
            &[LIVE_SOURCE],
        );
    }

    fill_text(&mut model.synopsis.text, &live.synopsis.text, DiagnosticArea::Synopsis, &mut log);
    fill_text(&mut model.description, &live.description, DiagnosticArea::Description, &mut log);
    fill_text(&mut model.notes, &live.notes, DiagnosticArea::Notes, &mut log);

    if model.examples.is_empty() && !live.examples.is_empty() {
        model.examples = live.examples.clone();
        log.info(
            DiagnosticArea::Examples,
            format!("{} example(s) taken from live command", live.examples.len()),
            &[LIVE_SOURCE],
        );
    }
    if model.links.is_empty() && !live.links.is_empty() {
        model.links = live.links.clone();
        log.info(
            DiagnosticArea::Links,
            format!("{} link(s) taken from live command", live.links.len()),
            &[LIVE_SOURCE],
        );
    }

    append_missing_types(&mut model.inputs, &live.inputs, DiagnosticArea::Inputs, &mut log);
    append_missing_types(&mut model.outputs, &live.outputs, DiagnosticArea::Outputs, &mut log);

    model.parameters = update_parameters(&authored.parameters, &live.parameters, &mut log);

    if model.syntax != live.syntax {
        log.info(
            DiagnosticArea::Syntax,
            format!("syntax replaced with {} set(s) from live command", live.syntax.len()),
            &[LIVE_SOURCE],
        );
        model.syntax = live.syntax.clone();
    }

    if model.is_workflow != live.is_workflow
        || model.supports_common_parameters != live.supports_common_parameters
    {
        log.info(
            DiagnosticArea::Flags,
            "workflow/common-parameter flags taken from live command".to_string(),
            &[LIVE_SOURCE],
        );
        model.is_workflow = live.is_workflow;
        model.supports_common_parameters = live.supports_common_parameters;
    }

    MergeOutcome {
        model,
        diagnostics: log.into_vec(),
    }
}

fn fill_text(target: &mut String, live: &str, area: DiagnosticArea, log: &mut DiagnosticLog) {
    if target.trim().is_empty() && !live.trim().is_empty() {
        *target = live.to_string();
        log.info(
            area,
            format!("{} taken from live command", area.to_string().to_lowercase()),
            &[LIVE_SOURCE],
        );
    }
}

fn append_missing_types(
    target: &mut Vec<TypedEntry>,
    live: &[TypedEntry],
    area: DiagnosticArea,
    log: &mut DiagnosticLog,
) {
    for entry in live {
        if !target
            .iter()
            .any(|t| t.type_name.eq_ignore_ascii_case(&entry.type_name))
        {
            log.info(
                area,
                format!("added type '{}' from live command", entry.type_name),
                &[LIVE_SOURCE],
            );
            target.push(entry.clone());
        }
    }
}

fn update_parameters(
    authored: &[Parameter],
    live: &[Parameter],
    log: &mut DiagnosticLog,
) -> Vec<Parameter> {
    let mut updated = Vec::with_capacity(live.len());

    for parameter in authored {
        let Some(live_parameter) = live.iter().find(|p| p.same_name(&parameter.name)) else {
            log.warn(
                DiagnosticArea::Parameters,
                format!("parameter '{}' no longer exists; dropped", parameter.name),
                &[AUTHORED_SOURCE],
            );
            continue;
        };

        let differences = parameter.metadata_differences(live_parameter);
        let mut merged = live_parameter.clone();
        merged.name = parameter.name.clone();
        merged.applicable = parameter.applicable.clone();
        if !parameter.description.trim().is_empty() {
            merged.description = parameter.description.clone();
        }
        if parameter.default_value.is_some() {
            merged.default_value = parameter.default_value.clone();
        }

        let metadata_changed: Vec<&str> = differences
            .into_iter()
            .filter(|field| *field != "default value")
            .collect();
        if !metadata_changed.is_empty() {
            log.info(
                DiagnosticArea::Parameters,
                format!(
                    "parameter '{}' updated from live command: {}",
                    parameter.name,
                    metadata_changed.join(", ")
                ),
                &[LIVE_SOURCE],
            );
        }
        updated.push(merged);
    }

    for parameter in live {
        if !authored.iter().any(|p| p.same_name(&parameter.name)) {
            log.info(
                DiagnosticArea::Parameters,
                format!("parameter '{}' added from live command", parameter.name),
                &[LIVE_SOURCE],
            );
            updated.push(parameter.clone());
        }
    }

    updated
}
