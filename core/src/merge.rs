//! N-way merging of command models authored for different sources.
//!
//! When the same command is documented several times (per platform, per
//! locale, per product version), [`merge_sources`] combines the models into
//! one canonical [`CommandModel`] and records every decision in an ordered
//! diagnostic log. The merge never fails: conflicts are resolved by a
//! first-seen-wins policy and reported as diagnostics.
//!
//! Source order is an input to the algorithm. It decides group labels and
//! which shape wins a conflict, so the same ordered input always produces
//! the same output while a reordered input may not.
//!
//! # Example
//!
//! ```
//! use cmdoc_core::*;
//!
//! let mut linux = CommandModel::new("Get-Foo");
//! linux.parameters.push(Parameter::new("Name"));
//!
//! let mut windows = CommandModel::new("Get-Foo");
//! windows.parameters.push(Parameter::new("Name"));
//! windows.parameters.push(Parameter::new("Credential"));
//!
//! let outcome = merge_sources(&[
//!     MergeSource::new("linux", &linux),
//!     MergeSource::new("windows", &windows),
//! ]);
//!
//! let credential = outcome.model.find_parameter("Credential").unwrap();
//! assert_eq!(credential.applicable, vec!["windows"]);
//! assert_eq!(outcome.model.find_parameter("Name").unwrap().applicable, vec!["linux", "windows"]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::diagnostics::{
    Diagnostic, DiagnosticArea, DiagnosticLog, Severity, render_change_report,
};
use crate::{CommandModel, Example, Link, Metadata, Parameter, Synopsis, SyntaxSet, TypedEntry};

/// Fields compared by [`Parameter::metadata_eq`], as named by
/// [`Parameter::metadata_differences`].
const METADATA_FIELDS: [&str; 4] = ["required", "position", "pipeline input", "globbing"];

/// One input to [`merge_sources`]: a source identifier and its model.
#[derive(Debug, Clone, Copy)]
pub struct MergeSource<'a> {
    pub id: &'a str,
    pub model: &'a CommandModel,
}

impl<'a> MergeSource<'a> {
    pub fn new(id: &'a str, model: &'a CommandModel) -> Self {
        Self { id, model }
    }
}

/// Canonical model plus the ordered log of merge decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub model: CommandModel,
    pub diagnostics: Vec<Diagnostic>,
}

impl MergeOutcome {
    /// Highest severity in the log, if any diagnostic was emitted.
    pub fn max_severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }

    pub fn has_errors(&self) -> bool {
        self.max_severity() == Some(Severity::Error)
    }

    /// Renders the diagnostic log as a Markdown change report.
    pub fn report(&self) -> String {
        render_change_report(&self.model.name, &self.diagnostics)
    }
}

/// Merges an ordered list of source models into one canonical model.
///
/// An empty input yields an empty model and a single error diagnostic.
/// Merging a single source returns that source's model with every parameter
/// and syntax set tagged with the source identifier.
pub fn merge_sources(sources: &[MergeSource<'_>]) -> MergeOutcome {
    let mut log = DiagnosticLog::default();

    let Some(first) = sources.first() else {
        log.push(
            Severity::Error,
            DiagnosticArea::Sources,
            "no sources to merge".to_string(),
            &[],
        );
        return MergeOutcome {
            model: CommandModel::default(),
            diagnostics: log.into_vec(),
        };
    };

    let ids: Vec<&str> = sources.iter().map(|s| s.id).collect();
    info!(command = %first.model.name, sources = ?ids, "Merging command models");

    let mut model = CommandModel::new(&merge_name(sources, &mut log));
    model.metadata = merge_metadata(sources, &mut log);
    model.synopsis = Synopsis {
        text: merge_grouped_text(
            sources,
            DiagnosticArea::Synopsis,
            |m| m.synopsis.text.as_str(),
            &mut log,
        ),
        blank_line_after: first.model.synopsis.blank_line_after,
    };
    model.description = merge_description(sources, &mut log);
    model.notes = merge_grouped_text(sources, DiagnosticArea::Notes, |m| m.notes.as_str(), &mut log);
    model.links = merge_links(sources, &mut log);
    model.examples = merge_examples(sources, &mut log);
    model.inputs = merge_typed_entries(sources, DiagnosticArea::Inputs, |m| &m.inputs, &mut log);
    model.outputs = merge_typed_entries(sources, DiagnosticArea::Outputs, |m| &m.outputs, &mut log);
    model.parameters = merge_parameters(sources, &mut log);
    model.syntax = merge_syntax(sources, &mut log);
    merge_flags(sources, &mut model, &mut log);
    model.formatting = first.model.formatting.clone();

    MergeOutcome {
        model,
        diagnostics: log.into_vec(),
    }
}

fn push_unique<'a>(list: &mut Vec<&'a str>, value: &'a str) {
    if !list.contains(&value) {
        list.push(value);
    }
}

fn merge_name(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> String {
    let name = sources[0].model.name.clone();
    let differing: Vec<&str> = sources
        .iter()
        .filter(|s| !s.model.name.eq_ignore_ascii_case(&name))
        .map(|s| s.id)
        .collect();
    if !differing.is_empty() {
        log.warn(
            DiagnosticArea::Name,
            format!("command name differs in some sources; using '{name}'"),
            &differing,
        );
    }
    name
}

fn merge_metadata(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> Metadata {
    let mut metadata = sources[0].model.metadata.clone();
    let mut added = 0usize;
    let mut contributors = Vec::new();

    for source in &sources[1..] {
        for (key, value) in source.model.metadata.iter() {
            if !metadata.contains_key(key) {
                metadata.insert(key, value);
                added += 1;
                push_unique(&mut contributors, source.id);
            }
        }
    }

    if added > 0 {
        log.info(
            DiagnosticArea::Metadata,
            format!("{added} header key(s) added from later sources"),
            &contributors,
        );
    }
    metadata
}

struct TextGroup<'a> {
    text: &'a str,
    sources: Vec<&'a str>,
}

fn group_text<'a, F>(sources: &[MergeSource<'a>], field: F) -> Vec<TextGroup<'a>>
where
    F: Fn(&'a CommandModel) -> &'a str,
{
    let mut groups: Vec<TextGroup<'a>> = Vec::new();
    for source in sources {
        let text = field(source.model);
        if text.trim().is_empty() {
            continue;
        }
        match groups.iter_mut().find(|g| g.text == text) {
            Some(group) => push_unique(&mut group.sources, source.id),
            None => groups.push(TextGroup {
                text,
                sources: vec![source.id],
            }),
        }
    }
    groups
}

/// Groups byte-identical values and labels each group with its sources when
/// more than one variant exists.
fn merge_grouped_text<'a, F>(
    sources: &[MergeSource<'a>],
    area: DiagnosticArea,
    field: F,
    log: &mut DiagnosticLog,
) -> String
where
    F: Fn(&'a CommandModel) -> &'a str + Copy,
{
    let section = area.to_string().to_lowercase();
    let groups = group_text(sources, field);
    let missing: Vec<&str> = sources
        .iter()
        .filter(|s| field(s.model).trim().is_empty())
        .map(|s| s.id)
        .collect();

    match groups.as_slice() {
        [] => {
            log.info(area, format!("no source documents the {section}"), &[]);
            String::new()
        }
        [group] => {
            let message = if missing.is_empty() {
                format!("{section} identical across sources")
            } else {
                format!("{section} taken from sources that document it; missing in {}", missing.join(", "))
            };
            log.info(area, message, &group.sources);
            group.text.to_string()
        }
        _ => {
            let contributors: Vec<&str> = groups
                .iter()
                .flat_map(|g| g.sources.iter().copied())
                .collect();
            log.warn(
                area,
                format!("{} {section} variants kept, labeled by source", groups.len()),
                &contributors,
            );
            groups
                .iter()
                .map(|g| format!("{}: {}", g.sources.join(", "), g.text))
                .collect::<Vec<_>>()
                .join("\n\n")
        }
    }
}

/// Takes the description of the first source that has a non-empty one.
///
/// This is not always the first source's value: an empty description never
/// wins, even when it comes first.
fn merge_description(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> String {
    let chosen = sources
        .iter()
        .find(|s| !s.model.description.trim().is_empty());

    let Some(chosen) = chosen else {
        log.info(
            DiagnosticArea::Description,
            "no source documents the description".to_string(),
            &[],
        );
        return String::new();
    };

    let divergent: Vec<&str> = sources
        .iter()
        .filter(|s| {
            !s.model.description.trim().is_empty() && s.model.description != chosen.model.description
        })
        .map(|s| s.id)
        .collect();

    if divergent.is_empty() {
        log.info(
            DiagnosticArea::Description,
            format!("description taken from {}", chosen.id),
            &[chosen.id],
        );
    } else {
        log.warn(
            DiagnosticArea::Description,
            format!(
                "description differs in {}; kept value from {}",
                divergent.join(", "),
                chosen.id
            ),
            &divergent,
        );
    }
    chosen.model.description.clone()
}

fn merge_links(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> Vec<Link> {
    let mut merged: Vec<(&Link, Vec<&str>)> = Vec::new();
    for source in sources {
        for link in &source.model.links {
            match merged.iter_mut().find(|(existing, _)| *existing == link) {
                Some((_, ids)) => push_unique(ids, source.id),
                None => merged.push((link, vec![source.id])),
            }
        }
    }

    merged
        .into_iter()
        .map(|(link, ids)| {
            log.info(DiagnosticArea::Links, format!("kept link {link}"), &ids);
            link.clone()
        })
        .collect()
}

fn merge_examples(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> Vec<Example> {
    let mut groups: Vec<(&Example, Vec<&str>)> = Vec::new();
    for source in sources {
        for example in &source.model.examples {
            match groups
                .iter_mut()
                .find(|(existing, _)| existing.same_content(example))
            {
                Some((_, ids)) => push_unique(ids, source.id),
                None => groups.push((example, vec![source.id])),
            }
        }
    }

    // A title is divergent when another group from a different source set
    // reuses it with different code or remarks.
    let divergent: Vec<bool> = groups
        .iter()
        .map(|(example, ids)| {
            groups
                .iter()
                .any(|(other, other_ids)| other.title == example.title && other_ids != ids)
        })
        .collect();

    let mut merged = Vec::with_capacity(groups.len());
    for ((example, ids), _) in groups.iter().zip(&divergent).filter(|(_, d)| !**d) {
        log.info(
            DiagnosticArea::Examples,
            format!("kept example '{}'", example.title),
            ids,
        );
        merged.push((*example).clone());
    }
    for ((example, ids), _) in groups.iter().zip(&divergent).filter(|(_, d)| **d) {
        let mut renamed = (*example).clone();
        renamed.title = format!("{} ({})", example.title, ids.join(", "));
        log.warn(
            DiagnosticArea::Examples,
            format!(
                "example '{}' differs across sources; kept as '{}'",
                example.title, renamed.title
            ),
            ids,
        );
        merged.push(renamed);
    }
    merged
}

fn merge_typed_entries<'a, F>(
    sources: &[MergeSource<'a>],
    area: DiagnosticArea,
    field: F,
    log: &mut DiagnosticLog,
) -> Vec<TypedEntry>
where
    F: Fn(&'a CommandModel) -> &'a Vec<TypedEntry>,
{
    let kind = if area == DiagnosticArea::Inputs {
        "input"
    } else {
        "output"
    };

    let mut merged: Vec<(TypedEntry, Vec<&str>, bool)> = Vec::new();
    for source in sources {
        for entry in field(source.model) {
            match merged
                .iter_mut()
                .find(|(existing, _, _)| existing.type_name.eq_ignore_ascii_case(&entry.type_name))
            {
                Some((existing, ids, conflict)) => {
                    push_unique(ids, source.id);
                    if existing.description.trim().is_empty() {
                        existing.description = entry.description.clone();
                    } else if !entry.description.trim().is_empty()
                        && existing.description != entry.description
                    {
                        *conflict = true;
                    }
                }
                None => merged.push((entry.clone(), vec![source.id], false)),
            }
        }
    }

    merged
        .into_iter()
        .map(|(entry, ids, conflict)| {
            if conflict {
                log.warn(
                    area,
                    format!(
                        "{kind} type '{}' has differing descriptions; kept first non-empty",
                        entry.type_name
                    ),
                    &ids,
                );
            } else {
                log.info(area, format!("kept {kind} type '{}'", entry.type_name), &ids);
            }
            entry
        })
        .collect()
}

fn merge_parameters(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> Vec<Parameter> {
    let mut groups: Vec<Vec<(&str, &Parameter)>> = Vec::new();
    for source in sources {
        for parameter in &source.model.parameters {
            match groups
                .iter_mut()
                .find(|group| group[0].1.same_name(&parameter.name))
            {
                Some(group) => group.push((source.id, parameter)),
                None => groups.push(vec![(source.id, parameter)]),
            }
        }
    }

    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        let (first_id, first) = group[0];
        let mut canonical = first.clone();
        canonical.applicable.clear();

        let mut metadata_fields: Vec<&str> = Vec::new();
        let mut other_fields: Vec<&str> = Vec::new();
        let mut conflicting: Vec<&str> = Vec::new();

        for (id, parameter) in &group {
            canonical.add_applicable(id);
            if canonical.description.trim().is_empty() && !parameter.description.trim().is_empty() {
                canonical.description = parameter.description.clone();
            }
            for field in first.metadata_differences(parameter) {
                push_unique(&mut conflicting, id);
                if METADATA_FIELDS.contains(&field) {
                    push_unique(&mut metadata_fields, field);
                } else {
                    push_unique(&mut other_fields, field);
                }
            }
        }

        let applicable: Vec<&str> = canonical.applicable.iter().map(String::as_str).collect();
        if !metadata_fields.is_empty() {
            let mut fields = metadata_fields;
            fields.extend(other_fields);
            log.warn(
                DiagnosticArea::Parameters,
                format!(
                    "parameter '{}' differs in {} between {first_id} and {}; kept shape from {first_id}",
                    canonical.name,
                    fields.join(", "),
                    conflicting.join(", ")
                ),
                &applicable,
            );
        } else if !other_fields.is_empty() {
            log.info(
                DiagnosticArea::Parameters,
                format!(
                    "parameter '{}' differs in {} between {first_id} and {}; kept shape from {first_id}",
                    canonical.name,
                    other_fields.join(", "),
                    conflicting.join(", ")
                ),
                &applicable,
            );
        } else {
            log.info(
                DiagnosticArea::Parameters,
                format!("parameter '{}' applies to {}", canonical.name, applicable.join(", ")),
                &applicable,
            );
        }

        merged.push(canonical);
    }
    merged
}

#[derive(Debug, PartialEq, Eq)]
enum SyntaxKey {
    Named(String),
    /// Default sets are identified by their sorted membership.
    Unnamed(Vec<String>),
}

fn sorted_members(set: &SyntaxSet) -> Vec<String> {
    let mut members: Vec<String> = set
        .parameters
        .iter()
        .map(|p| p.name.to_ascii_lowercase())
        .collect();
    members.sort();
    members
}

fn syntax_key(set: &SyntaxSet) -> SyntaxKey {
    match &set.name {
        Some(name) => SyntaxKey::Named(name.to_ascii_lowercase()),
        None => SyntaxKey::Unnamed(sorted_members(set)),
    }
}

struct SyntaxGroup {
    key: SyntaxKey,
    first_members: Vec<String>,
    merged: SyntaxSet,
    membership_differs: bool,
}

fn merge_syntax(sources: &[MergeSource<'_>], log: &mut DiagnosticLog) -> Vec<SyntaxSet> {
    let mut groups: Vec<SyntaxGroup> = Vec::new();
    for source in sources {
        for set in &source.model.syntax {
            let key = syntax_key(set);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => {
                    if sorted_members(set) != group.first_members {
                        group.membership_differs = true;
                    }
                    for member in &set.parameters {
                        if group.merged.find_member(&member.name).is_none() {
                            group.merged.parameters.push(member.clone());
                        }
                    }
                    group.merged.add_applicable(source.id);
                }
                None => {
                    let mut merged = set.clone();
                    merged.applicable.clear();
                    merged.add_applicable(source.id);
                    groups.push(SyntaxGroup {
                        key,
                        first_members: sorted_members(set),
                        merged,
                        membership_differs: false,
                    });
                }
            }
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let set = group.merged;
            let applicable: Vec<&str> = set.applicable.iter().map(String::as_str).collect();
            if group.membership_differs {
                log.warn(
                    DiagnosticArea::Syntax,
                    format!(
                        "syntax set '{}' membership differs across sources; merged members: {}",
                        set.label(),
                        set.member_names().join(", ")
                    ),
                    &applicable,
                );
            } else {
                log.info(
                    DiagnosticArea::Syntax,
                    format!("kept syntax set '{}'", set.label()),
                    &applicable,
                );
            }
            set
        })
        .collect()
}

fn merge_flags(sources: &[MergeSource<'_>], model: &mut CommandModel, log: &mut DiagnosticLog) {
    let first = sources[0].model;
    model.is_workflow = first.is_workflow;
    model.supports_common_parameters = first.supports_common_parameters;

    let differing: Vec<&str> = sources
        .iter()
        .filter(|s| {
            s.model.is_workflow != first.is_workflow
                || s.model.supports_common_parameters != first.supports_common_parameters
        })
        .map(|s| s.id)
        .collect();
    if !differing.is_empty() {
        log.warn(
            DiagnosticArea::Flags,
            format!(
                "workflow/common-parameter flags differ; kept values from {}",
                sources[0].id
            ),
            &differing,
        );
    }
}
