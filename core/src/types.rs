//! Command model type definitions.
//!
//! This module defines the structured representation of one documented
//! command: synopsis, syntax, parameters, examples, inputs/outputs, notes and
//! related links. The types are designed for serialization with [`serde`] so
//! external emitters can consume them as JSON or YAML.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of the model contract (semver).
///
/// Embedded in every [`CommandPackage`](crate::CommandPackage) to track
/// compatibility between the parser and external emitters.
pub const MODEL_CONTRACT_VERSION: &str = "1.0.0";

/// Name of the sentinel parameter set that places a parameter in every set.
pub const ALL_PARAMETER_SETS: &str = "(All)";

/// Insertion-order-preserving string map used for document headers.
///
/// Emitters must reproduce header keys in the order they were authored, so
/// this is backed by a vector rather than a hash table.
///
/// # Examples
///
/// ```
/// use cmdoc_core::Metadata;
///
/// let mut meta = Metadata::new();
/// meta.insert("Module Name", "Demo");
/// meta.insert("external help file", "Demo-help.xml");
/// meta.insert("Module Name", "Renamed");
///
/// assert_eq!(meta.get("module name"), Some("Renamed"));
/// let keys: Vec<_> = meta.iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, vec!["Module Name", "external help file"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Inserts a value. An existing key keeps its position and gets the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns `true` when the key is present (case-insensitive).
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Position of a parameter on the command line.
///
/// # Examples
///
/// ```
/// use cmdoc_core::Position;
///
/// assert_eq!(Position::parse("Named"), Some(Position::Named));
/// assert_eq!(Position::parse("0"), Some(Position::Index(0)));
/// assert_eq!(Position::parse("first"), None);
/// assert_eq!(Position::Index(2).to_string(), "2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    /// Bound by name only (the default).
    #[default]
    Named,
    /// Bound positionally at the given zero-based index.
    Index(u32),
}

impl Position {
    /// Parses an attribute value such as `Named` or `1`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("named") {
            return Some(Self::Named);
        }
        value.parse::<u32>().ok().map(Self::Index)
    }

    /// Returns the positional index, or `None` for named parameters.
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Named => None,
            Self::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named => write!(f, "named"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// One documented parameter of a command.
///
/// The top-level `required`/`position`/`pipeline_input` values describe the
/// parameter's first declared shape; per-set shapes live on the
/// [`SyntaxParameter`] members of each [`SyntaxSet`].
///
/// # Examples
///
/// ```
/// use cmdoc_core::{Parameter, Position};
///
/// let name = Parameter::new("Name")
///     .with_type("System.String")
///     .at_position(0)
///     .required();
/// assert_eq!(name.position, Position::Index(0));
/// assert!(name.required);
/// assert!(name.metadata_eq(&name.clone().with_type("System.Object")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Declared type (e.g. `System.String`).
    pub type_name: Option<String>,
    pub description: String,
    pub default_value: Option<String>,
    pub position: Position,
    pub required: bool,
    /// Pipeline input descriptor as authored, e.g. `True (ByValue)`.
    pub pipeline_input: String,
    /// Whether wildcard characters are accepted.
    pub globbing: bool,
    pub aliases: Vec<String>,
    pub accepted_values: Vec<String>,
    /// Parameter set names this parameter was declared in.
    pub parameter_sets: Vec<String>,
    /// Hidden from generated syntax.
    pub dont_show: bool,
    /// Source identifiers this parameter applies to.
    pub applicable: Vec<String>,
    /// Attribute keys without a dedicated field, in authored order.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub extra: Metadata,
}

impl Parameter {
    /// Creates a named, optional parameter with no metadata.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: None,
            description: String::new(),
            default_value: None,
            position: Position::Named,
            required: false,
            pipeline_input: "False".to_string(),
            globbing: false,
            aliases: Vec::new(),
            accepted_values: Vec::new(),
            parameter_sets: Vec::new(),
            dont_show: false,
            applicable: Vec::new(),
            extra: Metadata::new(),
        }
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn at_position(mut self, index: u32) -> Self {
        self.position = Position::Index(index);
        self
    }

    /// Marks the parameter as mandatory.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn in_sets(mut self, sets: &[&str]) -> Self {
        self.parameter_sets = sets.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Returns `true` when the parameter names are equal ignoring case.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.eq_ignore_ascii_case(other)
    }

    /// Metadata equality: name, required, position, pipeline input and
    /// globbing all match. Descriptions and types do not participate.
    pub fn metadata_eq(&self, other: &Parameter) -> bool {
        self.same_name(&other.name)
            && self.required == other.required
            && self.position == other.position
            && self.pipeline_input.eq_ignore_ascii_case(&other.pipeline_input)
            && self.globbing == other.globbing
    }

    /// Lists the metadata fields that differ from `other`.
    ///
    /// The first group of names (up to `"globbing"`) are the fields that
    /// participate in [`metadata_eq`](Self::metadata_eq).
    pub fn metadata_differences(&self, other: &Parameter) -> Vec<&'static str> {
        let mut diffs = Vec::new();
        if self.required != other.required {
            diffs.push("required");
        }
        if self.position != other.position {
            diffs.push("position");
        }
        if !self.pipeline_input.eq_ignore_ascii_case(&other.pipeline_input) {
            diffs.push("pipeline input");
        }
        if self.globbing != other.globbing {
            diffs.push("globbing");
        }
        if self.type_name != other.type_name {
            diffs.push("type");
        }
        if self.aliases != other.aliases {
            diffs.push("aliases");
        }
        if self.accepted_values != other.accepted_values {
            diffs.push("accepted values");
        }
        if self.default_value != other.default_value {
            diffs.push("default value");
        }
        diffs
    }

    /// Records a source identifier, keeping the list duplicate-free.
    pub fn add_applicable(&mut self, source: &str) {
        if !self.applicable.iter().any(|s| s == source) {
            self.applicable.push(source.to_string());
        }
    }
}

/// A parameter's shape inside one syntax set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxParameter {
    pub name: String,
    pub type_name: Option<String>,
    pub required: bool,
    pub position: Position,
}

impl SyntaxParameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: None,
            required: false,
            position: Position::Named,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn at_position(mut self, index: u32) -> Self {
        self.position = Position::Index(index);
        self
    }
}

/// One valid invocation shape of a command.
///
/// An unnamed set is the default set synthesized when no parameter declares
/// a named parameter set.
///
/// # Examples
///
/// ```
/// use cmdoc_core::{SyntaxParameter, SyntaxSet};
///
/// let set = SyntaxSet::named("ByName")
///     .with_parameter(SyntaxParameter::new("Name").required());
/// assert_eq!(set.label(), "ByName");
/// assert_eq!(set.member_names(), vec!["Name"]);
/// assert_eq!(SyntaxSet::unnamed().label(), "(Default)");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxSet {
    /// Set name; `None` is the default set.
    pub name: Option<String>,
    pub is_default: bool,
    pub parameters: Vec<SyntaxParameter>,
    /// Source identifiers this set applies to.
    pub applicable: Vec<String>,
}

impl SyntaxSet {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn unnamed() -> Self {
        Self {
            is_default: true,
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, parameter: SyntaxParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Display label; the unnamed set renders as `(Default)`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("(Default)")
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn find_member(&self, name: &str) -> Option<&SyntaxParameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn add_applicable(&mut self, source: &str) {
        if !self.applicable.iter().any(|s| s == source) {
            self.applicable.push(source.to_string());
        }
    }
}

/// One language-tagged code segment of an example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSegment {
    /// Fence language moniker (e.g. `powershell`, `output`).
    pub language: Option<String>,
    pub text: String,
}

impl CodeSegment {
    pub fn new(language: Option<&str>, text: &str) -> Self {
        Self {
            language: language.map(String::from),
            text: text.to_string(),
        }
    }
}

/// A documented usage example.
///
/// # Examples
///
/// ```
/// use cmdoc_core::{CodeSegment, Example};
///
/// let mut example = Example::new("Example 1");
/// example.code.push(CodeSegment::new(Some("powershell"), "Get-Foo"));
/// example.code.push(CodeSegment::new(Some("output"), "Foo"));
/// assert_eq!(example.code_text(), "Get-Foo\n\nFoo");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub title: String,
    pub introduction: Option<String>,
    pub code: Vec<CodeSegment>,
    pub remarks: Option<String>,
}

impl Example {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, language: Option<&str>, text: &str) -> Self {
        self.code.push(CodeSegment::new(language, text));
        self
    }

    pub fn with_remarks(mut self, remarks: &str) -> Self {
        self.remarks = Some(remarks.to_string());
        self
    }

    /// All code segments joined by a blank line.
    pub fn code_text(&self) -> String {
        self.code
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Structural equality on title, code and remarks.
    pub fn same_content(&self, other: &Example) -> bool {
        self.title == other.title && self.code == other.code && self.remarks == other.remarks
    }
}

/// An input or output type entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedEntry {
    pub type_name: String,
    pub description: String,
}

impl TypedEntry {
    pub fn new(type_name: &str, description: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A related link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Link {
    /// `[name](uri)`; the uri may be empty.
    Hyperlink { name: String, uri: String },
    /// Raw text kept verbatim when links are read in formatting-preserve mode.
    SimplifiedText { raw: String },
}

impl Link {
    pub fn hyperlink(name: &str, uri: &str) -> Self {
        Self::Hyperlink {
            name: name.to_string(),
            uri: uri.to_string(),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hyperlink { name, uri } => write!(f, "[{name}]({uri})"),
            Self::SimplifiedText { raw } => write!(f, "{raw}"),
        }
    }
}

/// Synopsis text plus its spacing option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synopsis {
    pub text: String,
    /// Whether the `## SYNOPSIS` heading was followed by a blank line.
    pub blank_line_after: bool,
}

impl Default for Synopsis {
    fn default() -> Self {
        Self {
            text: String::new(),
            blank_line_after: true,
        }
    }
}

/// Per-section spacing options, recorded so emitters can reproduce the
/// authored layout. Each flag says whether the section heading was followed
/// by a blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFormatting {
    pub syntax: bool,
    pub description: bool,
    pub examples: bool,
    pub parameters: bool,
    pub inputs: bool,
    pub outputs: bool,
    pub notes: bool,
    pub related_links: bool,
}

impl Default for SectionFormatting {
    fn default() -> Self {
        Self {
            syntax: true,
            description: true,
            examples: true,
            parameters: true,
            inputs: true,
            outputs: true,
            notes: true,
            related_links: true,
        }
    }
}

/// Structured representation of one documented command.
///
/// # Examples
///
/// ```
/// use cmdoc_core::*;
///
/// let mut model = CommandModel::new("Get-Foo");
/// model.synopsis.text = "Gets a foo.".into();
/// model.parameters.push(Parameter::new("Name").at_position(0));
///
/// assert!(model.find_parameter("name").is_some());
/// assert!(model.find_parameter("Path").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandModel {
    pub name: String,
    /// Document header entries, in authored order.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub synopsis: Synopsis,
    pub syntax: Vec<SyntaxSet>,
    pub description: String,
    pub examples: Vec<Example>,
    pub parameters: Vec<Parameter>,
    pub inputs: Vec<TypedEntry>,
    pub outputs: Vec<TypedEntry>,
    pub notes: String,
    pub links: Vec<Link>,
    pub is_workflow: bool,
    pub supports_common_parameters: bool,
    #[serde(default)]
    pub formatting: SectionFormatting,
}

impl CommandModel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Finds a parameter by name (case-insensitive).
    pub fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.same_name(name))
    }

    /// Finds a named syntax set (case-insensitive).
    pub fn find_syntax(&self, name: &str) -> Option<&SyntaxSet> {
        self.syntax.iter().find(|s| {
            s.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Gets all parameter names in documented order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}
