//! Parameter attribute blocks and syntax-set derivation.
//!
//! Each `### -Name` entry under `## PARAMETERS` may carry one or more fenced
//! blocks of `Key: Value` lines:
//!
//! ```yaml
//! Type: String
//! Parameter Sets: ByName
//! Aliases: None
//!
//! Required: True
//! Position: 0
//! Default value: None
//! Accept pipeline input: False
//! Accept wildcard characters: False
//! ```
//!
//! The first block supplies the parameter's own attributes. Every block
//! contributes a shape (required flag and position within the sets it names)
//! from which the command's syntax sets are derived.

use std::collections::HashSet;

use cmdoc_core::{ALL_PARAMETER_SETS, Metadata, Parameter, Position, SyntaxParameter, SyntaxSet};

use crate::error::{Result, SchemaError};
use crate::parser::CodeBlock;

/// Set name some documents use for the default, unnamed set.
const ALL_SETS_ALIAS: &str = "__AllParameterSets";

const DEFAULT_MARKER: &str = "(Default)";

/// Values of one attribute block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Attributes {
    type_name: Option<String>,
    sets: Vec<String>,
    aliases: Vec<String>,
    required: bool,
    position: Position,
    default_value: Option<String>,
    pipeline_input: Option<String>,
    globbing: bool,
    accepted_values: Vec<String>,
    applicable: Vec<String>,
    dont_show: bool,
    extra: Metadata,
}

fn is_none_marker(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn split_list(value: &str) -> Vec<String> {
    if is_none_marker(value) {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    value.trim_start().to_ascii_lowercase().starts_with("true")
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

/// Reads the `Key: Value` lines of a parameter code block.
pub(crate) fn parse_attributes(parameter: &str, block: &CodeBlock) -> Result<Attributes> {
    let mut attributes = Attributes::default();

    for (index, line) in block.text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(SchemaError::in_block_line(
                &block.extent,
                index,
                line,
                format!("attribute line of parameter '{parameter}' has no ':' separator"),
            ));
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "type" => attributes.type_name = Some(value).filter(|v| !v.is_empty()).map(String::from),
            "parameter sets" => attributes.sets = split_list(value),
            "aliases" => attributes.aliases = split_list(value),
            "required" => attributes.required = parse_flag(value),
            "position" => attributes.position = Position::parse(value).unwrap_or_default(),
            "default value" => {
                attributes.default_value = Some(value)
                    .filter(|v| !is_none_marker(v))
                    .map(String::from);
            }
            "accept pipeline input" => attributes.pipeline_input = Some(value.to_string()),
            "accept wildcard characters" => attributes.globbing = parse_flag(value),
            "accepted values" => attributes.accepted_values = split_list(value),
            "applicable" => attributes.applicable = split_list(value),
            "dontshow" => attributes.dont_show = parse_flag(value),
            _ => attributes.extra.insert(key.trim(), value),
        }
    }

    Ok(attributes)
}

impl Attributes {
    /// Copies the per-parameter attributes onto `parameter`.
    pub(crate) fn apply_to(&self, parameter: &mut Parameter) {
        parameter.type_name = self.type_name.clone();
        parameter.aliases = self.aliases.clone();
        parameter.required = self.required;
        parameter.position = self.position;
        parameter.default_value = self.default_value.clone();
        if let Some(pipeline_input) = self.pipeline_input.as_deref().filter(|v| !v.is_empty()) {
            parameter.pipeline_input = pipeline_input.to_string();
        }
        parameter.globbing = self.globbing;
        parameter.accepted_values = self.accepted_values.clone();
        parameter.applicable = self.applicable.clone();
        parameter.dont_show = self.dont_show;
        parameter.extra = self.extra.clone();
    }

    pub(crate) fn sets(&self) -> &[String] {
        &self.sets
    }

    pub(crate) fn shape(&self, parameter: &Parameter) -> ParameterShape {
        ParameterShape {
            name: parameter.name.clone(),
            type_name: self.type_name.clone().or_else(|| parameter.type_name.clone()),
            sets: self.sets.clone(),
            required: self.required,
            position: self.position,
            hidden: parameter.dont_show || self.dont_show,
        }
    }
}

/// How a parameter appears in the sets named by one attribute block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParameterShape {
    name: String,
    type_name: Option<String>,
    sets: Vec<String>,
    required: bool,
    position: Position,
    hidden: bool,
}

impl ParameterShape {
    /// Shape of a parameter documented without an attribute block: a named,
    /// optional member of every set.
    pub(crate) fn implicit(parameter: &Parameter) -> Self {
        Self {
            name: parameter.name.clone(),
            type_name: parameter.type_name.clone(),
            sets: Vec::new(),
            required: false,
            position: Position::Named,
            hidden: parameter.dont_show,
        }
    }

    fn in_every_set(&self) -> bool {
        self.sets.is_empty()
            || self
                .sets
                .iter()
                .any(|set| is_all_sets(set))
    }

    fn applies_to(&self, set: &str) -> bool {
        self.in_every_set() || self.sets.iter().any(|s| s.eq_ignore_ascii_case(set))
    }

    fn member(&self) -> SyntaxParameter {
        SyntaxParameter {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            required: self.required,
            position: self.position,
        }
    }
}

fn is_all_sets(set: &str) -> bool {
    set.eq_ignore_ascii_case(ALL_PARAMETER_SETS) || set.eq_ignore_ascii_case(ALL_SETS_ALIAS)
}

/// Splits a `### SetName (Default)` heading into its name and default flag.
pub(crate) fn parse_set_heading(text: &str) -> (String, bool) {
    let trimmed = text.trim();
    let marker_start = trimmed.len().saturating_sub(DEFAULT_MARKER.len());
    match trimmed.get(marker_start..) {
        Some(tail) if tail.eq_ignore_ascii_case(DEFAULT_MARKER) => {
            (trimmed[..marker_start].trim().to_string(), true)
        }
        _ => (trimmed.to_string(), false),
    }
}

/// Positional members first by index, then required members by name, then
/// the rest by name.
fn member_order(member: &SyntaxParameter) -> (u8, u32, String) {
    let name = member.name.to_ascii_lowercase();
    match member.position.index() {
        Some(index) => (0, index, name),
        None if member.required => (1, 0, name),
        None => (2, 0, name),
    }
}

/// Collects set declarations and parameter shapes for one command, then
/// derives its syntax sets.
#[derive(Debug, Default)]
pub(crate) struct SyntaxBuilder {
    declared: Vec<String>,
    defaults: Vec<String>,
    shapes: Vec<ParameterShape>,
}

impl SyntaxBuilder {
    /// Records a set heading from the `## SYNTAX` section.
    pub(crate) fn declare(&mut self, heading: &str) {
        let (name, is_default) = parse_set_heading(heading);
        if name.is_empty() || name.eq_ignore_ascii_case(ALL_SETS_ALIAS) {
            return;
        }
        push_unique(&mut self.declared, &name);
        if is_default {
            push_unique(&mut self.defaults, &name);
        }
    }

    pub(crate) fn add_shape(&mut self, shape: ParameterShape) {
        for set in &shape.sets {
            if !is_all_sets(set) {
                push_unique(&mut self.declared, set);
            }
        }
        self.shapes.push(shape);
    }

    fn members<'a>(&self, shapes: impl Iterator<Item = &'a ParameterShape>) -> Vec<SyntaxParameter> {
        let mut seen = HashSet::new();
        let mut members: Vec<SyntaxParameter> = shapes
            .filter(|shape| !shape.hidden)
            .filter(|shape| seen.insert(shape.name.to_ascii_lowercase()))
            .map(ParameterShape::member)
            .collect();
        members.sort_by_key(member_order);
        members
    }

    /// Derives the syntax sets.
    ///
    /// Without any named set, all parameters form one unnamed default set.
    /// A lone named set without an explicit `(Default)` mark is the default.
    pub(crate) fn build(&self) -> Vec<SyntaxSet> {
        if self.declared.is_empty() {
            let members = self.members(self.shapes.iter());
            if members.is_empty() {
                return Vec::new();
            }
            let mut set = SyntaxSet::unnamed();
            set.parameters = members;
            return vec![set];
        }

        let lone_default = self.declared.len() == 1 && self.defaults.is_empty();
        self.declared
            .iter()
            .map(|name| {
                let mut set = SyntaxSet::named(name);
                set.is_default = lone_default
                    || self.defaults.iter().any(|d| d.eq_ignore_ascii_case(name));
                set.parameters = self.members(self.shapes.iter().filter(|s| s.applies_to(name)));
                set
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LexicalMode, MarkdownParser, Node};

    fn block(body: &str) -> CodeBlock {
        let text = format!("```yaml\n{body}\n```\n");
        let document = MarkdownParser::new(LexicalMode::Full).parse(&text);
        match document.nodes.into_iter().next() {
            Some(Node::CodeBlock(code)) => code,
            other => panic!("expected code block, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_attributes() {
        let code = block(
            "Type: String\nParameter Sets: ByName, ByPath\nAliases: None\n\nRequired: True\nPosition: 1\nDefault value: None\nAccept pipeline input: True (ByValue)\nAccept wildcard characters: false\nHelpMessage: Enter a name",
        );
        let attributes = parse_attributes("Name", &code).expect("attributes");
        let mut parameter = Parameter::new("Name");
        attributes.apply_to(&mut parameter);

        assert_eq!(parameter.type_name.as_deref(), Some("String"));
        assert!(parameter.aliases.is_empty());
        assert!(parameter.required);
        assert_eq!(parameter.position, Position::Index(1));
        assert_eq!(parameter.default_value, None);
        assert_eq!(parameter.pipeline_input, "True (ByValue)");
        assert!(!parameter.globbing);
        assert_eq!(parameter.extra.get("helpmessage"), Some("Enter a name"));
        assert_eq!(attributes.sets(), ["ByName", "ByPath"]);
    }

    #[test]
    fn test_attribute_line_without_separator_is_an_error() {
        let code = block("Type: String\nRequired True");
        let error = parse_attributes("Name", &code).expect_err("invalid line");
        assert_eq!(error.line, 3);
        assert!(error.message.contains("'Name'"));
        assert_eq!(error.excerpt, "Required True");
    }

    #[test]
    fn test_parse_set_heading() {
        assert_eq!(parse_set_heading("ByName (Default)"), ("ByName".into(), true));
        assert_eq!(parse_set_heading("ByPath"), ("ByPath".into(), false));
        assert_eq!(parse_set_heading("(Default)"), (String::new(), true));
    }

    fn shape(name: &str, sets: &[&str], required: bool, position: Position) -> ParameterShape {
        ParameterShape {
            name: name.into(),
            type_name: None,
            sets: sets.iter().map(|s| s.to_string()).collect(),
            required,
            position,
            hidden: false,
        }
    }

    #[test]
    fn test_unnamed_default_set_when_no_sets_are_named() {
        let mut builder = SyntaxBuilder::default();
        builder.add_shape(shape("Force", &[], false, Position::Named));
        builder.add_shape(shape("Path", &[], true, Position::Named));
        builder.add_shape(shape("Name", &["(All)"], false, Position::Index(0)));

        let sets = builder.build();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, None);
        assert!(sets[0].is_default);
        assert_eq!(sets[0].member_names(), vec!["Name", "Path", "Force"]);
    }

    #[test]
    fn test_all_sentinel_joins_every_named_set() {
        let mut builder = SyntaxBuilder::default();
        builder.declare("ByName (Default)");
        builder.declare("ByPath");
        builder.add_shape(shape("Name", &["ByName"], true, Position::Index(0)));
        builder.add_shape(shape("Path", &["ByPath"], true, Position::Index(0)));
        builder.add_shape(shape("Force", &["(All)"], false, Position::Named));

        let sets = builder.build();
        assert_eq!(sets.len(), 2);
        assert!(sets[0].is_default);
        assert!(!sets[1].is_default);
        assert_eq!(sets[0].member_names(), vec!["Name", "Force"]);
        assert_eq!(sets[1].member_names(), vec!["Path", "Force"]);
    }

    #[test]
    fn test_all_sets_alias_joins_every_named_set() {
        let mut builder = SyntaxBuilder::default();
        builder.declare("ByName (Default)");
        builder.declare("ByPath");
        builder.add_shape(shape("Name", &["ByName"], true, Position::Index(0)));
        builder.add_shape(shape("Path", &["ByPath"], true, Position::Index(0)));
        builder.add_shape(shape("Force", &["__allparametersets"], false, Position::Named));

        let sets = builder.build();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].member_names(), vec!["Name", "Force"]);
        assert_eq!(sets[1].member_names(), vec!["Path", "Force"]);
    }

    #[test]
    fn test_lone_named_set_is_default() {
        let mut builder = SyntaxBuilder::default();
        builder.add_shape(shape("Name", &["Only"], false, Position::Named));
        let sets = builder.build();
        assert_eq!(sets[0].name.as_deref(), Some("Only"));
        assert!(sets[0].is_default);
    }

    #[test]
    fn test_hidden_parameters_are_left_out() {
        let mut builder = SyntaxBuilder::default();
        let mut hidden = shape("Secret", &[], false, Position::Named);
        hidden.hidden = true;
        builder.add_shape(hidden);
        assert!(builder.build().is_empty());
    }
}
