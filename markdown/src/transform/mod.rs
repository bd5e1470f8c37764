//! Section grammar: markup tree to command models.
//!
//! A recursive-descent reader over the flat node list. Heading levels drive
//! the grammar:
//!
//! ```text
//! document    := command*
//! command     := H1(name) section*
//! section     := H2(known name) body
//! examples    := (H3(title) paragraph* code* paragraph*)*
//! parameters  := (H3(name) paragraph* code*)*
//! inputs      := (H3(type) paragraph*)*
//! ```
//!
//! A level-L heading closes only at the next heading of level L or less;
//! the reader peeks one node ahead and pushes it back when it belongs to an
//! enclosing level. Any node the grammar does not expect is a
//! [`SchemaError`] pointing at that node.

mod cursor;
mod parameters;
mod sections;

pub use cursor::NodeCursor;
pub use sections::SectionKind;

use cmdoc_core::{CodeSegment, CommandModel, Example, Link, Parameter, TypedEntry};
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::parser::{
    CodeBlock, Document, DocumentHeader, Heading, LexicalMode, Node, Paragraph, Span, metadata_for,
};
use parameters::{ParameterShape, SyntaxBuilder, parse_attributes};

/// Parameter entries that describe a capability rather than a parameter.
const COMMON_PARAMETERS: &str = "CommonParameters";
const WORKFLOW_PARAMETERS: &str = "WorkflowParameters";

/// Transforms a parsed document into one command model per level-1 heading.
///
/// # Examples
///
/// ```
/// use cmdoc_markdown::parser::{LexicalMode, MarkdownParser};
/// use cmdoc_markdown::transform;
///
/// let text = "# Get-Foo\n\n## SYNOPSIS\n\nGets a foo.\n";
/// let document = MarkdownParser::new(LexicalMode::Full).parse(text);
/// let models = transform(document).unwrap();
/// assert_eq!(models[0].name, "Get-Foo");
/// assert_eq!(models[0].synopsis.text, "Gets a foo.");
/// ```
pub fn transform(document: Document) -> Result<Vec<CommandModel>> {
    Transformer::new(document).commands()
}

/// Transforms each document independently; one failure does not stop the
/// others.
pub fn transform_batch(
    documents: impl IntoIterator<Item = Document>,
) -> Vec<Result<Vec<CommandModel>>> {
    documents
        .into_iter()
        .map(|document| {
            let result = transform(document);
            if let Err(err) = &result {
                warn!(error = %err, "Document does not follow the command grammar");
            }
            result
        })
        .collect()
}

/// Grammar state for one document.
struct Transformer {
    mode: LexicalMode,
    headers: Vec<DocumentHeader>,
    cursor: NodeCursor,
}

fn unexpected(node: &Node, expected: &str) -> SchemaError {
    let found = match node {
        Node::Heading(heading) => format!("level-{} heading", heading.level),
        Node::Paragraph(_) => "paragraph".to_string(),
        Node::CodeBlock(_) => "code block".to_string(),
    };
    SchemaError::at(node.extent(), format!("unexpected {found}; expected {expected}"))
}

fn join_blocks(blocks: Vec<String>) -> String {
    blocks.join("\n\n")
}

fn optional_text(blocks: Vec<String>) -> Option<String> {
    Some(join_blocks(blocks)).filter(|text| !text.is_empty())
}

fn code_block_markdown(code: &CodeBlock) -> String {
    format!(
        "```{}\n{}\n```",
        code.language.as_deref().unwrap_or_default(),
        code.text
    )
}

impl Transformer {
    fn new(document: Document) -> Self {
        Self {
            mode: document.mode,
            headers: document.headers,
            cursor: NodeCursor::new(document.nodes),
        }
    }

    /// Next node inside the current heading of `level`, or `None` once a
    /// heading at `level` or above closes it.
    fn next_within(&mut self, level: u8) -> Option<Node> {
        let node = self.cursor.next()?;
        if node.heading_level().is_some_and(|l| l <= level) {
            self.cursor.push_back(node);
            return None;
        }
        Some(node)
    }

    fn commands(mut self) -> Result<Vec<CommandModel>> {
        let mut commands = Vec::new();
        while let Some(node) = self.cursor.next() {
            match node {
                Node::Heading(heading) if heading.level == 1 => {
                    commands.push(self.command(heading)?);
                }
                other => return Err(unexpected(&other, "a level-1 command heading")),
            }
        }
        debug!(commands = commands.len(), "Transformed document");
        Ok(commands)
    }

    fn command(&mut self, heading: Heading) -> Result<CommandModel> {
        let mut model = CommandModel::new(heading.text.trim());
        model.metadata = metadata_for(&self.headers, self.cursor.index());
        let mut syntax = SyntaxBuilder::default();

        while let Some(node) = self.next_within(1) {
            match node {
                Node::Heading(section) if section.level == 2 => {
                    self.section(&mut model, &mut syntax, section)?;
                }
                other => return Err(unexpected(&other, "a level-2 section heading")),
            }
        }

        model.syntax = syntax.build();
        debug!(
            command = %model.name,
            parameters = model.parameters.len(),
            syntax_sets = model.syntax.len(),
            examples = model.examples.len(),
            "Transformed command"
        );
        Ok(model)
    }

    fn section(
        &mut self,
        model: &mut CommandModel,
        syntax: &mut SyntaxBuilder,
        heading: Heading,
    ) -> Result<()> {
        let Some(kind) = SectionKind::from_heading(&heading.text) else {
            return Err(SchemaError::at(
                &heading.extent,
                format!("unknown section '{}'", heading.text.trim()),
            ));
        };
        let spaced = heading.blank_line_follows;

        match kind {
            SectionKind::Synopsis => {
                model.synopsis.text = self.section_text()?;
                model.synopsis.blank_line_after = spaced;
            }
            SectionKind::Syntax => {
                self.syntax_section(syntax)?;
                model.formatting.syntax = spaced;
            }
            SectionKind::Description => {
                model.description = self.section_text()?;
                model.formatting.description = spaced;
            }
            SectionKind::Examples => {
                while let Some(node) = self.next_within(2) {
                    match node {
                        Node::Heading(title) if title.level == 3 => {
                            model.examples.push(self.example(title));
                        }
                        other => return Err(unexpected(&other, "a level-3 example heading")),
                    }
                }
                model.formatting.examples = spaced;
            }
            SectionKind::Parameters => {
                self.parameters_section(model, syntax)?;
                model.formatting.parameters = spaced;
            }
            SectionKind::Inputs => {
                model.inputs.extend(self.typed_entries()?);
                model.formatting.inputs = spaced;
            }
            SectionKind::Outputs => {
                model.outputs.extend(self.typed_entries()?);
                model.formatting.outputs = spaced;
            }
            SectionKind::Notes => {
                model.notes = self.section_text()?;
                model.formatting.notes = spaced;
            }
            SectionKind::RelatedLinks => {
                let links = self.related_links()?;
                model.links.extend(links);
                model.formatting.related_links = spaced;
            }
        }
        Ok(())
    }

    /// Paragraphs and code blocks of a plain-text section, joined by blank
    /// lines.
    fn section_text(&mut self) -> Result<String> {
        let mut blocks = Vec::new();
        while let Some(node) = self.next_within(2) {
            match node {
                Node::Paragraph(paragraph) => blocks.push(paragraph.to_markdown()),
                Node::CodeBlock(code) => blocks.push(code_block_markdown(&code)),
                other => return Err(unexpected(&other, "section text")),
            }
        }
        Ok(join_blocks(blocks))
    }

    fn syntax_section(&mut self, syntax: &mut SyntaxBuilder) -> Result<()> {
        while let Some(node) = self.next_within(2) {
            match node {
                Node::Heading(set) if set.level == 3 => syntax.declare(&set.text),
                // Syntax lines are regenerated from the parameter blocks.
                Node::Paragraph(_) | Node::CodeBlock(_) => {}
                other => return Err(unexpected(&other, "a level-3 parameter set heading")),
            }
        }
        Ok(())
    }

    fn example(&mut self, heading: Heading) -> Example {
        let mut example = Example::new(heading.text.trim());
        let mut introduction = Vec::new();
        let mut remarks = Vec::new();

        while let Some(node) = self.next_within(3) {
            match node {
                Node::Paragraph(paragraph) if example.code.is_empty() => {
                    introduction.push(paragraph.to_markdown());
                }
                Node::Paragraph(paragraph) => remarks.push(paragraph.to_markdown()),
                Node::CodeBlock(code) => example
                    .code
                    .push(CodeSegment::new(code.language.as_deref(), &code.text)),
                // Deeper headings inside an example are kept as remark text.
                Node::Heading(sub) => remarks.push(format!(
                    "{} {}",
                    "#".repeat(usize::from(sub.level)),
                    sub.text
                )),
            }
        }

        example.introduction = optional_text(introduction);
        example.remarks = optional_text(remarks);
        example
    }

    fn parameters_section(
        &mut self,
        model: &mut CommandModel,
        syntax: &mut SyntaxBuilder,
    ) -> Result<()> {
        while let Some(node) = self.next_within(2) {
            let heading = match node {
                Node::Heading(heading) if heading.level == 3 => heading,
                other => return Err(unexpected(&other, "a level-3 parameter heading")),
            };
            let name = heading.text.trim().trim_start_matches('-').trim();

            if name.eq_ignore_ascii_case(COMMON_PARAMETERS) {
                model.supports_common_parameters = true;
                self.skip_within(3);
                continue;
            }
            if name.eq_ignore_ascii_case(WORKFLOW_PARAMETERS) {
                model.is_workflow = true;
                self.skip_within(3);
                continue;
            }

            let parameter = self.parameter(name, syntax)?;
            model.parameters.push(parameter);
        }
        Ok(())
    }

    fn skip_within(&mut self, level: u8) {
        while self.next_within(level).is_some() {}
    }

    fn parameter(&mut self, name: &str, syntax: &mut SyntaxBuilder) -> Result<Parameter> {
        let mut parameter = Parameter::new(name);
        let mut description = Vec::new();
        let mut shapes = Vec::new();

        while let Some(node) = self.next_within(3) {
            match node {
                Node::Paragraph(paragraph) => description.push(paragraph.to_markdown()),
                Node::CodeBlock(code) => {
                    let attributes = parse_attributes(name, &code)?;
                    if shapes.is_empty() {
                        attributes.apply_to(&mut parameter);
                    }
                    for set in attributes.sets() {
                        if !parameter
                            .parameter_sets
                            .iter()
                            .any(|s| s.eq_ignore_ascii_case(set))
                        {
                            parameter.parameter_sets.push(set.clone());
                        }
                    }
                    shapes.push(attributes.shape(&parameter));
                }
                other => return Err(unexpected(&other, "parameter description or attributes")),
            }
        }

        parameter.description = join_blocks(description);
        if shapes.is_empty() {
            shapes.push(ParameterShape::implicit(&parameter));
        }
        for shape in shapes {
            syntax.add_shape(shape);
        }
        Ok(parameter)
    }

    fn typed_entries(&mut self) -> Result<Vec<TypedEntry>> {
        let mut entries = Vec::new();
        while let Some(node) = self.next_within(2) {
            let heading = match node {
                Node::Heading(heading) if heading.level == 3 => heading,
                other => return Err(unexpected(&other, "a level-3 type heading")),
            };
            let mut description = Vec::new();
            while let Some(node) = self.next_within(3) {
                match node {
                    Node::Paragraph(paragraph) => description.push(paragraph.to_markdown()),
                    Node::CodeBlock(code) => description.push(code_block_markdown(&code)),
                    other => return Err(unexpected(&other, "a type description")),
                }
            }
            entries.push(TypedEntry::new(
                heading.text.trim(),
                &join_blocks(description),
            ));
        }
        Ok(entries)
    }

    fn related_links(&mut self) -> Result<Vec<Link>> {
        let mut links = Vec::new();
        while let Some(node) = self.next_within(2) {
            match node {
                Node::Paragraph(paragraph) => self.paragraph_links(&paragraph, &mut links)?,
                other => return Err(unexpected(&other, "related link paragraphs")),
            }
        }
        Ok(links)
    }

    fn paragraph_links(&self, paragraph: &Paragraph, links: &mut Vec<Link>) -> Result<()> {
        for span in &paragraph.spans {
            match span {
                Span::Hyperlink { text, uri } => links.push(Link::Hyperlink {
                    name: text.clone(),
                    uri: uri.clone(),
                }),
                Span::HardBreak => {}
                Span::Text { content, .. } => match self.mode {
                    LexicalMode::FormattingPreserve => links.extend(
                        content
                            .lines()
                            .map(str::trim)
                            .filter(|line| !line.is_empty())
                            .map(|line| Link::SimplifiedText {
                                raw: line.to_string(),
                            }),
                    ),
                    LexicalMode::Full => {
                        // List markers between links are layout, not content.
                        let residue: Vec<&str> = content
                            .split_whitespace()
                            .filter(|token| !is_list_marker(token))
                            .collect();
                        if !residue.is_empty() {
                            let residue = residue.join(" ");
                            return Err(SchemaError::at(
                                &paragraph.extent,
                                format!("related links may only contain hyperlinks, found '{residue}'"),
                            ));
                        }
                    }
                },
            }
        }
        Ok(())
    }
}

/// `-`, `*`, `1.` or `1)`.
fn is_list_marker(token: &str) -> bool {
    match token {
        "-" | "*" => true,
        _ => token
            .strip_suffix(['.', ')'])
            .is_some_and(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())),
    }
}

#[cfg(test)]
mod tests {
    use cmdoc_core::{Position, SyntaxParameter};

    use super::*;
    use crate::parser::MarkdownParser;

    fn models(mode: LexicalMode, text: &str) -> Result<Vec<CommandModel>> {
        transform(MarkdownParser::new(mode).parse(text))
    }

    fn model(text: &str) -> CommandModel {
        let mut models = models(LexicalMode::Full, text).expect("valid document");
        assert_eq!(models.len(), 1);
        models.remove(0)
    }

    #[test]
    fn test_minimal_document() {
        let model = model("# Get-Foo\n\n## SYNOPSIS\nThis is Synopsis\n");
        assert_eq!(model.name, "Get-Foo");
        assert_eq!(model.synopsis.text, "This is Synopsis");
        assert!(!model.synopsis.blank_line_after);
        assert!(model.parameters.is_empty());
        assert!(model.syntax.is_empty());
    }

    #[test]
    fn test_heading_closes_only_at_same_or_higher_level() {
        let text = "# A\n## SYNOPSIS\nfirst\n# B\n## SYNOPSIS\nsecond\n";
        let models = models(LexicalMode::Full, text).expect("valid");
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].synopsis.text, "first");
        assert_eq!(models[1].name, "B");
        assert_eq!(models[1].synopsis.text, "second");
    }

    #[test]
    fn test_unknown_section_reports_location() {
        let err = models(LexicalMode::Full, "# Get-Foo\n\n## BOGUS\ntext\n").expect_err("invalid");
        assert_eq!((err.line, err.column), (3, 1));
        assert!(err.message.contains("unknown section 'BOGUS'"));
        assert_eq!(err.excerpt, "## BOGUS");
    }

    #[test]
    fn test_content_before_first_command_is_an_error() {
        let err = models(LexicalMode::Full, "stray text\n\n# Get-Foo\n").expect_err("invalid");
        assert_eq!(err.line, 1);
        assert!(err.message.contains("paragraph"));
    }

    #[test]
    fn test_section_text_keeps_paragraphs_and_code() {
        let model = model(
            "# Get-Foo\n\n## DESCRIPTION\n\nFirst **bold**.\n\n```\nraw\n```\n\nLast.\n",
        );
        assert_eq!(model.description, "First **bold**.\n\n```\nraw\n```\n\nLast.");
        assert!(model.formatting.description);
    }

    #[test]
    fn test_examples_split_introduction_code_and_remarks() {
        let model = model(
            "# Get-Foo\n\n## EXAMPLES\n\n### Example 1\n\nIntro.\n\n```powershell\nGet-Foo\n```\n\n```output\nFoo\n```\n\nRemark.\n\n### Example 2\n```\nGet-Foo -Bar\n```\n",
        );
        assert_eq!(model.examples.len(), 2);
        let first = &model.examples[0];
        assert_eq!(first.title, "Example 1");
        assert_eq!(first.introduction.as_deref(), Some("Intro."));
        assert_eq!(first.code_text(), "Get-Foo\n\nFoo");
        assert_eq!(first.code[1].language.as_deref(), Some("output"));
        assert_eq!(first.remarks.as_deref(), Some("Remark."));
        assert_eq!(model.examples[1].introduction, None);
    }

    #[test]
    fn test_parameters_and_derived_syntax() {
        let model = model(
            "# Get-Foo\n\n## SYNTAX\n\n### ByName (Default)\n```\nGet-Foo [-Name] <String>\n```\n\n### ByPath\n\n## PARAMETERS\n\n### -Name\nThe name.\n\n```yaml\nType: String\nParameter Sets: ByName\nRequired: True\nPosition: 0\n```\n\n### -Path\n```yaml\nType: String\nParameter Sets: ByPath\nRequired: True\nPosition: Named\n```\n\n### -Force\n```yaml\nType: SwitchParameter\nParameter Sets: (All)\n```\n\n### CommonParameters\nThis cmdlet supports the common parameters.\n",
        );

        assert_eq!(model.parameter_names(), vec!["Name", "Path", "Force"]);
        assert_eq!(model.parameters[0].description, "The name.");
        assert!(model.supports_common_parameters);
        assert!(!model.is_workflow);

        assert_eq!(model.syntax.len(), 2);
        let by_name = &model.syntax[0];
        assert_eq!(by_name.name.as_deref(), Some("ByName"));
        assert!(by_name.is_default);
        assert_eq!(
            by_name.parameters,
            vec![
                SyntaxParameter {
                    name: "Name".into(),
                    type_name: Some("String".into()),
                    required: true,
                    position: Position::Index(0),
                },
                SyntaxParameter {
                    name: "Force".into(),
                    type_name: Some("SwitchParameter".into()),
                    required: false,
                    position: Position::Named,
                },
            ]
        );
        assert_eq!(model.syntax[1].member_names(), vec!["Path", "Force"]);
    }

    #[test]
    fn test_parameter_in_two_sets_with_different_shapes() {
        let model = model(
            "# Get-Foo\n\n## PARAMETERS\n\n### -Name\n```yaml\nParameter Sets: A\nRequired: True\n```\n```yaml\nParameter Sets: B\nRequired: False\n```\n",
        );
        assert_eq!(model.parameters.len(), 1);
        assert_eq!(model.parameters[0].parameter_sets, vec!["A", "B"]);
        assert_eq!(model.syntax.len(), 2);
        assert!(model.syntax[0].parameters[0].required);
        assert!(!model.syntax[1].parameters[0].required);
    }

    #[test]
    fn test_related_links_full_mode() {
        let model = model(
            "# Get-Foo\n\n## RELATED LINKS\n\n- [Online](https://example.com/get-foo)\n- [Set-Foo]()\n",
        );
        assert_eq!(
            model.links,
            vec![
                Link::hyperlink("Online", "https://example.com/get-foo"),
                Link::hyperlink("Set-Foo", ""),
            ]
        );
    }

    #[test]
    fn test_related_links_accept_ordered_list_markers() {
        let model = model(
            "# Get-Foo\n\n## RELATED LINKS\n\n1. [Online](https://example.com/get-foo)\n2. [Set-Foo]()\n",
        );
        assert_eq!(
            model.links,
            vec![
                Link::hyperlink("Online", "https://example.com/get-foo"),
                Link::hyperlink("Set-Foo", ""),
            ]
        );
    }

    #[test]
    fn test_related_links_reject_plain_text_in_full_mode() {
        let err = models(
            LexicalMode::Full,
            "# Get-Foo\n\n## RELATED LINKS\n\nSee the manual.\n",
        )
        .expect_err("invalid");
        assert_eq!(err.line, 5);
    }

    #[test]
    fn test_related_links_are_simplified_in_preserve_mode() {
        let models = models(
            LexicalMode::FormattingPreserve,
            "# Get-Foo\n\n## RELATED LINKS\n\n[Online](https://example.com)\n\nSee the manual.\n",
        )
        .expect("valid");
        assert_eq!(
            models[0].links,
            vec![
                Link::SimplifiedText {
                    raw: "[Online](https://example.com)".into()
                },
                Link::SimplifiedText {
                    raw: "See the manual.".into()
                },
            ]
        );
    }

    #[test]
    fn test_inputs_and_outputs() {
        let model = model(
            "# Get-Foo\n\n## INPUTS\n\n### None\n\n## OUTPUTS\n\n### System.String\nThe name.\n\n### System.Int32\n",
        );
        assert_eq!(model.inputs, vec![TypedEntry::new("None", "")]);
        assert_eq!(
            model.outputs,
            vec![
                TypedEntry::new("System.String", "The name."),
                TypedEntry::new("System.Int32", ""),
            ]
        );
    }

    #[test]
    fn test_front_matter_is_attached_to_each_command() {
        let text = "---\nModule Name: Demo\n---\n\n# A\n\n# B\n";
        let models = models(LexicalMode::Full, text).expect("valid");
        assert_eq!(models.len(), 2);
        assert!(models.iter().all(|m| m.metadata.get("module name") == Some("Demo")));
    }

    #[test]
    fn test_transform_batch_isolates_failures() {
        let mut parser = MarkdownParser::new(LexicalMode::Full);
        let documents = vec![
            parser.parse("# A\n"),
            parser.parse("## SYNOPSIS\n"),
            parser.parse("# C\n"),
        ];
        let results = transform_batch(documents);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().map(|m| m[0].name.as_str()), Ok("C"));
    }
}
