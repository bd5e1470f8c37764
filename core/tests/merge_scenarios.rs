use cmdoc_core::*;

fn syntax(name: &str, members: &[&str]) -> SyntaxSet {
    members
        .iter()
        .fold(SyntaxSet::named(name), |set, member| {
            set.with_parameter(SyntaxParameter::new(member))
        })
}

fn example(title: &str, remarks: &str) -> Example {
    Example::new(title)
        .with_code(Some("powershell"), "PS C:\\> Get-Foo")
        .with_remarks(remarks)
}

/// The three sources of the reference three-way merge.
fn three_sources() -> (CommandModel, CommandModel, CommandModel) {
    let mut first = CommandModel::new("Get-Foo");
    first.synopsis.text = "S".into();
    first.notes = "N1".into();
    first.links = vec![Link::hyperlink("foo", "")];
    first.inputs = vec![TypedEntry::new("Foo", "")];
    first.parameters = vec![Parameter::new("Name")];
    first.syntax = vec![syntax("ByName", &["Name"])];

    let mut second = CommandModel::new("Get-Foo");
    second.synopsis.text = "S".into();
    second.links = vec![Link::hyperlink("foo", ""), Link::hyperlink("bar", "")];
    second.examples = vec![example("Example 1", "remarkA")];
    second.inputs = vec![TypedEntry::new("Foo", "")];
    second.parameters = vec![Parameter::new("Name")];

    let mut third = CommandModel::new("Get-Foo");
    third.synopsis.text = "S3".into();
    third.links = vec![Link::hyperlink("bar", "")];
    third.examples = vec![example("Example 1", "remarkB")];
    third.inputs = vec![TypedEntry::new("Foo 2", "")];
    third.parameters = vec![Parameter::new("Name"), Parameter::new("Remove")];
    third.syntax = vec![
        syntax("ByName", &["Name", "Remove"]),
        syntax("BySomethingElse", &["Name"]),
    ];

    (first, second, third)
}

fn merge_three(first: &CommandModel, second: &CommandModel, third: &CommandModel) -> MergeOutcome {
    merge_sources(&[
        MergeSource::new("First", first),
        MergeSource::new("Second", second),
        MergeSource::new("Third", third),
    ])
}

#[test]
fn test_three_way_merge_text_links_and_examples() {
    let (first, second, third) = three_sources();
    let outcome = merge_three(&first, &second, &third);
    let model = &outcome.model;

    assert_eq!(model.synopsis.text, "First, Second: S\n\nThird: S3");
    assert_eq!(model.notes, "N1");
    assert_eq!(
        model.links,
        vec![Link::hyperlink("foo", ""), Link::hyperlink("bar", "")]
    );
    let titles: Vec<&str> = model.examples.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Example 1 (Second)", "Example 1 (Third)"]);
    assert_eq!(model.examples[0].remarks.as_deref(), Some("remarkA"));

    let inputs: Vec<&str> = model.inputs.iter().map(|e| e.type_name.as_str()).collect();
    assert_eq!(inputs, vec!["Foo", "Foo 2"]);
}

#[test]
fn test_three_way_merge_parameters_and_syntax() {
    let (first, second, third) = three_sources();
    let outcome = merge_three(&first, &second, &third);
    let model = &outcome.model;

    assert_eq!(model.parameter_names(), vec!["Name", "Remove"]);
    assert_eq!(
        model.find_parameter("Name").unwrap().applicable,
        vec!["First", "Second", "Third"]
    );
    assert_eq!(model.find_parameter("Remove").unwrap().applicable, vec!["Third"]);

    assert_eq!(model.syntax.len(), 2);
    let by_name = model.find_syntax("ByName").unwrap();
    assert_eq!(by_name.member_names(), vec!["Name", "Remove"]);
    assert_eq!(by_name.applicable, vec!["First", "Third"]);
    assert_eq!(
        model.find_syntax("BySomethingElse").unwrap().member_names(),
        vec!["Name"]
    );
    assert!(validate_model(model).is_empty());
}

#[test]
fn test_three_way_merge_logs_divergence() {
    let (first, second, third) = three_sources();
    let outcome = merge_three(&first, &second, &third);

    assert_eq!(outcome.max_severity(), Some(Severity::Warning));
    assert!(!outcome.has_errors());
    assert!(outcome.diagnostics.iter().any(|d| {
        d.area == DiagnosticArea::Synopsis
            && d.severity == Severity::Warning
            && d.sources == ["First", "Second", "Third"]
    }));
    assert!(outcome.diagnostics.iter().any(|d| {
        d.area == DiagnosticArea::Syntax && d.message.contains("membership differs")
    }));

    let report = outcome.report();
    assert!(report.starts_with("# Merge report: Get-Foo"));
    assert!(report.contains("## Examples"));
}

#[test]
fn test_conflicting_parameter_keeps_first_shape() {
    let mut windows = CommandModel::new("Get-Foo");
    windows.parameters = vec![Parameter::new("Path").with_type("String").at_position(0)];

    let mut linux = CommandModel::new("Get-Foo");
    let mut path = Parameter::new("Path").with_type("FileInfo").at_position(1);
    path.globbing = true;
    linux.parameters = vec![path];

    let outcome = merge_sources(&[
        MergeSource::new("windows", &windows),
        MergeSource::new("linux", &linux),
    ]);
    let merged = outcome.model.find_parameter("Path").unwrap();

    assert_eq!(merged.type_name.as_deref(), Some("String"));
    assert_eq!(merged.position, Position::Index(0));
    assert!(!merged.globbing);
    assert_eq!(merged.applicable, vec!["windows", "linux"]);

    let mismatch = outcome
        .diagnostics
        .iter()
        .find(|d| d.area == DiagnosticArea::Parameters)
        .expect("parameter diagnostic");
    assert!(mismatch.severity >= Severity::Information);
    assert!(mismatch.message.contains("position"));
    assert!(mismatch.message.contains("globbing"));
}

#[test]
fn test_single_source_merge_is_identity_with_applicable() {
    let (_, _, mut third) = three_sources();
    third.description = "Gets foo objects.".into();
    third.metadata.insert("schema", "2.0.0");

    let outcome = merge_sources(&[MergeSource::new("Third", &third)]);

    let mut expected = third.clone();
    for parameter in &mut expected.parameters {
        parameter.applicable = vec!["Third".to_string()];
    }
    for set in &mut expected.syntax {
        set.applicable = vec!["Third".to_string()];
    }
    assert_eq!(outcome.model, expected);
    assert!(outcome.max_severity() <= Some(Severity::Information));
}

#[test]
fn test_merge_is_deterministic() {
    let (first, second, third) = three_sources();
    let one = merge_three(&first, &second, &third);
    let two = merge_three(&first, &second, &third);

    assert_eq!(one, two);
    assert_eq!(
        serde_json::to_string(&one).unwrap(),
        serde_json::to_string(&two).unwrap()
    );
}

#[test]
fn test_parameter_applicable_matches_presence() {
    let names = ["Name", "Path", "Force", "Recurse"];
    let sources: Vec<(String, CommandModel)> = (0..4)
        .map(|i| {
            let mut model = CommandModel::new("Get-Foo");
            // Source i documents every parameter whose index bit i is set.
            for (bit, name) in names.iter().enumerate() {
                if (bit + 1) & (1 << i) != 0 {
                    model.parameters.push(Parameter::new(name));
                }
            }
            (format!("s{i}"), model)
        })
        .collect();
    let inputs: Vec<MergeSource<'_>> = sources
        .iter()
        .map(|(id, model)| MergeSource::new(id, model))
        .collect();

    let outcome = merge_sources(&inputs);

    for name in names {
        let expected: Vec<&str> = sources
            .iter()
            .filter(|(_, model)| model.find_parameter(name).is_some())
            .map(|(id, _)| id.as_str())
            .collect();
        let merged = outcome.model.find_parameter(name).unwrap();
        assert_eq!(merged.applicable, expected, "parameter {name}");
    }
}

#[test]
fn test_update_and_merge_are_distinct_policies() {
    let mut authored = CommandModel::new("Get-Foo");
    authored.parameters = vec![
        Parameter::new("Name").with_description("Authored text."),
        Parameter::new("Legacy"),
    ];
    let mut live = CommandModel::new("Get-Foo");
    live.parameters = vec![
        Parameter::new("Name").with_type("System.String").at_position(0),
    ];

    let updated = update_from_live(&authored, &live);
    assert_eq!(updated.model.parameter_names(), vec!["Name"]);
    assert_eq!(
        updated.model.find_parameter("Name").unwrap().description,
        "Authored text."
    );

    let merged = merge_sources(&[
        MergeSource::new(AUTHORED_SOURCE, &authored),
        MergeSource::new(LIVE_SOURCE, &live),
    ]);
    assert_eq!(merged.model.parameter_names(), vec!["Name", "Legacy"]);
    assert_eq!(merged.model.find_parameter("Name").unwrap().position, Position::Named);
}
