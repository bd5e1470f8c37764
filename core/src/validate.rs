//! Command model and package validation.
//!
//! Validates structural invariants of command models, catching problems such
//! as duplicate parameters, syntax sets that reference undocumented
//! parameters and colliding positions before a model reaches an emitter.
//!
//! # Examples
//!
//! ```
//! use cmdoc_core::*;
//!
//! let mut model = CommandModel::new("Get-Foo");
//! model.parameters.push(Parameter::new("Name"));
//! model.syntax.push(SyntaxSet::unnamed().with_parameter(SyntaxParameter::new("Name")));
//! assert!(validate_model(&model).is_empty());
//!
//! // Invalid: the syntax references a parameter that is not documented
//! model.syntax[0].parameters.push(SyntaxParameter::new("Path"));
//! assert!(!validate_model(&model).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CommandModel, CommandPackage};

/// Model/package validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Package version string is empty.
    #[error("package version cannot be empty")]
    EmptyPackageVersion,
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// Two commands in the same package share a name.
    #[error("duplicate command in package: {0}")]
    DuplicateCommand(String),
    /// A parameter has an empty name.
    #[error("parameter name cannot be empty")]
    EmptyParameterName,
    /// Two parameters share a name (case-insensitive).
    #[error("duplicate parameter: {0}")]
    DuplicateParameter(String),
    /// Two syntax sets share a name (case-insensitive).
    #[error("duplicate syntax set: {0}")]
    DuplicateSyntaxSet(String),
    /// A syntax set lists a parameter that is not documented.
    #[error("syntax set '{set}' references unknown parameter '{parameter}'")]
    UnknownSyntaxMember { set: String, parameter: String },
    /// Two members of one syntax set claim the same position.
    #[error("syntax set '{set}' has more than one parameter at position {position}")]
    DuplicatePosition { set: String, position: u32 },
    /// An example has an empty title.
    #[error("example {0} has an empty title")]
    EmptyExampleTitle(usize),
}

/// Validates a package of command models.
///
/// Checks for an empty version string, duplicate command names, and
/// validates each model individually. Stops at the first failing command.
///
/// # Examples
///
/// ```
/// use cmdoc_core::*;
///
/// let mut package = CommandPackage::new("1.0.0");
/// package.commands.push(CommandModel::new("Get-Foo"));
/// assert!(validate_package(&package).is_empty());
///
/// package.commands.push(CommandModel::new("get-foo"));
/// let errors = validate_package(&package);
/// assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateCommand(_))));
/// ```
pub fn validate_package(package: &CommandPackage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if package.version.trim().is_empty() {
        errors.push(ValidationError::EmptyPackageVersion);
        return errors;
    }

    let mut seen_commands: HashSet<String> = HashSet::new();
    for model in &package.commands {
        if !seen_commands.insert(model.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateCommand(model.name.clone()));
            return errors;
        }
        errors.extend(validate_model(model));
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}

/// Validates one command model, reporting every problem found.
pub fn validate_model(model: &CommandModel) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if model.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
    }

    let mut seen_parameters: HashSet<String> = HashSet::new();
    for parameter in &model.parameters {
        if parameter.name.trim().is_empty() {
            errors.push(ValidationError::EmptyParameterName);
            continue;
        }
        if !seen_parameters.insert(parameter.name.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateParameter(parameter.name.clone()));
        }
    }

    let mut seen_sets: HashSet<String> = HashSet::new();
    for set in &model.syntax {
        if let Some(name) = &set.name
            && !seen_sets.insert(name.to_ascii_lowercase())
        {
            errors.push(ValidationError::DuplicateSyntaxSet(name.clone()));
        }

        let mut seen_positions: HashSet<u32> = HashSet::new();
        for member in &set.parameters {
            if !seen_parameters.contains(&member.name.to_ascii_lowercase()) {
                errors.push(ValidationError::UnknownSyntaxMember {
                    set: set.label().to_string(),
                    parameter: member.name.clone(),
                });
            }
            if let Some(position) = member.position.index()
                && !seen_positions.insert(position)
            {
                errors.push(ValidationError::DuplicatePosition {
                    set: set.label().to_string(),
                    position,
                });
            }
        }
    }

    for (index, example) in model.examples.iter().enumerate() {
        if example.title.trim().is_empty() {
            errors.push(ValidationError::EmptyExampleTitle(index + 1));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use crate::{Example, Parameter, SyntaxParameter, SyntaxSet};

    use super::*;

    #[test]
    fn test_validate_package_rejects_empty_version() {
        let package = CommandPackage::new(" ");
        assert_eq!(
            validate_package(&package),
            vec![ValidationError::EmptyPackageVersion]
        );
    }

    #[test]
    fn test_validate_model_rejects_duplicate_parameters() {
        let mut model = CommandModel::new("Get-Foo");
        model.parameters.push(Parameter::new("Name"));
        model.parameters.push(Parameter::new("NAME"));

        assert_eq!(
            validate_model(&model),
            vec![ValidationError::DuplicateParameter("NAME".to_string())]
        );
    }

    #[test]
    fn test_validate_model_rejects_colliding_positions() {
        let mut model = CommandModel::new("Get-Foo");
        model.parameters.push(Parameter::new("Name"));
        model.parameters.push(Parameter::new("Path"));
        model.syntax.push(
            SyntaxSet::named("ByName")
                .with_parameter(SyntaxParameter::new("Name").at_position(0))
                .with_parameter(SyntaxParameter::new("Path").at_position(0)),
        );

        assert_eq!(
            validate_model(&model),
            vec![ValidationError::DuplicatePosition {
                set: "ByName".to_string(),
                position: 0
            }]
        );
    }

    #[test]
    fn test_validate_model_reports_every_problem() {
        let mut model = CommandModel::new("");
        model.syntax.push(SyntaxSet::named("A"));
        model.syntax.push(SyntaxSet::named("a"));
        model.examples.push(Example::new(" "));

        let errors = validate_model(&model);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyCommandName,
                ValidationError::DuplicateSyntaxSet("a".to_string()),
                ValidationError::EmptyExampleTitle(1),
            ]
        );
    }

    #[test]
    fn test_validate_model_accepts_valid_model() {
        let mut model = CommandModel::new("Get-Foo");
        model.parameters.push(Parameter::new("Name"));
        model.syntax.push(
            SyntaxSet::unnamed().with_parameter(SyntaxParameter::new("Name").at_position(0)),
        );
        model.examples.push(Example::new("Example 1"));

        assert!(validate_model(&model).is_empty());
    }
}
