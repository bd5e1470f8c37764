use serde::{Deserialize, Serialize};

use crate::CommandModel;

/// Serializable bundle of the command models of one module.
///
/// A package groups the [`CommandModel`] values parsed from a batch of
/// documents so they can be validated together and handed to an emitter as
/// a single unit.
///
/// # Examples
///
/// ```
/// use cmdoc_core::*;
///
/// let mut package = CommandPackage::new("1.0.0");
/// package.module = Some("Demo".into());
/// package.commands.push(CommandModel::new("Get-Foo"));
/// package.commands.push(CommandModel::new("Set-Foo"));
///
/// assert_eq!(package.command_count(), 2);
/// assert!(package.find_command("set-foo").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPackage {
    /// Model contract version (populated from
    /// [`MODEL_CONTRACT_VERSION`](crate::MODEL_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Package format version (semver string).
    pub version: String,
    /// Optional module name.
    pub module: Option<String>,
    /// Optional package description.
    pub description: Option<String>,
    /// Command models included in this package, in document order.
    pub commands: Vec<CommandModel>,
}

impl CommandPackage {
    /// Creates an empty package.
    ///
    /// The `model_version` is automatically set from
    /// [`MODEL_CONTRACT_VERSION`](crate::MODEL_CONTRACT_VERSION).
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            model_version: Some(crate::MODEL_CONTRACT_VERSION.to_string()),
            version: version.into(),
            module: None,
            description: None,
            commands: Vec::new(),
        }
    }

    /// Returns the number of commands in this package.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Finds a command by name (case-insensitive).
    pub fn find_command(&self, name: &str) -> Option<&CommandModel> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}
