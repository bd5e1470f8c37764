//! Reads the sources named by a [`MergeConfig`] into command models.

use std::path::PathBuf;

use cmdoc_core::{CommandModel, MergeSource};
use cmdoc_markdown::{LexicalMode, parse_command_file};
use tracing::{debug, warn};

use crate::config::{MergeConfig, SourceEntry};
use crate::error::{ConfigError, Result};

/// A parsed source, ready to merge.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub id: String,
    pub path: PathBuf,
    pub model: CommandModel,
}

impl LoadedSource {
    pub fn as_merge_source(&self) -> MergeSource<'_> {
        MergeSource::new(&self.id, &self.model)
    }
}

/// Picks one command out of a parsed file.
///
/// With a `command` name the match is case-insensitive; without one the
/// first command is used. `id` names the file in errors and logs.
pub fn select_command(
    id: &str,
    mut models: Vec<CommandModel>,
    command: Option<&str>,
) -> Result<CommandModel> {
    match command {
        Some(name) => {
            let index = models
                .iter()
                .position(|model| model.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| ConfigError::CommandNotFound {
                    id: id.to_string(),
                    command: name.to_string(),
                })?;
            Ok(models.swap_remove(index))
        }
        None => {
            if models.len() > 1 {
                warn!(
                    source = id,
                    commands = models.len(),
                    "Source documents several commands; using the first"
                );
            }
            if models.is_empty() {
                return Err(ConfigError::EmptySource(id.to_string()));
            }
            Ok(models.swap_remove(0))
        }
    }
}

/// Reads and parses one source entry.
pub fn load_source(
    entry: &SourceEntry,
    path: PathBuf,
    mode: LexicalMode,
    command: Option<&str>,
) -> Result<LoadedSource> {
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::SourceUnreadable {
        path: path.clone(),
        source,
    })?;
    let file = path.display().to_string();
    let models =
        parse_command_file(&file, &text, mode).map_err(|error| ConfigError::InvalidSource {
            id: entry.id.clone(),
            error,
        })?;
    let model = select_command(&entry.id, models, command)?;
    debug!(source = %entry.id, path = %file, command = %model.name, "Loaded source");

    Ok(LoadedSource {
        id: entry.id.clone(),
        path,
        model,
    })
}

/// Loads every source of `config`, in order.
pub fn load_sources(config: &MergeConfig) -> Result<Vec<LoadedSource>> {
    config
        .sources
        .iter()
        .map(|entry| {
            load_source(
                entry,
                config.resolve(&entry.path),
                config.mode,
                config.command.as_deref(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_command_by_name() {
        let models = vec![CommandModel::new("Get-Foo"), CommandModel::new("Set-Foo")];
        let model = select_command("a", models, Some("set-foo")).unwrap();
        assert_eq!(model.name, "Set-Foo");
    }

    #[test]
    fn test_select_command_reports_missing_name() {
        let models = vec![CommandModel::new("Get-Foo")];
        let err = select_command("a", models, Some("Remove-Foo")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "source 'a' does not document command 'Remove-Foo'"
        );
    }

    #[test]
    fn test_select_command_defaults_to_first() {
        let models = vec![CommandModel::new("Get-Foo"), CommandModel::new("Set-Foo")];
        assert_eq!(select_command("a", models, None).unwrap().name, "Get-Foo");
        assert!(matches!(
            select_command("a", Vec::new(), None),
            Err(ConfigError::EmptySource(_))
        ));
    }
}
