//! TOML command file: declares commands and the launcher each one drives.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use relay_core::command_registry::{CommandDefinition, CommandRegistry};
use relay_core::requester::RequesterRole;
use relay_core::RelayError;
use serde::Deserialize;

use crate::collaborators::{PipelineStarter, WorkflowDispatcher};
use crate::launcher::{Launcher, PipelineLauncher, WorkflowLauncher};
use crate::RelayCommandRegistry;

#[derive(Debug, thiserror::Error)]
pub enum CommandFileError {
    #[error("failed to read command file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse command file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid command file: {0}")]
    Invalid(String),
    #[error("invalid command '{name}': {source}")]
    Command {
        name: String,
        #[source]
        source: RelayError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandFile {
    #[serde(default, rename = "command")]
    commands: Vec<CommandSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub name: String,
    pub pattern: String,
    pub allowed_roles: Vec<RequesterRole>,
    #[serde(default)]
    pub pull_request_only: bool,
    pub launcher: LauncherSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LauncherSpec {
    Workflow {
        workflow: String,
        #[serde(default, rename = "ref")]
        git_ref: Option<String>,
        #[serde(default)]
        inputs: BTreeMap<String, String>,
        /// Workflow input that receives the status document id.
        #[serde(default)]
        status_comment_input: Option<String>,
    },
    Pipeline {
        project: String,
        pipeline_id: u64,
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
}

impl LauncherSpec {
    pub fn is_pipeline(&self) -> bool {
        matches!(self, Self::Pipeline { .. })
    }
}

pub fn parse_command_specs(contents: &str) -> Result<Vec<CommandSpec>, toml::de::Error> {
    let file: CommandFile = toml::from_str(contents)?;
    Ok(file.commands)
}

pub fn load_command_specs(path: impl AsRef<Path>) -> Result<Vec<CommandSpec>, CommandFileError> {
    let path_ref = path.as_ref();
    let body = fs::read_to_string(path_ref).map_err(|source| CommandFileError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_command_specs(&body).map_err(|source| CommandFileError::Parse {
        path: path_ref.to_path_buf(),
        source,
    })
}

pub fn requires_pipelines(specs: &[CommandSpec]) -> bool {
    specs.iter().any(|spec| spec.launcher.is_pipeline())
}

/// Checks what the deserializer cannot: names, roles, and launcher targets.
pub fn validate_command_specs(specs: &[CommandSpec]) -> Result<(), CommandFileError> {
    if specs.is_empty() {
        return Err(CommandFileError::Invalid(
            "at least one [[command]] entry is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for spec in specs {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(CommandFileError::Invalid("command name cannot be empty".to_string()));
        }
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(CommandFileError::Invalid(format!("duplicate command '{name}'")));
        }
        if spec.pattern.trim().is_empty() {
            return Err(CommandFileError::Invalid(format!(
                "command '{name}' has an empty pattern"
            )));
        }
        if spec.allowed_roles.is_empty() {
            return Err(CommandFileError::Invalid(format!(
                "command '{name}' must allow at least one role"
            )));
        }
        match &spec.launcher {
            LauncherSpec::Workflow { workflow, .. } if workflow.trim().is_empty() => {
                return Err(CommandFileError::Invalid(format!(
                    "command '{name}' has an empty workflow"
                )));
            }
            LauncherSpec::Pipeline { project, .. } if project.trim().is_empty() => {
                return Err(CommandFileError::Invalid(format!(
                    "command '{name}' has an empty project"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Collaborators launchers are bound to when the registry is built.
#[derive(Clone)]
pub struct LauncherBackends {
    pub workflows: Arc<dyn WorkflowDispatcher>,
    pub pipelines: Option<Arc<dyn PipelineStarter>>,
    pub default_ref: String,
}

fn build_launcher(
    spec: &CommandSpec,
    backends: &LauncherBackends,
) -> Result<Arc<dyn Launcher>, CommandFileError> {
    match &spec.launcher {
        LauncherSpec::Workflow {
            workflow,
            git_ref,
            inputs,
            status_comment_input,
        } => {
            let git_ref = git_ref
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .unwrap_or(backends.default_ref.as_str());
            let mut launcher =
                WorkflowLauncher::new(backends.workflows.clone(), workflow.trim(), git_ref)
                    .with_inputs(inputs.clone());
            if let Some(input) = status_comment_input
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                launcher = launcher.with_status_comment_input(input);
            }
            Ok(Arc::new(launcher))
        }
        LauncherSpec::Pipeline {
            project,
            pipeline_id,
            parameters,
        } => {
            let starter = backends.pipelines.clone().ok_or_else(|| {
                CommandFileError::Invalid(format!(
                    "command '{}' starts a pipeline but no Azure DevOps organization is configured",
                    spec.name.trim()
                ))
            })?;
            Ok(Arc::new(
                PipelineLauncher::new(starter, project.trim(), *pipeline_id)
                    .with_parameters(parameters.clone()),
            ))
        }
    }
}

/// Validates `specs` and binds each command to its launcher, in file order.
pub fn build_command_registry(
    prefix: &str,
    specs: &[CommandSpec],
    backends: &LauncherBackends,
) -> Result<RelayCommandRegistry, CommandFileError> {
    if prefix.trim().is_empty() {
        return Err(CommandFileError::Invalid(
            "bot invocation prefix cannot be empty".to_string(),
        ));
    }
    validate_command_specs(specs)?;

    let mut registry = CommandRegistry::new(prefix);
    for spec in specs {
        let launcher = build_launcher(spec, backends)?;
        let definition = CommandDefinition::new(
            spec.name.trim(),
            &spec.pattern,
            launcher,
            spec.allowed_roles.iter().copied(),
            spec.pull_request_only,
        )
        .map_err(|source| CommandFileError::Command {
            name: spec.name.trim().to_string(),
            source,
        })?;
        registry.register(definition);
    }
    tracing::debug!(commands = registry.len(), prefix, "command registry built");
    Ok(registry)
}
