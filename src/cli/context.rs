//! Shell state, command dispatch, and error reporting.

use std::env;

use dialoguer::{theme::ColorfulTheme, Confirm};
use strsim::levenshtein;
use thiserror::Error;

use crate::cli::{commands, output};
use crate::config::{ConfigStore, TrackerConfig};
use crate::core::services::ServiceError;
use crate::core::WorkspaceManager;
use crate::domain::Workspace;
use crate::errors::TrackerError;
use crate::storage::JsonStorage;

pub const OWNER_ENV: &str = "FINTRACK_OWNER";
pub const SCRIPT_ENV: &str = "FINTRACK_CLI_SCRIPT";
const DEFAULT_OWNER: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// Fatal shell errors that abort the whole session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Core(#[from] TrackerError),
}

/// Per-command failures. Reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("exit requested")]
    ExitRequested,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("no workspace loaded")]
    WorkspaceNotLoaded,
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Core(#[from] TrackerError),
    #[error("prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),
}

pub type CommandResult = Result<(), CommandError>;

pub struct ShellContext {
    mode: CliMode,
    pub manager: WorkspaceManager,
    pub config: TrackerConfig,
    theme: ColorfulTheme,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let store = ConfigStore::new()?;
        let config = store.load()?;
        let storage = JsonStorage::new(
            config.storage_root.clone(),
            Some(config.backup_retention),
        )?;
        let mut manager = WorkspaceManager::new(Box::new(storage));

        let owner = match env::var(OWNER_ENV) {
            Ok(owner) if !owner.trim().is_empty() => owner,
            _ => manager
                .last_opened()?
                .unwrap_or_else(|| DEFAULT_OWNER.to_string()),
        };
        manager.open_or_create(&owner)?;

        Ok(Self {
            mode,
            manager,
            config,
            theme: ColorfulTheme::default(),
            running: true,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        match self.manager.current_owner() {
            Some(owner) => format!("fintrack:{owner}> "),
            None => "fintrack> ".to_string(),
        }
    }

    pub(crate) fn workspace(&self) -> Result<&Workspace, CommandError> {
        self.manager
            .current
            .as_ref()
            .ok_or(CommandError::WorkspaceNotLoaded)
    }

    pub(crate) fn workspace_mut(&mut self) -> Result<&mut Workspace, CommandError> {
        self.manager
            .current
            .as_mut()
            .ok_or(CommandError::WorkspaceNotLoaded)
    }

    pub(crate) fn amount(&self, value: f64) -> String {
        format!("{}{:.2}", self.config.currency_symbol, value)
    }

    pub(crate) fn confirm(&self, message: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()?)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()
            .map_err(|err| match err {
                dialoguer::Error::IO(io) => CliError::Io(io),
            })
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        match commands::registry().iter().find(|spec| spec.name == command) {
            Some(spec) => match (spec.handler)(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            },
            None => {
                self.suggest_command(raw);
                Ok(LoopControl::Continue)
            }
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let mut suggestions: Vec<_> = commands::registry()
            .iter()
            .map(|spec| (levenshtein(spec.name, input), spec.name))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);
        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{best}`?"));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::info("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::WorkspaceNotLoaded => {
                output::error("No workspace loaded. Use `open <owner>` first.");
                Ok(())
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }
}
