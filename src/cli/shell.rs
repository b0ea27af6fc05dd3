//! Interactive and script-mode shell loops.

use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};

use crate::cli::commands::{self, CommandSpec};
use crate::cli::context::{CliError, CliMode, LoopControl, ShellContext, SCRIPT_ENV};
use crate::cli::output;

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<RegistryHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(RegistryHelper::from_registry(commands::registry())));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);

    while context.running {
        match editor.readline(&context.prompt()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if step(context, line)? == LoopControl::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        if !context.running {
            break;
        }
        let line = line?;
        if step(context, line.trim())? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Parses and dispatches one input line. Per-command failures are reported
/// here and keep the loop running; only session-fatal errors bubble up.
fn step(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("Could not parse input: {err}"));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    match context.dispatch(&command, raw, &args) {
        Ok(LoopControl::Exit) => {
            context.running = false;
            Ok(LoopControl::Exit)
        }
        Ok(LoopControl::Continue) => Ok(LoopControl::Continue),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Completion backed by the command registry: the first word completes to a
/// command name, the second to that command's subcommands.
struct RegistryHelper {
    commands: Vec<CommandCompletion>,
}

struct CommandCompletion {
    name: &'static str,
    subcommands: Vec<String>,
}

impl RegistryHelper {
    fn from_registry(registry: &'static [CommandSpec]) -> Self {
        let commands = registry
            .iter()
            .map(|spec| CommandCompletion {
                name: spec.name,
                subcommands: subcommands_of(spec.usage),
            })
            .collect();
        Self { commands }
    }
}

/// Pulls the `<a|b|c>` alternatives out of a usage string. Single-token
/// placeholders such as `<owner>` are arguments, not subcommands.
fn subcommands_of(usage: &str) -> Vec<String> {
    let Some(open) = usage.find('<') else {
        return Vec::new();
    };
    let Some(close) = usage[open..].find('>') else {
        return Vec::new();
    };
    let alternatives: Vec<String> = usage[open + 1..open + close]
        .split('|')
        .map(str::to_string)
        .collect();
    if alternatives.len() < 2 {
        return Vec::new();
    }
    alternatives
}

impl Helper for RegistryHelper {}

impl Completer for RegistryHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let start = prefix
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let needle = prefix[start..].to_ascii_lowercase();
        let mut earlier = prefix[..start].split_whitespace();

        let candidates = match (earlier.next(), earlier.next()) {
            (None, _) => self
                .commands
                .iter()
                .filter(|command| command.name.starts_with(&needle))
                .map(|command| pair(command.name))
                .collect(),
            (Some(first), None) => self
                .commands
                .iter()
                .find(|command| command.name.eq_ignore_ascii_case(first))
                .map(|command| {
                    command
                        .subcommands
                        .iter()
                        .filter(|name| name.starts_with(&needle))
                        .map(|name| pair(name))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok((start, candidates))
    }
}

fn pair(name: &str) -> Pair {
    Pair {
        display: name.to_string(),
        replacement: name.to_string(),
    }
}

impl Hinter for RegistryHelper {
    type Hint = String;
}

impl Highlighter for RegistryHelper {}

impl Validator for RegistryHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_subcommands_are_extracted() {
        assert_eq!(
            subcommands_of("account <add|list|balance|remove> ..."),
            vec!["add", "list", "balance", "remove"]
        );
        assert!(subcommands_of("open <owner>").is_empty());
        assert!(subcommands_of("help [command]").is_empty());
    }

    #[test]
    fn helper_indexes_every_registered_command() {
        let helper = RegistryHelper::from_registry(commands::registry());
        assert!(helper
            .commands
            .iter()
            .any(|command| command.name == "expense" && command.subcommands.contains(&"edit".to_string())));
        assert_eq!(helper.commands.len(), commands::registry().len());
    }
}
