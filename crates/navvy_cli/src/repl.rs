use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use navvy::{Navvy, NavvyError};

use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};

pub const PROMPT: &str = "> ";

/// Outcome of handling one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Reads lines from `input` until EOF or `/quit`.
pub fn run(navvy: &mut Navvy, mut input: impl BufRead, out: &mut dyn Write) -> Result<()> {
    let profile = navvy.profile();
    writeln!(
        out,
        "navvy on {} ({} / {}). Type /help for commands.",
        navvy.project_root().display(),
        profile.provider_id,
        profile.model_id
    )?;

    let mut line = String::new();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).context("reading input")? == 0 {
            writeln!(out)?;
            return Ok(());
        }

        if handle_line(navvy, &line, out)? == Flow::Exit {
            return Ok(());
        }
    }
}

/// Dispatches a slash command or sends the line as a message.
///
/// Session errors are reported on `out` and do not end the loop; only
/// failures to write to `out` are returned.
pub fn handle_line(navvy: &mut Navvy, line: &str, out: &mut dyn Write) -> Result<Flow> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(Flow::Continue);
    }

    let Some(command) = parse_slash_command(text) else {
        send(navvy, text, out)?;
        return Ok(Flow::Continue);
    };

    match command {
        SlashCommand::Help => writeln!(out, "{HELP_TEXT}")?,
        SlashCommand::History => {
            for message in navvy.get_history() {
                writeln!(out, "[{}] {}", message.role, message.content)?;
            }
        }
        SlashCommand::Clear => {
            navvy.clear_history();
            writeln!(out, "History cleared.")?;
        }
        SlashCommand::Commits => match navvy.list_commits() {
            Ok(commits) => {
                for commit in commits {
                    writeln!(out, "{commit}")?;
                }
            }
            Err(error) => report(out, &error)?,
        },
        SlashCommand::Undo(target) => match navvy.undo(target.as_deref()) {
            Ok(commit) => writeln!(out, "Reset to {commit}")?,
            Err(error) => report(out, &error)?,
        },
        SlashCommand::Quit => return Ok(Flow::Exit),
        SlashCommand::Unknown(command) => {
            writeln!(out, "Unknown command: {command}. {HELP_TEXT}")?;
        }
    }

    Ok(Flow::Continue)
}

fn send(navvy: &mut Navvy, text: &str, out: &mut dyn Write) -> Result<()> {
    let turn = match navvy.send_message(text) {
        Ok(turn) => turn,
        Err(error) => return report(out, &error),
    };

    for item in turn {
        match item {
            Ok(chunk) => {
                write!(out, "{chunk}")?;
                out.flush()?;
            }
            Err(error) => {
                writeln!(out)?;
                report(out, &error)?;
            }
        }
    }
    writeln!(out)?;

    Ok(())
}

fn report(out: &mut dyn Write, error: &NavvyError) -> Result<()> {
    tracing::debug!(fatal = error.is_fatal(), "turn error: {error:?}");
    writeln!(out, "error: {error}")?;
    Ok(())
}
