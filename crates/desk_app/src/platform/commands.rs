//! Operator command line parsing.

use desk_core::{Msg, UploadKind};
use thiserror::Error;

/// Screen sections that can be printed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Tickets,
    Logs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    Show(Section),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("`{0}` is not a positive number")]
    InvalidNumber(String),
}

pub const HELP: &str = "\
Commands:
  list                      show the ticket queue and history
  select <key>              review a ticket from the queue
  clear                     clear the selection
  regen                     generate fresh solutions for the selection
  review <n>                open solution #n as the working copy
  edit <text>               replace the working copy text (\\n for newline)
  discard                   drop the working copy
  submit                    post the working copy to the ticket
  refresh                   reload both ticket lists now
  upload-knowledge <path>   upload a module knowledge file
  upload-solved <path>      upload a solved tickets export
  dismiss <id>              dismiss a notice
  logs                      show the polling log
  help                      show this help
  quit                      exit";

/// Parses one input line. An empty line is `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "list" => Command::Show(Section::Tickets),
        "logs" => Command::Show(Section::Logs),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "select" => {
            let key = required(rest, "select", "a ticket key")?;
            Command::Dispatch(Msg::TicketSelected(Some(key.to_string())))
        }
        "clear" => Command::Dispatch(Msg::TicketSelected(None)),
        "regen" => Command::Dispatch(Msg::RegenerateClicked),
        "review" => {
            let n = positive(required(rest, "review", "a solution number")?)?;
            Command::Dispatch(Msg::SolutionChosen(n - 1))
        }
        "edit" => {
            let text = required(rest, "edit", "the new text")?;
            Command::Dispatch(Msg::WorkingCopyEdited(text.replace("\\n", "\n")))
        }
        "discard" => Command::Dispatch(Msg::ReviewDiscarded),
        "submit" => Command::Dispatch(Msg::SubmitClicked),
        "refresh" => Command::Dispatch(Msg::RefreshClicked),
        "upload-knowledge" => upload(UploadKind::Knowledge, rest),
        "upload-solved" => upload(UploadKind::SolvedTickets, rest),
        "dismiss" => {
            let id = positive(required(rest, "dismiss", "a notice id")?)?;
            Command::Dispatch(Msg::NoticeDismissed(id as u64))
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// An upload without a path still reaches the core, which reports it inline.
fn upload(kind: UploadKind, rest: &str) -> Command {
    let path = (!rest.is_empty()).then(|| rest.to_string());
    Command::Dispatch(Msg::UploadRequested { kind, path })
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

fn positive(raw: &str) -> Result<usize, CommandError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::InvalidNumber(raw.to_string())),
    }
}
