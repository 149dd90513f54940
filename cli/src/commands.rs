//! Command parsing
//!
//! One command per input line. Parsing is pure; reading files and turning
//! commands into [`SurfaceEvent`]s happens in `main`.

use std::path::PathBuf;
use std::str::FromStr;

use replydesk_core::{Slot, Strategy, SurfaceEvent, Tone};
use thiserror::Error;

/// Help text printed by `help`
pub const HELP: &str = "\
Commands:
  pdf <path>          upload a PDF attachment
  email <path>        upload an email thread (.txt or .eml)
  remove pdf|email    remove an uploaded file
  tone <name>         Professional, Friendly, Assertive, Kind, Enthusiastic
  strategy <name>     Standard, Concise, Elaborate
  summarize           summarize the uploaded files
  generate            generate a reply
  prompt <text>       set the follow-up prompt
  followup [text]     refine the reply (optionally setting the prompt first)
  copy                copy the reply
  download            save the reply to the download directory
  reset               clear everything
  show                print the whole session
  help                print this text
  quit                exit";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Upload a file from disk into a slot
    Upload {
        /// Target slot
        slot: Slot,
        /// File on disk
        path: PathBuf,
    },
    /// Remove a slot's file
    Remove(Slot),
    /// Pick a tone
    Tone(Tone),
    /// Pick a strategy
    Strategy(Strategy),
    /// Summarize uploads
    Summarize,
    /// Generate a reply
    Generate,
    /// Replace the follow-up prompt
    Prompt(String),
    /// Send a follow-up, optionally replacing the prompt first
    Followup(Option<String>),
    /// Copy the reply
    Copy,
    /// Download the reply
    Download,
    /// Reset the session
    Reset,
    /// Print the full session
    Show,
    /// Print help
    Help,
    /// Exit
    Quit,
}

/// Why a line could not be parsed
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    /// Command needs an argument
    #[error("`{command}` needs {what}")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// What is missing
        what: &'static str,
    },

    /// Argument did not parse
    #[error("{0}")]
    Invalid(String),
}

fn parse_slot(word: &str) -> Result<Slot, ParseError> {
    word.parse::<Slot>().map_err(ParseError::Invalid)
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Upload {
                slot: Slot::Pdf,
                path: PathBuf::from(required(rest, "pdf", "a file path")?),
            }),
            "email" => Ok(Self::Upload {
                slot: Slot::Email,
                path: PathBuf::from(required(rest, "email", "a file path")?),
            }),
            "remove" => parse_slot(required(rest, "remove", "pdf or email")?).map(Self::Remove),
            "tone" => required(rest, "tone", "a tone name")?
                .parse()
                .map(Self::Tone)
                .map_err(ParseError::Invalid),
            "strategy" => required(rest, "strategy", "a strategy name")?
                .parse()
                .map(Self::Strategy)
                .map_err(ParseError::Invalid),
            "summarize" => Ok(Self::Summarize),
            "generate" => Ok(Self::Generate),
            // The prompt is kept as typed; only the command word is stripped
            "prompt" => Ok(Self::Prompt(rest.to_string())),
            "followup" => Ok(Self::Followup((!rest.is_empty()).then(|| rest.to_string()))),
            "copy" => Ok(Self::Copy),
            "download" => Ok(Self::Download),
            "reset" => Ok(Self::Reset),
            "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ParseError::Unknown(word.to_string())),
        }
    }
}

impl Command {
    /// Events for commands that need no I/O
    ///
    /// `Upload`, `Show`, `Help` and `Quit` return an empty list; the caller
    /// handles them itself.
    #[must_use]
    pub fn into_events(self) -> Vec<SurfaceEvent> {
        match self {
            Self::Remove(slot) => vec![SurfaceEvent::FileRemoved { slot }],
            Self::Tone(tone) => vec![SurfaceEvent::ToneSelected(tone)],
            Self::Strategy(strategy) => vec![SurfaceEvent::StrategySelected(strategy)],
            Self::Summarize => vec![SurfaceEvent::SummarizeRequested],
            Self::Generate => vec![SurfaceEvent::GenerateRequested],
            Self::Prompt(text) => vec![SurfaceEvent::FollowupPromptChanged(text)],
            Self::Followup(Some(text)) => vec![
                SurfaceEvent::FollowupPromptChanged(text),
                SurfaceEvent::FollowupRequested,
            ],
            Self::Followup(None) => vec![SurfaceEvent::FollowupRequested],
            Self::Copy => vec![SurfaceEvent::CopyRequested],
            Self::Download => vec![SurfaceEvent::DownloadRequested],
            Self::Reset => vec![SurfaceEvent::ResetRequested],
            Self::Upload { .. } | Self::Show | Self::Help | Self::Quit => Vec::new(),
        }
    }
}
