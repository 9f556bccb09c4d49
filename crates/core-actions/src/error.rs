//! Error taxonomy for ex command handling.
//!
//! `Display` output doubles as the user-visible status message, so the
//! strings follow Vim's `E<number>: ...` wording where Vim has one.

use thiserror::Error;

/// Flag contract a parsed command failed to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("E481: No range allowed")]
    RangeNotAllowed,
    #[error("E14: Range required")]
    RangeRequired,
    #[error("E488: Trailing characters")]
    TrailingCharacters,
    #[error("E471: Argument required")]
    ArgumentRequired,
    #[error("E477: No ! allowed")]
    BangNotAllowed,
    #[error("E45: 'readonly' option is set")]
    ReadOnly,
}

/// Raised by a handler's own logic; converted into a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("E16: Invalid range: {0}")]
    MalformedRange(String),
    #[error("E492: Not an editor command: {0}")]
    UnknownCommand(String),
    #[error("E464: Ambiguous use of command: {typed} ({candidates})")]
    AmbiguousCommand { typed: String, candidates: String },
    #[error("E174: Command already exists: {name} (abbreviation {abbreviation}, clashes with {existing})")]
    DuplicateCommand {
        name: String,
        abbreviation: String,
        existing: String,
    },
    #[error("invalid command spec {name:?}: {reason}")]
    InvalidSpec { name: String, reason: String },
    #[error("{reason}: {command}")]
    FlagViolation { command: String, reason: Violation },
    #[error("E20: Mark not set: {0}")]
    MarkNotSet(char),
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("E16: Invalid range")]
    InvalidRange,
    #[error("E30: No previous command line")]
    NoPreviousCommand,
    /// A queued line was dropped because the follow-up limit was reached.
    #[error("E169: Command too recursive (limit {0})")]
    FollowupLimit(usize),
    #[error("command failed: {0}")]
    Rejected(String),
    #[error(transparent)]
    HandlerExecution(#[from] HandlerError),
}
