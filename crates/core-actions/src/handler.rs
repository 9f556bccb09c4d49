//! Handler capability surface: what a command implementation receives and
//! what it reports back to the dispatcher.

use core_state::EditorContext;
use std::collections::VecDeque;
use std::fmt;

use crate::dispatcher::command_parser::ParsedCommand;
use crate::error::HandlerError;
use crate::range::LineRange;
use crate::registry::CommandSpec;

/// Result of a handler run that did not raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Succeeded and moved the user somewhere; the pre-execution cursor is
    /// recorded in jump history.
    Changed,
    /// Succeeded without observable movement (e.g. a zero count).
    Unchanged,
    /// The handler declined to act. Dispatch fails with
    /// `CommandError::Rejected` and nothing is recorded.
    Rejected,
}

/// A command implementation plugged into the registry by a feature module.
pub trait CommandHandler {
    fn execute(
        &self,
        editor: &mut dyn EditorContext,
        exec: &mut ExecutionContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<HandlerOutcome, HandlerError>;
}

/// Host service selecting among the files being edited (Vim's argument list).
pub trait FileSelector {
    fn file_count(&self) -> usize;
    fn current_index(&self) -> Option<usize>;
    /// Make the zero-based `index` the current file. False when it does not exist
    /// or the host refused to open it.
    fn select_file(&mut self, index: usize) -> bool;
}

/// Per-dispatch execution context handed to handlers alongside the editor.
///
/// Carries the host services a handler may call into, the status line the
/// host shows after the command, and follow-up command lines a handler wants
/// run once the current command has finished.
pub struct ExecutionContext<'a> {
    files: &'a mut dyn FileSelector,
    queued: VecDeque<String>,
    status: Option<String>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(files: &'a mut dyn FileSelector) -> Self {
        Self {
            files,
            queued: VecDeque::new(),
            status: None,
        }
    }

    pub fn files(&mut self) -> &mut (dyn FileSelector + 'a) {
        &mut *self.files
    }

    /// Run `line` after the current command reaches success or failure.
    pub fn queue_command(&mut self, line: impl Into<String>) {
        self.queued.push_back(line.into());
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    pub(crate) fn next_queued(&mut self) -> Option<String> {
        self.queued.pop_front()
    }
}

/// A count as typed by the user: 1-based, where 0 means "no count".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedCount(usize);

impl ResolvedCount {
    pub fn new(count: usize) -> Self {
        Self(count)
    }
    pub fn get(self) -> usize {
        self.0
    }
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
    /// Zero-based index handed to backing services (`count - 1`), `None` for 0.
    pub fn index(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for ResolvedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated command ready to execute.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub spec: &'a CommandSpec,
    pub parsed: &'a ParsedCommand,
    /// Resolved range; the cursor line when none was typed. For
    /// `range_is_count` commands the values are counts, not checked lines.
    pub range: LineRange,
    pub(crate) explicit_count: Option<usize>,
}

impl<'a> Invocation<'a> {
    pub fn argument(&self) -> Option<&str> {
        self.parsed.argument.as_deref()
    }

    pub fn bang(&self) -> bool {
        self.parsed.bang
    }

    pub fn has_range(&self) -> bool {
        self.parsed.range.is_some()
    }

    /// Count typed by the user (range for `range_is_count` commands, otherwise
    /// a purely numeric argument), or `default` when none was given or it was 0.
    pub fn count_or(&self, default: usize) -> ResolvedCount {
        ResolvedCount(
            self.explicit_count
                .filter(|c| *c >= 1)
                .unwrap_or(default),
        )
    }
}
