//! Built-in file selection commands (`:argument`, `:first`, `:last`,
//! `:next`, `:previous`) and the argument list backing them.

use core_state::EditorContext;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{CommandError, HandlerError};
use crate::flags::{ArgumentRule, CommandFlags, RangeRule};
use crate::handler::{CommandHandler, ExecutionContext, FileSelector, HandlerOutcome, Invocation};
use crate::registry::{CommandRegistry, CommandSpec, Handler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    Argument,
    First,
    Last,
    Next,
    Previous,
}

impl BuiltinCommand {
    pub const ALL: [BuiltinCommand; 5] = [
        BuiltinCommand::Argument,
        BuiltinCommand::First,
        BuiltinCommand::Last,
        BuiltinCommand::Next,
        BuiltinCommand::Previous,
    ];

    /// Vim help notation: mandatory part outside the brackets.
    pub fn notation(self) -> &'static str {
        match self {
            BuiltinCommand::Argument => "argu[ment]",
            BuiltinCommand::First => "fir[st]",
            BuiltinCommand::Last => "la[st]",
            BuiltinCommand::Next => "n[ext]",
            BuiltinCommand::Previous => "prev[ious]",
        }
    }

    pub fn flags(self) -> CommandFlags {
        match self {
            BuiltinCommand::Argument => {
                CommandFlags::new(RangeRule::Optional, ArgumentRule::Optional)
                    .range_is_count()
                    .dont_reopen()
            }
            BuiltinCommand::First | BuiltinCommand::Last => {
                CommandFlags::new(RangeRule::Forbidden, ArgumentRule::Forbidden)
            }
            BuiltinCommand::Next | BuiltinCommand::Previous => {
                CommandFlags::new(RangeRule::Optional, ArgumentRule::Optional)
                    .range_is_count()
                    .with_bang()
            }
        }
    }

    pub fn spec(self) -> Result<CommandSpec, CommandError> {
        CommandSpec::from_notation(self.notation(), self.flags())
    }
}

fn selected(ok: bool) -> HandlerOutcome {
    if ok {
        HandlerOutcome::Changed
    } else {
        HandlerOutcome::Rejected
    }
}

impl CommandHandler for BuiltinCommand {
    fn execute(
        &self,
        _editor: &mut dyn EditorContext,
        exec: &mut ExecutionContext<'_>,
        invocation: &Invocation<'_>,
    ) -> Result<HandlerOutcome, HandlerError> {
        let files = exec.files();
        let outcome = match self {
            BuiltinCommand::Argument => {
                let count = invocation.count_or(0);
                match count.index() {
                    // No count: nothing to select.
                    None => HandlerOutcome::Unchanged,
                    Some(index) => selected(files.select_file(index)),
                }
            }
            BuiltinCommand::First => match files.file_count() {
                0 => HandlerOutcome::Rejected,
                _ => selected(files.select_file(0)),
            },
            BuiltinCommand::Last => match files.file_count() {
                0 => HandlerOutcome::Rejected,
                n => selected(files.select_file(n - 1)),
            },
            BuiltinCommand::Next => {
                let step = invocation.count_or(1).get();
                let target = match files.current_index() {
                    Some(current) => current.checked_add(step),
                    None => step.checked_sub(1),
                };
                match target.filter(|t| *t < files.file_count()) {
                    Some(t) => selected(files.select_file(t)),
                    None => return Err(HandlerError::new("E165: Cannot go beyond last file")),
                }
            }
            BuiltinCommand::Previous => {
                let step = invocation.count_or(1).get();
                let target = files.current_index().and_then(|c| c.checked_sub(step));
                match target {
                    Some(t) => selected(files.select_file(t)),
                    None => return Err(HandlerError::new("E164: Cannot go before first file")),
                }
            }
        };
        debug!(target: "actions.dispatch", command = ?self, ?outcome, current = ?files.current_index(), "builtin_executed");
        Ok(outcome)
    }
}

/// Register every built-in. A spec that fails to register is logged and
/// skipped; the rest still install. Returns how many were registered.
pub fn install_builtins(registry: &mut CommandRegistry) -> usize {
    let mut installed = 0;
    for builtin in BuiltinCommand::ALL {
        let result = builtin
            .spec()
            .and_then(|spec| registry.register(spec, Handler::Builtin(builtin)));
        match result {
            Ok(()) => installed += 1,
            Err(e) => {
                warn!(target: "actions.registry", command = ?builtin, error = %e, "builtin_registration_skipped")
            }
        }
    }
    installed
}

/// Ordered list of files being edited with a current position. The host
/// opens whatever `take_pending_open` reports after each dispatch.
#[derive(Debug, Clone, Default)]
pub struct ArgumentList {
    files: Vec<PathBuf>,
    current: Option<usize>,
    pending: Option<usize>,
}

impl ArgumentList {
    pub fn new(files: Vec<PathBuf>) -> Self {
        let current = (!files.is_empty()).then_some(0);
        Self {
            files,
            current,
            pending: None,
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current.map(|i| self.files[i].as_path())
    }

    /// File selected since the last call, if any.
    pub fn take_pending_open(&mut self) -> Option<&Path> {
        let index = self.pending.take()?;
        self.files.get(index).map(PathBuf::as_path)
    }
}

impl FileSelector for ArgumentList {
    fn file_count(&self) -> usize {
        self.files.len()
    }

    fn current_index(&self) -> Option<usize> {
        self.current
    }

    fn select_file(&mut self, index: usize) -> bool {
        if index >= self.files.len() {
            return false;
        }
        self.current = Some(index);
        self.pending = Some(index);
        true
    }
}
