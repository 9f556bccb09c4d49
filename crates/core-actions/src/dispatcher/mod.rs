//! Dispatcher driving one command line through parse, resolve, validate and
//! execute.
//!
//! Sub-modules:
//! * `command_parser` - raw line to `ParsedCommand`
//! * `validate`       - flag contract checks and range/count resolution
//!
//! `dispatch` borrows the dispatcher mutably for the whole run, so at most
//! one command is in flight per dispatcher. Lines a handler queues through
//! `ExecutionContext::queue_command` run FIFO after the current command
//! has finished, before `dispatch` returns. Lines queued past
//! `MAX_FOLLOWUPS` are not run; each is reported as a `FollowupLimit` error.

use core_state::{EditorContext, JumpHistory, JumpLocation};
use core_text::{Position, SearchOptions};
use tracing::{debug, trace, warn};

use crate::error::CommandError;
use crate::handler::{CommandHandler, ExecutionContext, HandlerOutcome};
use crate::registry::{CommandRegistry, Handler};

pub mod command_parser;
mod validate;

use command_parser::CommandParser;

/// Upper bound on follow-up lines run for a single dispatch.
pub const MAX_FOLLOWUPS: usize = 64;

/// Shared services a dispatch needs, passed explicitly by the host.
pub struct CommandServices<'a> {
    pub registry: &'a CommandRegistry,
    pub jumps: &'a mut JumpHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Parsing,
    Resolving,
    Validating,
    Executing,
}

/// Successful end state of a dispatched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Executed {
        command: String,
        outcome: HandlerOutcome,
        jump_recorded: bool,
    },
    /// A bare range moved the cursor to `line` (1-based).
    LineJump { line: usize },
    /// Nothing was typed.
    Empty,
}

/// Result of a follow-up line queued by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub line: String,
    pub result: Result<Completion, CommandError>,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    state: DispatchState,
    last_command: Option<String>,
    followups: Vec<DispatchOutcome>,
    search: SearchOptions,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_options(search: SearchOptions) -> Self {
        Self {
            search,
            ..Self::default()
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Last successful line eligible for repetition.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Outcomes of follow-up lines run since the last call, in run order.
    pub fn take_followup_outcomes(&mut self) -> Vec<DispatchOutcome> {
        std::mem::take(&mut self.followups)
    }

    pub fn dispatch(
        &mut self,
        line: &str,
        services: &mut CommandServices<'_>,
        editor: &mut dyn EditorContext,
        exec: &mut ExecutionContext<'_>,
    ) -> Result<Completion, CommandError> {
        let result = self.run(line, services, editor, exec);
        self.finish(line, &result, exec);

        let mut depth = 0;
        while let Some(next) = exec.next_queued() {
            if depth == MAX_FOLLOWUPS {
                warn!(target: "actions.dispatch", depth, line = next.as_str(), "followup_dropped");
                self.followups.push(DispatchOutcome {
                    line: next,
                    result: Err(CommandError::FollowupLimit(MAX_FOLLOWUPS)),
                });
                continue;
            }
            depth += 1;
            debug!(target: "actions.dispatch", line = next.as_str(), depth, "followup_dispatch");
            let followup = self.run(&next, services, editor, exec);
            self.finish(&next, &followup, exec);
            self.followups.push(DispatchOutcome {
                line: next,
                result: followup,
            });
        }
        result
    }

    /// Re-dispatch the remembered last command line (`@:`).
    pub fn repeat_last(
        &mut self,
        services: &mut CommandServices<'_>,
        editor: &mut dyn EditorContext,
        exec: &mut ExecutionContext<'_>,
    ) -> Result<Completion, CommandError> {
        let Some(line) = self.last_command.clone() else {
            let err = CommandError::NoPreviousCommand;
            exec.set_status(err.to_string());
            return Err(err);
        };
        self.dispatch(&line, services, editor, exec)
    }

    fn transition(&mut self, next: DispatchState) {
        trace!(target: "actions.dispatch", from = ?self.state, to = ?next, "state_transition");
        self.state = next;
    }

    fn finish(
        &mut self,
        line: &str,
        result: &Result<Completion, CommandError>,
        exec: &mut ExecutionContext<'_>,
    ) {
        match result {
            Ok(completion) => {
                debug!(target: "actions.dispatch", line, ?completion, "dispatch_succeeded")
            }
            Err(err) => {
                debug!(target: "actions.dispatch", line, error = %err, "dispatch_failed");
                exec.set_status(err.to_string());
            }
        }
        self.transition(DispatchState::Idle);
    }

    fn run(
        &mut self,
        line: &str,
        services: &mut CommandServices<'_>,
        editor: &mut dyn EditorContext,
        exec: &mut ExecutionContext<'_>,
    ) -> Result<Completion, CommandError> {
        self.transition(DispatchState::Parsing);
        let parsed = CommandParser::parse(line)?;
        if parsed.is_empty() {
            return Ok(Completion::Empty);
        }

        if parsed.name.is_empty() {
            if let Some(text) = &parsed.argument {
                return Err(CommandError::UnknownCommand(text.clone()));
            }
            let Some(range) = &parsed.range else {
                return Ok(Completion::Empty);
            };
            self.transition(DispatchState::Validating);
            let target = range.resolve(&*editor, self.search)?;
            let line_no = target.end.clamp(1, editor.line_count().max(1));
            self.transition(DispatchState::Executing);
            services.jumps.save_jump_location(&*editor);
            let column = editor.first_non_blank(line_no - 1);
            editor.set_cursor(Position::new(line_no - 1, column));
            self.last_command = Some(line.to_string());
            return Ok(Completion::LineJump { line: line_no });
        }

        self.transition(DispatchState::Resolving);
        let registry: &CommandRegistry = services.registry;
        let entry = registry.resolve_entry(&parsed.name)?;
        let spec = entry.spec();

        self.transition(DispatchState::Validating);
        let invocation = validate::validate(spec, &parsed, &*editor, self.search)?;

        self.transition(DispatchState::Executing);
        let before = JumpLocation::of(&*editor);
        let outcome = match entry.handler() {
            Handler::Builtin(builtin) => builtin.execute(editor, exec, &invocation),
            Handler::External(handler) => handler.execute(editor, exec, &invocation),
        }
        .inspect_err(|e| {
            warn!(target: "actions.dispatch", name = spec.name(), error = %e, "handler_error")
        })?;

        let jump_recorded = match outcome {
            HandlerOutcome::Rejected => {
                return Err(CommandError::Rejected(spec.name().to_string()));
            }
            HandlerOutcome::Changed => {
                services.jumps.push(before);
                true
            }
            HandlerOutcome::Unchanged => false,
        };
        if !spec.flags().dont_reopen {
            self.last_command = Some(line.to_string());
        }
        Ok(Completion::Executed {
            command: spec.name().to_string(),
            outcome,
            jump_recorded,
        })
    }
}
