//! Ex command dispatch: registry, parser, range resolution, dispatcher and
//! built-in commands.
//!
//! A host builds a [`CommandRegistry`] once at startup (see
//! [`install_builtins`]), then feeds raw command lines to a [`Dispatcher`]
//! together with the editor it acts on and a [`CommandServices`] bundle
//! holding the registry and jump history.

pub mod builtins;
pub mod dispatcher;
pub mod error;
pub mod flags;
pub mod handler;
pub mod range;
pub mod registry;

pub use builtins::{ArgumentList, BuiltinCommand, install_builtins};
pub use dispatcher::command_parser::{CommandParser, ParsedCommand};
pub use dispatcher::{
    CommandServices, Completion, DispatchOutcome, DispatchState, Dispatcher, MAX_FOLLOWUPS,
};
pub use error::{CommandError, HandlerError, Violation};
pub use flags::{Access, ArgumentRule, CommandFlags, RangeRule};
pub use handler::{
    CommandHandler, ExecutionContext, FileSelector, HandlerOutcome, Invocation, ResolvedCount,
};
pub use range::{LineRange, Range};
pub use registry::{CommandRegistry, CommandSpec, Handler, RegisteredCommand};
