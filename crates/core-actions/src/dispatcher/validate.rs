//! Flag contract enforcement: turns a resolved spec plus parsed command into
//! an `Invocation`, or rejects it before any handler runs.

use core_state::EditorContext;
use core_text::SearchOptions;
use tracing::debug;

use super::command_parser::ParsedCommand;
use crate::error::{CommandError, Violation};
use crate::flags::{Access, ArgumentRule, RangeRule};
use crate::handler::Invocation;
use crate::range::LineRange;
use crate::registry::CommandSpec;

pub(crate) fn validate<'a>(
    spec: &'a CommandSpec,
    parsed: &'a ParsedCommand,
    editor: &dyn EditorContext,
    search: SearchOptions,
) -> Result<Invocation<'a>, CommandError> {
    let flags = spec.flags();
    let violation = |reason: Violation| {
        debug!(target: "actions.dispatch", name = spec.name(), ?reason, "flag_violation");
        CommandError::FlagViolation {
            command: spec.name().to_string(),
            reason,
        }
    };

    match (flags.range, parsed.range.is_some()) {
        (RangeRule::Forbidden, true) => return Err(violation(Violation::RangeNotAllowed)),
        (RangeRule::Required, false) => return Err(violation(Violation::RangeRequired)),
        _ => {}
    }
    match (flags.argument, parsed.argument.is_some()) {
        (ArgumentRule::Forbidden, true) => return Err(violation(Violation::TrailingCharacters)),
        (ArgumentRule::Required, false) => return Err(violation(Violation::ArgumentRequired)),
        _ => {}
    }
    if parsed.bang && !flags.bang {
        return Err(violation(Violation::BangNotAllowed));
    }
    if flags.access == Access::Writable && !editor.is_writable() {
        return Err(violation(Violation::ReadOnly));
    }

    let range = match &parsed.range {
        Some(range) => range.resolve(editor, search)?,
        None => LineRange::current(editor),
    };
    // Counts are not line numbers and may exceed the document.
    if !flags.range_is_count && range.end > editor.line_count() {
        return Err(CommandError::InvalidRange);
    }

    let explicit_count = if flags.range_is_count && parsed.range.is_some() {
        Some(range.end)
    } else {
        parsed
            .argument
            .as_deref()
            .filter(|a| a.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|a| a.parse::<usize>().ok())
    };

    Ok(Invocation {
        spec,
        parsed,
        range,
        explicit_count,
    })
}
