//! Structured command line parsing.
//!
//! Splits a raw ex line into range, command name, bang and argument. Pure:
//! nothing is resolved against the registry or the editor here, so the
//! same `ParsedCommand` can be validated against any command set.
//!
//! * Leading whitespace and `:` characters are skipped.
//! * The name is a run of ASCII letters, or one special character
//!   (`! & < > = @ * # ~`) when no letter follows the range.
//! * `!` directly after a letter name sets `bang`.
//! * The argument is the remainder with leading whitespace trimmed; an
//!   empty remainder is `None`.

use std::fmt;
use tracing::trace;

use crate::error::CommandError;
use crate::range::{Range, parse_range};

const SPECIAL_NAMES: &[char] = &['!', '&', '<', '>', '=', '@', '*', '#', '~'];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    /// Name as typed (possibly abbreviated). Empty for a bare range.
    pub name: String,
    pub range: Option<Range>,
    pub bang: bool,
    pub argument: Option<String>,
}

impl ParsedCommand {
    /// Nothing but whitespace and colons was typed.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.range.is_none() && self.argument.is_none()
    }
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> Result<ParsedCommand, CommandError> {
        let body = raw.trim_start_matches(|c: char| c.is_whitespace() || c == ':');
        let (range, rest) = parse_range(body)?;
        let rest = rest.trim_start();

        let letters = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (name, mut tail) = if letters > 0 {
            rest.split_at(letters)
        } else {
            match rest.chars().next() {
                Some(c) if SPECIAL_NAMES.contains(&c) => rest.split_at(c.len_utf8()),
                _ => ("", rest),
            }
        };

        let mut bang = false;
        if letters > 0
            && let Some(after) = tail.strip_prefix('!')
        {
            bang = true;
            tail = after;
        }

        let argument = tail.trim_start();
        let parsed = ParsedCommand {
            name: name.to_string(),
            range,
            bang,
            argument: (!argument.is_empty()).then(|| argument.to_string()),
        };
        trace!(target: "actions.parse", name = parsed.name.as_str(), bang, has_range = parsed.range.is_some(), "parsed_command");
        Ok(parsed)
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(range) = &self.range {
            write!(f, "{range}")?;
        }
        f.write_str(&self.name)?;
        if self.bang {
            f.write_str("!")?;
        }
        if let Some(arg) = &self.argument {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
