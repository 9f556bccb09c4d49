//! Command registry: name/abbreviation table built once at startup.
//!
//! Resolution follows the prefix containment law: a typed name `t` selects
//! a spec when `abbreviation ⊆ t ⊆ name` (both prefix relations). When more
//! than one spec contains `t`, an exact name match wins, then the longest
//! abbreviation. Equal-length winners are ambiguous.
//!
//! Built-in commands carry fixed abbreviations and registration refuses any
//! name or abbreviation already taken, so they never tie. User-defined
//! commands (capitalized, Vim `:command` style) accept any prefix of their
//! name that is unique among them; those may share a first letter and are
//! where `AmbiguousCommand` comes from.

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::builtins::BuiltinCommand;
use crate::error::CommandError;
use crate::flags::CommandFlags;
use crate::handler::CommandHandler;

const SPECIAL_NAMES: &[char] = &['!', '&', '<', '>', '=', '@', '*', '#', '~'];

/// Immutable description of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    abbreviation: String,
    flags: CommandFlags,
    user_defined: bool,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        flags: CommandFlags,
    ) -> Result<Self, CommandError> {
        let spec = Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            flags,
            user_defined: false,
        };
        spec.check()?;
        Ok(spec)
    }

    /// Parse Vim help notation: `"argu[ment]"` is name `argument` with
    /// abbreviation `argu`. Without brackets the whole name must be typed.
    pub fn from_notation(notation: &str, flags: CommandFlags) -> Result<Self, CommandError> {
        match notation.split_once('[') {
            Some((abbrev, tail)) => {
                let Some(optional) = tail.strip_suffix(']') else {
                    return Err(CommandError::InvalidSpec {
                        name: notation.to_string(),
                        reason: "unclosed '[' in notation".into(),
                    });
                };
                Self::new(format!("{abbrev}{optional}"), abbrev, flags)
            }
            None => Self::new(notation, notation, flags),
        }
    }

    /// User-defined command: must start with an uppercase letter and resolves
    /// by any prefix that is unique among user commands.
    pub fn user(name: impl Into<String>, flags: CommandFlags) -> Result<Self, CommandError> {
        let name = name.into();
        let Some(first) = name.chars().next().filter(|c| c.is_ascii_uppercase()) else {
            return Err(CommandError::InvalidSpec {
                name,
                reason: "user commands must start with an uppercase letter".into(),
            });
        };
        let spec = Self {
            abbreviation: first.to_string(),
            name,
            flags,
            user_defined: true,
        };
        spec.check()?;
        Ok(spec)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }
    pub fn flags(&self) -> &CommandFlags {
        &self.flags
    }
    pub fn is_user_defined(&self) -> bool {
        self.user_defined
    }

    /// Prefix containment: `abbreviation ⊆ typed ⊆ name`.
    pub fn matches(&self, typed: &str) -> bool {
        typed.starts_with(&self.abbreviation) && self.name.starts_with(typed)
    }

    fn check(&self) -> Result<(), CommandError> {
        let invalid = |reason: &str| CommandError::InvalidSpec {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        let alphabetic =
            !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_alphabetic());
        let special = self.name.len() == 1 && self.name.starts_with(SPECIAL_NAMES);
        if !alphabetic && !special {
            return Err(invalid(
                "name must be ASCII letters or a single special character",
            ));
        }
        if self.abbreviation.is_empty() {
            return Err(invalid("abbreviation must not be empty"));
        }
        if !self.name.starts_with(&self.abbreviation) {
            return Err(invalid("abbreviation must be a prefix of the name"));
        }
        Ok(())
    }
}

/// Tagged handler: built-in variants dispatch statically, feature modules
/// plug in through the `CommandHandler` trait.
pub enum Handler {
    Builtin(BuiltinCommand),
    External(Box<dyn CommandHandler>),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            Handler::External(_) => f.write_str("External(..)"),
        }
    }
}

/// A registry entry: spec plus the handler capability executing it.
#[derive(Debug)]
pub struct RegisteredCommand {
    spec: CommandSpec,
    handler: Handler,
}

impl RegisteredCommand {
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Vec<RegisteredCommand>,
    by_name: HashMap<String, usize>,
    by_abbreviation: HashMap<String, Vec<usize>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Specs in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs().map(CommandSpec::name)
    }

    pub fn register(&mut self, spec: CommandSpec, handler: Handler) -> Result<(), CommandError> {
        if let Some(&idx) = self.by_name.get(&spec.name) {
            return Err(self.duplicate(&spec, idx));
        }
        if let Some(ids) = self.by_abbreviation.get(&spec.abbreviation) {
            let clash = ids
                .iter()
                .copied()
                .find(|&i| !(spec.user_defined && self.entries[i].spec.user_defined));
            if let Some(idx) = clash {
                return Err(self.duplicate(&spec, idx));
            }
        }
        let idx = self.entries.len();
        debug!(target: "actions.registry", name = spec.name.as_str(), abbrev = spec.abbreviation.as_str(), "register_command");
        self.by_name.insert(spec.name.clone(), idx);
        self.by_abbreviation
            .entry(spec.abbreviation.clone())
            .or_default()
            .push(idx);
        self.entries.push(RegisteredCommand { spec, handler });
        Ok(())
    }

    pub fn resolve(&self, typed: &str) -> Result<&CommandSpec, CommandError> {
        self.resolve_entry(typed).map(RegisteredCommand::spec)
    }

    pub fn resolve_entry(&self, typed: &str) -> Result<&RegisteredCommand, CommandError> {
        let mut best: Vec<usize> = Vec::new();
        let mut best_len = 0;
        let prefix_ends = typed.char_indices().map(|(i, c)| i + c.len_utf8());
        for end in prefix_ends {
            let Some(ids) = self.by_abbreviation.get(&typed[..end]) else {
                continue;
            };
            for &idx in ids {
                let spec = &self.entries[idx].spec;
                if !spec.name.starts_with(typed) {
                    continue;
                }
                if spec.name == typed {
                    trace!(target: "actions.registry", typed, "resolve_exact");
                    return Ok(&self.entries[idx]);
                }
                if end > best_len {
                    best.clear();
                    best_len = end;
                }
                if end == best_len {
                    best.push(idx);
                }
            }
        }
        match best.as_slice() {
            [] => Err(CommandError::UnknownCommand(typed.to_string())),
            [idx] => {
                trace!(target: "actions.registry", typed, name = self.entries[*idx].spec.name.as_str(), "resolve_prefix");
                Ok(&self.entries[*idx])
            }
            many => Err(CommandError::AmbiguousCommand {
                typed: typed.to_string(),
                candidates: many
                    .iter()
                    .map(|&i| self.entries[i].spec.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn duplicate(&self, spec: &CommandSpec, existing: usize) -> CommandError {
        CommandError::DuplicateCommand {
            name: spec.name.clone(),
            abbreviation: spec.abbreviation.clone(),
            existing: self.entries[existing].spec.name.clone(),
        }
    }
}
