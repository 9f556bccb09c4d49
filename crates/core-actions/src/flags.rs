//! Named capability set describing what a command accepts.

/// Whether a line range may precede the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeRule {
    Forbidden,
    #[default]
    Optional,
    Required,
}

/// Whether text may follow the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentRule {
    Forbidden,
    #[default]
    Optional,
    Required,
}

/// Whether the command modifies the document (refused on read-only documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadOnly,
    Writable,
}

/// Flag contract of a command. Fully determines which parts of a parsed
/// command are required, allowed or rejected before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFlags {
    pub range: RangeRule,
    pub argument: ArgumentRule,
    /// The last range address is a count rather than a line (`:3argument`).
    pub range_is_count: bool,
    /// Accepts a trailing `!` after the name.
    pub bang: bool,
    /// Not remembered as the last command line for `@:`.
    pub dont_reopen: bool,
    pub access: Access,
}

impl CommandFlags {
    pub fn new(range: RangeRule, argument: ArgumentRule) -> Self {
        Self {
            range,
            argument,
            ..Self::default()
        }
    }

    pub fn range_is_count(self) -> Self {
        Self {
            range_is_count: true,
            ..self
        }
    }

    pub fn with_bang(self) -> Self {
        Self { bang: true, ..self }
    }

    pub fn dont_reopen(self) -> Self {
        Self {
            dont_reopen: true,
            ..self
        }
    }

    pub fn writable(self) -> Self {
        Self {
            access: Access::Writable,
            ..self
        }
    }
}
