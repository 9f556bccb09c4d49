//! Ex line ranges: parsing address text and resolving it against an editor.
//!
//! Grammar (subset of Vim `:h cmdline-ranges`):
//! * address base: `N`, `.`, `$`, `'x`, `/pat/`, `?pat?`, or nothing
//! * any number of `+N` / `-N` / `+` / `-` offsets after a base
//! * addresses joined by `,` or `;` (`;` moves the current line first)
//! * `%` as shorthand for `1,$`
//!
//! Lines are 1-based here. Resolution does not bounds-check; callers that
//! treat the range as lines reject anything past `$`.

use core_state::EditorContext;
use core_text::{SearchDirection, SearchOptions};
use std::fmt;
use tracing::debug;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBase {
    /// No base text; the current line (also used for bare offsets like `+3`).
    Implicit,
    Line(usize),
    Current,
    Last,
    Mark(char),
    Forward(String),
    Backward(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub base: AddressBase,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Semicolon,
}

/// One address with the separator that preceded it (`None` for the first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeItem {
    pub separator: Option<Separator>,
    pub address: Address,
}

/// Raw range tokens in typed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub items: Vec<RangeItem>,
}

/// Resolved, inclusive, 1-based line span (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// The cursor line; the default range of a command typed without one.
    pub fn current(editor: &dyn EditorContext) -> Self {
        Self::single(editor.cursor().line + 1)
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

impl Address {
    fn implicit() -> Self {
        Self {
            base: AddressBase::Implicit,
            offset: 0,
        }
    }

    fn resolve(
        &self,
        editor: &dyn EditorContext,
        current: usize,
        search: SearchOptions,
    ) -> Result<usize, CommandError> {
        let base = match &self.base {
            AddressBase::Implicit | AddressBase::Current => current,
            AddressBase::Line(n) => *n,
            AddressBase::Last => editor.line_count(),
            AddressBase::Mark(name) => editor
                .mark(*name)
                .map(|p| p.line + 1)
                .ok_or(CommandError::MarkNotSet(*name))?,
            AddressBase::Forward(pat) => {
                search_address(editor, pat, current, SearchDirection::Forward, search)?
            }
            AddressBase::Backward(pat) => {
                search_address(editor, pat, current, SearchDirection::Backward, search)?
            }
        };
        let base = i64::try_from(base).map_err(|_| CommandError::InvalidRange)?;
        let line = base
            .checked_add(self.offset)
            .filter(|l| *l >= 0)
            .ok_or(CommandError::InvalidRange)?;
        usize::try_from(line).map_err(|_| CommandError::InvalidRange)
    }
}

fn search_address(
    editor: &dyn EditorContext,
    pattern: &str,
    current: usize,
    direction: SearchDirection,
    search: SearchOptions,
) -> Result<usize, CommandError> {
    // Line 0 searches from before the top so `0;/pat/` can match line 1.
    let from = match (current, direction) {
        (0, SearchDirection::Forward) => None,
        _ => Some(current.saturating_sub(1)),
    };
    let found = editor
        .search_line(pattern, from, direction, search)
        .map_err(|e| CommandError::MalformedRange(e.to_string()))?;
    found
        .map(|idx| idx + 1)
        .ok_or_else(|| CommandError::PatternNotFound(pattern.to_string()))
}

impl Range {
    /// Resolve against the editor. Only the last two addresses are kept and a
    /// backwards range is swapped.
    pub fn resolve(
        &self,
        editor: &dyn EditorContext,
        search: SearchOptions,
    ) -> Result<LineRange, CommandError> {
        let mut current = editor.cursor().line + 1;
        let mut lines: Vec<usize> = Vec::with_capacity(2);
        for item in &self.items {
            if item.separator == Some(Separator::Semicolon)
                && let Some(&prev) = lines.last()
            {
                current = prev;
            }
            lines.push(item.address.resolve(editor, current, search)?);
            if lines.len() > 2 {
                lines.remove(0);
            }
        }
        let (start, end) = match lines.as_slice() {
            [] => return Ok(LineRange::current(editor)),
            [only] => (*only, *only),
            [a, b, ..] => (*a, *b),
        };
        if start > end {
            debug!(target: "actions.parse", start, end, "backwards_range_swapped");
            return Ok(LineRange {
                start: end,
                end: start,
            });
        }
        Ok(LineRange { start, end })
    }
}

/// Split a leading range off `input`. Returns `None` when no range is present.
pub(crate) fn parse_range(input: &str) -> Result<(Option<Range>, &str), CommandError> {
    let mut items: Vec<RangeItem> = Vec::new();
    let mut rest = input;
    let mut pending: Option<Separator> = None;
    loop {
        rest = rest.trim_start();
        if items.is_empty() && pending.is_none() && rest.starts_with('%') {
            items.push(RangeItem {
                separator: None,
                address: Address {
                    base: AddressBase::Line(1),
                    offset: 0,
                },
            });
            items.push(RangeItem {
                separator: Some(Separator::Comma),
                address: Address {
                    base: AddressBase::Last,
                    offset: 0,
                },
            });
            rest = &rest[1..];
        } else {
            let (address, after) = parse_address(rest)?;
            rest = after;
            match address {
                Some(address) => items.push(RangeItem {
                    separator: pending.take(),
                    address,
                }),
                None => {
                    if let Some(sep) = pending.take() {
                        items.push(RangeItem {
                            separator: Some(sep),
                            address: Address::implicit(),
                        });
                    }
                }
            }
        }
        rest = rest.trim_start();
        let sep = match rest.chars().next() {
            Some(',') => Separator::Comma,
            Some(';') => Separator::Semicolon,
            _ => break,
        };
        if items.is_empty() {
            items.push(RangeItem {
                separator: None,
                address: Address::implicit(),
            });
        }
        pending = Some(sep);
        rest = &rest[1..];
    }
    if items.is_empty() {
        return Ok((None, input));
    }
    Ok((Some(Range { items }), rest))
}

fn parse_address(input: &str) -> Result<(Option<Address>, &str), CommandError> {
    let mut chars = input.chars();
    let (base, mut rest) = match chars.next() {
        Some(c) if c.is_ascii_digit() => {
            let (n, rest) = parse_number(input)?;
            (AddressBase::Line(n), rest)
        }
        Some('.') => (AddressBase::Current, &input[1..]),
        Some('$') => (AddressBase::Last, &input[1..]),
        Some('\'') => match chars.next() {
            Some(mark) if !mark.is_whitespace() => {
                (AddressBase::Mark(mark), &input[1 + mark.len_utf8()..])
            }
            _ => return Err(CommandError::MalformedRange("missing mark name".into())),
        },
        Some(delim @ ('/' | '?')) => {
            let (pattern, rest) = parse_pattern(&input[1..], delim);
            if pattern.is_empty() {
                return Err(CommandError::MalformedRange(
                    "E35: No previous regular expression".into(),
                ));
            }
            let base = if delim == '/' {
                AddressBase::Forward(pattern)
            } else {
                AddressBase::Backward(pattern)
            };
            (base, rest)
        }
        Some('+' | '-') => (AddressBase::Implicit, input),
        _ => return Ok((None, input)),
    };

    let mut offset: i64 = 0;
    loop {
        let sign = match rest.chars().next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => break,
        };
        rest = &rest[1..];
        let amount = if rest.starts_with(|c: char| c.is_ascii_digit()) {
            let (n, after) = parse_number(rest)?;
            rest = after;
            i64::try_from(n).map_err(|_| overflow())?
        } else {
            1
        };
        offset = offset.checked_add(sign * amount).ok_or_else(overflow)?;
    }
    Ok((Some(Address { base, offset }), rest))
}

fn overflow() -> CommandError {
    CommandError::MalformedRange("number too large".into())
}

fn parse_number(input: &str) -> Result<(usize, &str), CommandError> {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let n = input[..end].parse::<usize>().map_err(|_| overflow())?;
    Ok((n, &input[end..]))
}

/// Read a pattern up to the unescaped `delim`. A missing closing delimiter
/// consumes the rest of the line, and a lone trailing `\` is kept as a
/// literal backslash.
fn parse_pattern(input: &str, delim: char) -> (String, &str) {
    let mut pattern = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delim {
            return (pattern, &input[i + c.len_utf8()..]);
        }
        if c == '\\' {
            match chars.next() {
                Some((_, next)) if next == delim => pattern.push(next),
                Some((_, next)) => {
                    pattern.push('\\');
                    pattern.push(next);
                }
                None => pattern.push_str("\\\\"),
            }
            continue;
        }
        pattern.push(c);
    }
    (pattern, "")
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            AddressBase::Implicit => {}
            AddressBase::Line(n) => write!(f, "{n}")?,
            AddressBase::Current => f.write_str(".")?,
            AddressBase::Last => f.write_str("$")?,
            AddressBase::Mark(c) => write!(f, "'{c}")?,
            AddressBase::Forward(p) => write!(f, "/{}/", p.replace('/', "\\/"))?,
            AddressBase::Backward(p) => write!(f, "?{}?", p.replace('?', "\\?"))?,
        }
        match self.offset {
            0 => Ok(()),
            n if n > 0 => write!(f, "+{n}"),
            n => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            match item.separator {
                Some(Separator::Comma) => f.write_str(",")?,
                Some(Separator::Semicolon) => f.write_str(";")?,
                None => {}
            }
            write!(f, "{}", item.address)?;
        }
        Ok(())
    }
}
