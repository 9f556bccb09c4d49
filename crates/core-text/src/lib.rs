//! Rope-based text buffer abstraction plus the line search used by ex
//! range addresses (`/pat/`, `?pat?`).

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use ropey::Rope;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// A position inside a buffer expressed as (line index, byte column within that line).
/// Both components are zero-based; ex addresses convert to and from 1-based line numbers
/// at the range layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
    pub fn origin() -> Self {
        Self { line: 0, column: 0 }
    }
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.column = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.column > max_len {
            self.column = max_len;
        }
    }
}

/// Direction of a line search relative to the starting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

/// Options applied when compiling and running a [`LineSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Continue from the other end of the buffer when the edge is reached.
    pub wrapscan: bool,
    pub ignore_case: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            wrapscan: true,
            ignore_case: false,
        }
    }
}

/// Compiled pattern matched line by line.
#[derive(Debug, Clone)]
pub struct LineSearch {
    regex: Regex,
    options: SearchOptions,
}

impl LineSearch {
    pub fn new(pattern: &str, options: SearchOptions) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(options.ignore_case)
            .build()?;
        Ok(Self { regex, options })
    }

    /// Find the first matching line strictly after (forward) or before (backward) `from`.
    /// The starting line itself is only examined again after a full wrap.
    /// `None` starts outside the buffer, so every line is examined once.
    pub fn find_line(
        &self,
        buffer: &Buffer,
        from: Option<usize>,
        direction: SearchDirection,
    ) -> Option<usize> {
        let total = buffer.line_count();
        if total == 0 {
            return None;
        }
        let Some(from) = from else {
            return match direction {
                SearchDirection::Forward => (0..total).find(|&idx| self.matches(buffer, idx)),
                SearchDirection::Backward => {
                    (0..total).rev().find(|&idx| self.matches(buffer, idx))
                }
            };
        };
        let from = from.min(total - 1);
        let steps = if self.options.wrapscan {
            total
        } else {
            match direction {
                SearchDirection::Forward => total - 1 - from,
                SearchDirection::Backward => from,
            }
        };
        (1..=steps)
            .map(|step| match direction {
                SearchDirection::Forward => (from + step) % total,
                SearchDirection::Backward => (from + total - step % total) % total,
            })
            .find(|&idx| self.matches(buffer, idx))
    }

    fn matches(&self, buffer: &Buffer, idx: usize) -> bool {
        buffer
            .line_content(idx)
            .is_some_and(|line| self.regex.is_match(&line))
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Number of addressable lines. A trailing newline does not open an extra
    /// line and an empty buffer still has one (empty) line.
    pub fn line_count(&self) -> usize {
        let lines = self.rope.len_lines();
        let len = self.rope.len_chars();
        if lines > 1 && len > 0 && self.rope.char(len - 1) == '\n' {
            lines - 1
        } else {
            lines.max(1)
        }
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.line_count() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Return the requested line without its line terminator.
    pub fn line_content(&self, idx: usize) -> Option<String> {
        self.line(idx).map(|mut s| {
            if s.ends_with('\n') {
                s.pop();
                if s.ends_with('\r') {
                    s.pop();
                }
            }
            s
        })
    }

    /// Byte length of a line (excluding any newline) for clamping purposes.
    pub fn line_byte_len(&self, idx: usize) -> usize {
        self.line_content(idx).map(|s| s.len()).unwrap_or(0)
    }

    /// Byte column of the first non-blank character on `idx` (0 for blank lines).
    pub fn first_non_blank(&self, idx: usize) -> usize {
        self.line_content(idx)
            .and_then(|s| s.find(|c: char| !c.is_whitespace()))
            .unwrap_or(0)
    }
}
