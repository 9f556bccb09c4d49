//! Editor state: the ambient context ex commands run against.
//!
//! The command core never reaches into a concrete editor; it talks to the
//! [`EditorContext`] trait (cursor, document identity, marks, line search).
//! [`EditorState`] is the buffer-backed implementation used by the `exline`
//! binary and the test suites. Jump history lives in [`jumps`] and is owned
//! by whoever drives dispatch, not by the editor.

use anyhow::Result;
use core_text::{Buffer, LineSearch, Position, SearchDirection, SearchOptions};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod jumps;
pub use jumps::{JUMP_HISTORY_MAX, JumpHistory, JumpLocation};

/// Stable identifier of the document a cursor position belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editor-side surface consumed by range resolution, dispatch and handlers.
///
/// Lines are zero-based here; the ex layer converts to 1-based addresses.
pub trait EditorContext {
    fn cursor(&self) -> Position;
    fn set_cursor(&mut self, position: Position);
    fn document_id(&self) -> DocumentId;
    /// Number of addressable lines (at least 1).
    fn line_count(&self) -> usize;
    fn mark(&self, name: char) -> Option<Position>;
    /// Find the next line matching `pattern` starting after (or before) `from_line`.
    /// `None` searches the whole buffer from its edge.
    fn search_line(
        &self,
        pattern: &str,
        from_line: Option<usize>,
        direction: SearchDirection,
        options: SearchOptions,
    ) -> Result<Option<usize>>;
    /// False for read-only documents; `Writable` commands are refused.
    fn is_writable(&self) -> bool {
        true
    }
    /// Column the cursor lands on after a linewise jump.
    fn first_non_blank(&self, _line: usize) -> usize {
        0
    }
}

/// Buffer-backed editor context.
pub struct EditorState {
    pub buffer: Buffer,
    pub file_name: Option<PathBuf>,
    pub read_only: bool,
    cursor: Position,
    marks: HashMap<char, Position>,
}

impl EditorState {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            file_name: None,
            read_only: false,
            cursor: Position::origin(),
            marks: HashMap::new(),
        }
    }

    /// Load file contents into a fresh state named after the file.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("file")
            .to_string();
        debug!(target: "io", file = %path.display(), size_bytes = content.len(), "file_read_ok");
        let mut state = Self::new(Buffer::from_str(name, &content)?);
        state.file_name = Some(path.to_path_buf());
        Ok(state)
    }

    /// Swap in another document. Cursor returns to the origin and buffer-local marks are dropped.
    pub fn replace_buffer(&mut self, buffer: Buffer, file_name: Option<PathBuf>) {
        self.buffer = buffer;
        self.file_name = file_name;
        self.cursor = Position::origin();
        self.marks.clear();
    }

    /// Set a named mark. Only ASCII letters name marks; other names are refused.
    pub fn set_mark(&mut self, name: char, position: Position) -> bool {
        if !name.is_ascii_alphabetic() {
            return false;
        }
        let mut position = position;
        position.clamp_to(self.buffer.line_count(), |l| self.buffer.line_byte_len(l));
        self.marks.insert(name, position);
        true
    }
}

impl EditorContext for EditorState {
    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) {
        let mut position = position;
        position.clamp_to(self.buffer.line_count(), |l| self.buffer.line_byte_len(l));
        self.cursor = position;
    }

    fn document_id(&self) -> DocumentId {
        match &self.file_name {
            Some(path) => DocumentId::new(path.display().to_string()),
            None => DocumentId::new(self.buffer.name.clone()),
        }
    }

    fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    fn mark(&self, name: char) -> Option<Position> {
        self.marks.get(&name).copied()
    }

    fn search_line(
        &self,
        pattern: &str,
        from_line: Option<usize>,
        direction: SearchDirection,
        options: SearchOptions,
    ) -> Result<Option<usize>> {
        let search = LineSearch::new(pattern, options)?;
        Ok(search.find_line(&self.buffer, from_line, direction))
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }

    fn first_non_blank(&self, line: usize) -> usize {
        self.buffer.first_non_blank(line)
    }
}
