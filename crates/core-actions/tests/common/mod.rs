#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{
    ArgumentList, CommandError, CommandRegistry, CommandServices, Completion, Dispatcher,
    ExecutionContext, install_builtins,
};
use core_state::{EditorContext, EditorState, JumpHistory};
use core_text::{Buffer, Position};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

pub const TEXT: &str = "fn alpha() {}\nlet x = 1;\nfn beta() {}\nlet y = 2;\nfn gamma() {}\n";

/// Everything a host wires together, owned in one place.
pub struct Harness {
    pub registry: CommandRegistry,
    pub jumps: JumpHistory,
    pub dispatcher: Dispatcher,
    pub editor: EditorState,
    pub args: ArgumentList,
    pub status: Option<String>,
}

impl Harness {
    pub fn new(files: usize) -> Self {
        let mut registry = CommandRegistry::new();
        install_builtins(&mut registry);
        Self::with_registry(registry, files)
    }

    pub fn with_registry(registry: CommandRegistry, files: usize) -> Self {
        let files: Vec<PathBuf> = (1..=files)
            .map(|i| PathBuf::from(format!("file{i}.txt")))
            .collect();
        Self {
            registry,
            jumps: JumpHistory::default(),
            dispatcher: Dispatcher::new(),
            editor: EditorState::new(Buffer::from_str("main.rs", TEXT).unwrap()),
            args: ArgumentList::new(files),
            status: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.editor.set_cursor(Position::new(line, 0));
        self
    }

    pub fn dispatch(&mut self, line: &str) -> Result<Completion, CommandError> {
        let mut services = CommandServices {
            registry: &self.registry,
            jumps: &mut self.jumps,
        };
        let mut exec = ExecutionContext::new(&mut self.args);
        let result = self
            .dispatcher
            .dispatch(line, &mut services, &mut self.editor, &mut exec);
        self.status = exec.take_status();
        result
    }

    pub fn repeat_last(&mut self) -> Result<Completion, CommandError> {
        let mut services = CommandServices {
            registry: &self.registry,
            jumps: &mut self.jumps,
        };
        let mut exec = ExecutionContext::new(&mut self.args);
        let result = self
            .dispatcher
            .repeat_last(&mut services, &mut self.editor, &mut exec);
        self.status = exec.take_status();
        result
    }

    pub fn current_file(&self) -> Option<String> {
        self.args
            .current_file()
            .map(|p| p.to_string_lossy().into_owned())
    }

    pub fn jump_lines(&self) -> Vec<usize> {
        self.jumps.iter().map(|j| j.position.line).collect()
    }
}

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

/// Run `f` under a fmt subscriber and return everything it logged at `level` and above.
pub fn capture_logs<F: FnOnce()>(level: Level, f: F) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(BufferWriter {
            inner: buffer.clone(),
        })
        .finish();
    with_default(subscriber, f);
    let bytes = buffer.lock().expect("log buffer poisoned").clone();
    String::from_utf8(bytes).expect("utf8 log output")
}
