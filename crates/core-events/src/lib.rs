//! Event types and channel helpers feeding the exline command loop.
//!
//! Producers push `Event`s into one bounded tokio channel; the runtime drains
//! it on a single consumer so command dispatch stays strictly sequential.

use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Blocking producers (stdin reader) use `blocking_send`, parking the thread while the channel is
// full instead of dropping command lines. A dropped command line would silently change editor
// state, so backpressure is preferred over loss.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 1024;

pub static COMMAND_LINES_READ: AtomicU64 = AtomicU64::new(0);
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One raw ex command line (without trailing newline).
    Command(String),
    Shutdown,
}

/// Trait implemented by any event producer. Implementors hold their configuration and
/// spawn one background task that pushes `Event`s into the shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when the channel closes
    /// or on their own stop condition.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources, spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }
    /// Spawn all registered sources. Each source receives its own `Sender` clone; the caller
    /// should drop its final clone during shutdown so sources observe the closed channel.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Reads newline-terminated command lines from a blocking reader (stdin in the binary)
/// on the blocking thread pool. Emits `Event::Shutdown` at end of input.
pub struct LineCommandSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> LineCommandSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send + 'static> AsyncEventSource for LineCommandSource<R> {
    fn name(&self) -> &'static str {
        "command_lines"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let reader = self.reader;
        tokio::task::spawn_blocking(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::error!(target: "runtime.events", ?e, "command_source_read_error");
                        break;
                    }
                };
                COMMAND_LINES_READ.fetch_add(1, Ordering::Relaxed);
                if tx.blocking_send(Event::Command(line)).is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            }
            if tx.blocking_send(Event::Shutdown).is_err() {
                CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            }
        })
    }
}
