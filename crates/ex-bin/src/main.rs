//! exline entrypoint: a line-oriented ex front end over the files named on the
//! command line.
use anyhow::Result;
use clap::Parser;
use core_actions::{
    ArgumentList, CommandRegistry, CommandServices, Completion, Dispatcher, ExecutionContext,
    install_builtins,
};
use core_config::Config;
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, LineCommandSource};
use core_state::{EditorContext, EditorState, JumpHistory};
use core_text::{Buffer, SearchOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "exline.log";

/// Typed at the prompt to repeat the last command line.
const REPEAT_LAST: &str = "@:";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "exline", version, about = "Line-oriented ex command front end")]
struct Args {
    /// Files making up the argument list. The first one is opened at startup.
    pub files: Vec<PathBuf>,
    /// Optional configuration file path (overrides discovery of `exline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn run(&mut self, args: &Args) -> Result<ExRuntime> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");

        let config = core_config::load_from(args.config.clone())?;
        let runtime = ExRuntime::new(&config, args.files.clone())?;
        info!(
            target: "runtime.startup",
            files = args.files.len(),
            commands = runtime.registry.len(),
            jump_capacity = runtime.jumps.capacity(),
            config_override = args.config.is_some(),
            "bootstrap_complete"
        );
        Ok(runtime)
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Host side of the command engine: owns the registry, jump history, editor
/// and argument list, and loads whatever file a command selects.
struct ExRuntime {
    registry: CommandRegistry,
    jumps: JumpHistory,
    dispatcher: Dispatcher,
    editor: EditorState,
    args: ArgumentList,
}

impl ExRuntime {
    fn new(config: &Config, files: Vec<PathBuf>) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        let installed = install_builtins(&mut registry);
        debug!(target: "runtime", installed, "builtins_installed");

        let search = SearchOptions {
            wrapscan: config.wrapscan(),
            ignore_case: config.ignorecase(),
        };
        let editor = match files.first() {
            Some(path) => load_document(path)?,
            None => EditorState::new(Buffer::from_str("untitled", "")?),
        };
        Ok(Self {
            registry,
            jumps: JumpHistory::with_capacity(config.jump_capacity()),
            dispatcher: Dispatcher::with_search_options(search),
            editor,
            args: ArgumentList::new(files),
        })
    }

    /// Dispatch one line and return the status line to show for it.
    fn handle_line(&mut self, line: &str) -> Result<String> {
        let mut services = CommandServices {
            registry: &self.registry,
            jumps: &mut self.jumps,
        };
        let mut exec = ExecutionContext::new(&mut self.args);
        let result = if line.trim() == REPEAT_LAST {
            self.dispatcher
                .repeat_last(&mut services, &mut self.editor, &mut exec)
        } else {
            self.dispatcher
                .dispatch(line, &mut services, &mut self.editor, &mut exec)
        };
        let status = exec.take_status();

        if let Some(path) = self.args.take_pending_open().map(Path::to_path_buf) {
            let next = load_document(&path)?;
            self.editor.replace_buffer(next.buffer, next.file_name);
        }
        for followup in self.dispatcher.take_followup_outcomes() {
            debug!(
                target: "runtime",
                line = followup.line.as_str(),
                ok = followup.result.is_ok(),
                "followup_completed"
            );
        }

        Ok(match (result, status) {
            (Err(_), Some(status)) => status,
            (Err(e), None) => e.to_string(),
            (Ok(Completion::Empty), _) => String::new(),
            (Ok(_), Some(status)) => status,
            (Ok(_), None) => self.position_report(),
        })
    }

    fn position_report(&self) -> String {
        let cursor = self.editor.cursor();
        format!(
            "\"{}\" line {} of {} (jumps: {})",
            self.editor.document_id(),
            cursor.line + 1,
            self.editor.line_count(),
            self.jumps.len()
        )
    }

    async fn run(&mut self, mut rx: mpsc::Receiver<Event>) -> Result<()> {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter = span.enter();

        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                Event::Command(line) => {
                    let report = self.handle_line(&line)?;
                    if !report.is_empty() {
                        writeln!(stdout, "{report}")?;
                    }
                }
                Event::Shutdown => {
                    info!(target: "runtime", "shutdown");
                    break;
                }
            }
        }
        rx.close();
        Ok(())
    }
}

/// Open `path`; an unreadable file becomes an empty buffer carrying its name.
fn load_document(path: &Path) -> Result<EditorState> {
    match EditorState::open(path) {
        Ok(state) => Ok(state),
        Err(e) => {
            error!(target: "io", file = %path.display(), error = %e, "file_open_error");
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("file");
            let mut state = EditorState::new(Buffer::from_str(name, "")?);
            state.file_name = Some(path.to_path_buf());
            Ok(state)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let mut runtime = startup.run(&args)?;

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut sources = EventSourceRegistry::new();
    sources.register(LineCommandSource::new(BufReader::new(std::io::stdin())));
    let _source_handles = sources.spawn_all(&tx);
    drop(tx);

    runtime.run(rx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Position;
    use std::fs;
    use tempfile::TempDir;

    fn files(dir: &TempDir) -> Vec<PathBuf> {
        let contents = ["one\ntwo\nthree\n", "alpha\nbeta\n", "  indented\nlast\n"];
        contents
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let path = dir.path().join(format!("f{}.txt", i + 1));
                fs::write(&path, text).unwrap();
                path
            })
            .collect()
    }

    fn runtime(dir: &TempDir) -> ExRuntime {
        ExRuntime::new(&Config::default(), files(dir)).unwrap()
    }

    #[test]
    fn first_file_opened_at_startup() {
        let dir = TempDir::new().unwrap();
        let rt = runtime(&dir);
        assert_eq!(rt.editor.file_name, Some(dir.path().join("f1.txt")));
        assert_eq!(rt.editor.line_count(), 3);
        assert_eq!(rt.jumps.capacity(), core_state::JUMP_HISTORY_MAX);
    }

    #[test]
    fn selected_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime(&dir);
        rt.editor.set_cursor(Position::new(2, 0));

        let report = rt.handle_line("2argument").unwrap();

        assert_eq!(rt.editor.file_name, Some(dir.path().join("f2.txt")));
        assert_eq!(rt.editor.cursor(), Position::origin());
        assert_eq!(rt.jumps.len(), 1);
        assert!(report.ends_with("line 1 of 2 (jumps: 1)"), "{report}");
    }

    #[test]
    fn failures_report_status() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime(&dir);
        assert_eq!(
            rt.handle_line("xyz").unwrap(),
            "E492: Not an editor command: xyz"
        );
        assert_eq!(
            rt.handle_line("@:").unwrap(),
            "E30: No previous command line"
        );
        assert_eq!(
            rt.handle_line("last").unwrap(),
            format!(
                "\"{}\" line 1 of 2 (jumps: 1)",
                dir.path().join("f3.txt").display()
            )
        );
        assert_eq!(
            rt.handle_line("next").unwrap(),
            "E165: Cannot go beyond last file"
        );
    }

    #[test]
    fn repeat_last_runs_remembered_command() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime(&dir);
        rt.handle_line("next").unwrap();
        rt.handle_line("@:").unwrap();
        assert_eq!(rt.editor.file_name, Some(dir.path().join("f3.txt")));
    }

    #[test]
    fn bare_line_number_moves_cursor() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime(&dir);
        rt.handle_line("3").unwrap();
        assert_eq!(rt.editor.cursor(), Position::new(2, 0));
        assert_eq!(rt.handle_line("").unwrap(), "");
    }

    #[test]
    fn missing_file_becomes_empty_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.txt");
        let state = load_document(&path).unwrap();
        assert_eq!(state.file_name.as_deref(), Some(path.as_path()));
        assert_eq!(state.line_count(), 1);
    }

    #[tokio::test]
    async fn event_loop_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let mut rt = runtime(&dir);
        let (tx, rx) = mpsc::channel(8);
        tx.send(Event::Command("last".into())).await.unwrap();
        tx.send(Event::Shutdown).await.unwrap();
        tx.send(Event::Command("first".into())).await.unwrap();

        rt.run(rx).await.unwrap();

        assert_eq!(rt.editor.file_name, Some(dir.path().join("f3.txt")));
    }
}
