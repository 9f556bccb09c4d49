//! Configuration loading and parsing.
//!
//! Parses `exline.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [jumps]
//! capacity = 100
//!
//! [search]
//! wrapscan = true
//! ignorecase = false
//! ```
//!
//! Every field has a default. Unknown fields are ignored so older binaries
//! tolerate newer files. A file that fails to parse is reported at WARN and
//! replaced by defaults rather than aborting startup.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "exline.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct JumpsConfig {
    #[serde(default = "JumpsConfig::default_capacity")] // Vim jumplist size
    pub capacity: usize,
}

impl Default for JumpsConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

impl JumpsConfig {
    const fn default_capacity() -> usize {
        100
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "SearchConfig::default_wrapscan")]
    pub wrapscan: bool,
    #[serde(default)]
    pub ignorecase: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wrapscan: Self::default_wrapscan(),
            ignorecase: false,
        }
    }
}

impl SearchConfig {
    const fn default_wrapscan() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub jumps: JumpsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("exline").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Jump history bound; a configured 0 is clamped to 1.
    pub fn jump_capacity(&self) -> usize {
        let raw = self.file.jumps.capacity;
        if raw == 0 {
            info!(target: "config", raw, clamped = 1, "jump_capacity_clamped");
            return 1;
        }
        raw
    }

    pub fn wrapscan(&self) -> bool {
        self.file.search.wrapscan
    }

    pub fn ignorecase(&self) -> bool {
        self.file.search.ignorecase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
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

    fn capture<F: FnOnce()>(f: F) -> String {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        with_default(subscriber, f);
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.jump_capacity(), 100);
        assert!(cfg.wrapscan());
        assert!(!cfg.ignorecase());
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[jumps]\ncapacity = 25\n[search]\nwrapscan = false\nignorecase = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.jump_capacity(), 25);
        assert!(!cfg.wrapscan());
        assert!(cfg.ignorecase());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[search]\nignorecase = true\nunknown = 1\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.jump_capacity(), 100);
        assert!(cfg.wrapscan());
        assert!(cfg.ignorecase());
    }

    #[test]
    fn parse_error_falls_back_with_warning() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[jumps\ncapacity = ").unwrap();
        let path = tmp.path().to_path_buf();
        let mut cfg = None;
        let log_output = capture(|| {
            cfg = Some(load_from(Some(path)).unwrap());
        });
        assert_eq!(cfg.unwrap().jump_capacity(), 100);
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed_using_defaults"));
    }

    #[test]
    fn zero_capacity_clamp_logs_under_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[jumps]\ncapacity = 0\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let mut cap = 0;
        let log_output = capture(|| cap = cfg.jump_capacity());
        assert_eq!(cap, 1);
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("jump_capacity_clamped"));
    }
}
