// src/core/logger.rs

use crate::core::paths;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Log sink writing every record to the debug log file and, optionally, to stderr.
#[derive(Debug)]
struct LogSink {
    file: Option<File>,
    echo: bool,
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        if self.echo || self.file.is_none() {
            io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        io::stderr().flush()
    }
}

/// Initializes the global logger.
///
/// Records go to `~/.ali/ali.log` at `debug` level unless `RUST_LOG` says otherwise.
/// With `echo` (the `--debug` flag) they are also printed to stderr. When the log file
/// cannot be opened, stderr is the only sink and only warnings are shown unless echoing.
///
/// Returns the path of the log file in use, if any.
pub fn init(echo: bool) -> Option<PathBuf> {
    let log_path = paths::ensure_ali_dir()
        .and_then(|_| paths::log_file_path())
        .ok();
    let file = log_path.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let default_level = if file.is_some() || echo { "debug" } else { "warn" };
    let in_use = if file.is_some() { log_path } else { None };

    let result = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", default_level),
    )
    .format_timestamp_secs()
    .target(env_logger::Target::Pipe(Box::new(LogSink { file, echo })))
    .try_init();

    if let Err(e) = result {
        eprintln!("failed to initialize logger: {}", e);
    }
    in_use
}
