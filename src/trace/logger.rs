use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::trace::trace::PhaseEvent;

/// Buffered JSONL sink for the phases of one initialization.
///
/// Intermediate phases are buffered; a terminal phase (`Ready` or `Failed`)
/// flushes, so a finished attempt is on disk even while the logger lives on.
/// I/O failures are reported through `tracing` and never interrupt the pipeline.
pub struct TraceLogger {
    sink: Option<(PathBuf, Mutex<BufWriter<File>>)>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some((path.to_path_buf(), Mutex::new(BufWriter::new(file)))),
            },
            Err(e) => {
                tracing::warn!("could not open trace file '{}': {}", path.display(), e);
                Self { sink: None }
            }
        }
    }

    /// Logger that drops every event.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn log(&self, event: &PhaseEvent) {
        let Some((path, writer)) = &self.sink else {
            return;
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!("failed to serialize {:?} event: {}", event.phase, e);
                return;
            }
        };

        let Ok(mut writer) = writer.lock() else {
            tracing::warn!("trace writer for '{}' poisoned", path.display());
            return;
        };

        let written = writeln!(writer, "{}", json).and_then(|()| {
            if event.phase.is_terminal() {
                writer.flush()
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            tracing::warn!(
                "failed to record {:?} in '{}': {}",
                event.phase,
                path.display(),
                e
            );
        }
    }
}

impl fmt::Debug for TraceLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path() {
            Some(path) => write!(f, "TraceLogger({})", path.display()),
            None => f.write_str("TraceLogger(disabled)"),
        }
    }
}
