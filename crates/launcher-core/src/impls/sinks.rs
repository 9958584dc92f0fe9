//! DiagnosticSink implementations.

use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::LaunchError;
use crate::ports::{Diagnostic, DiagnosticSink};

/// Writes each diagnostic as one line and flushes immediately, so the
/// Started line is on disk even if the program later hangs until the hard
/// wall-clock limit.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl WriterSink<io::Stdout> {
    /// The scheduler routes the launcher's stdout to the `-o` file.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), LaunchError> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(writer, "{diagnostic}").map_err(LaunchError::Diagnostics)?;
        writer.flush().map_err(LaunchError::Diagnostics)
    }
}

/// テスト用: emit された Diagnostic を保持する
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Diagnostic> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), LaunchError> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic.clone());
        Ok(())
    }
}
