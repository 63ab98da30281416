//! Human-readable progress channel.
//!
//! Progress lines are what the user sees while a request runs; they are
//! separate from `tracing` logs.

use std::io::Write;

use tracing::warn;

/// Append-only line channel for status and error messages
pub trait ProgressSink {
    fn line(&mut self, text: &str);
}

/// Collects lines in memory
impl ProgressSink for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.to_string());
    }
}

/// Writes each line to an [`std::io::Write`] target, e.g. stdout
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for WriterSink<W> {
    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.writer, "{}", text).and_then(|()| self.writer.flush()) {
            warn!("progress output failed: {}", err);
        }
    }
}
