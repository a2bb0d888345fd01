//! Output sink shared by all participants of a run.
//!
//! Each line is tagged with the rank that produced it, written through to the
//! configured writer and, for a recording console, kept in arrival order. A
//! participant's own lines come
//! out in the order it emitted them; lines from different participants
//! interleave however the scheduler runs them.

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::warn;

use crate::topology::Rank;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub rank: Rank,
    pub text: String,
}

pub struct Console {
    writer: Mutex<Box<dyn Write + Send>>,
    // Only set for consoles whose lines are read back
    record: Option<SegQueue<Line>>,
}

impl Console {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            record: None,
        }
    }

    /// Like [`Console::new`], but also keeps every line for [`Console::drain`].
    pub fn recording(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            record: Some(SegQueue::new()),
        }
    }

    /// Forward lines to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Record lines without printing them.
    pub fn capture() -> Self {
        Self::recording(Box::new(io::sink()))
    }

    pub fn emit(&self, rank: Rank, text: String) {
        let mut writer = self.writer.lock();
        // Output is informational; a closed stdout must not stop the run
        if let Err(e) = writeln!(writer, "{}", text).and_then(|_| writer.flush()) {
            warn!("Process {} failed to write output: {}", rank, e);
        }
        if let Some(record) = &self.record {
            record.push(Line { rank, text });
        }
    }

    /// Take every line recorded so far, in arrival order. Always empty for a
    /// console that does not record.
    pub fn drain(&self) -> Vec<Line> {
        let Some(record) = &self.record else {
            return Vec::new();
        };
        let mut lines = Vec::with_capacity(record.len());
        while let Some(line) = record.pop() {
            lines.push(line);
        }
        lines
    }
}

/// Lines of one participant, in the order it produced them.
pub fn lines_for(lines: &[Line], rank: Rank) -> Vec<&str> {
    lines
        .iter()
        .filter(|line| line.rank == rank)
        .map(|line| line.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emit_writes_and_records() {
        let buf = SharedBuf::default();
        let console = Console::recording(Box::new(buf.clone()));

        console.emit(1, "process 1 of 5 is running".to_string());
        console.emit(0, "process 0 of 5 is running".to_string());

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(written, "process 1 of 5 is running\nprocess 0 of 5 is running\n");

        let lines = console.drain();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].rank, 1);
        assert_eq!(lines_for(&lines, 0), vec!["process 0 of 5 is running"]);
        assert!(console.drain().is_empty());
    }

    #[test]
    fn test_stdout_style_console_keeps_nothing() {
        let buf = SharedBuf::default();
        let console = Console::new(Box::new(buf.clone()));

        console.emit(0, "process 0 has now finished.".to_string());

        assert_eq!(buf.0.lock().as_slice(), b"process 0 has now finished.\n");
        assert!(console.record.is_none());
        assert!(console.drain().is_empty());
    }
}
