//! Log Reader
//!
//! Handles reading records from the log file, in write order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{LedgerError, Result};

use super::{LogEntry, RECORD_TERMINATOR};

/// Reads records from the log file
///
/// Yields one item per non-blank line. A line that fails to decode comes
/// back as [`LedgerError::Corruption`] and reading continues with the next
/// line; an I/O error ends the iteration.
pub struct LogReader {
    reader: BufReader<File>,
    /// 1-based number of the last line read
    line: u64,
    buf: Vec<u8>,
    done: bool,
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line: 0,
            buf: Vec::new(),
            done: false,
        })
    }

    /// Line number of the most recently returned record
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// Read the next record from the log
    pub fn next_entry(&mut self) -> Option<Result<LogEntry>> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(RECORD_TERMINATOR, &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    let line = trim_line(&self.buf);
                    if line.is_empty() {
                        continue;
                    }
                    return Some(LogEntry::decode(line).map_err(|e| LedgerError::Corruption {
                        line: self.line,
                        reason: e.to_string(),
                    }));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

impl Iterator for LogReader {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry()
    }
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let mut end = buf.len();
    while end > 0 && matches!(buf[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &buf[..end]
}
