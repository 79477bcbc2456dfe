//! # Simple stdout sink for debugging and demos.
//!
//! [`StdoutLog`] prints queue records in a human-readable format:
//!
//! ```text
//! [task_queue] Task started for 'uploads'. Tasks: 2
//! [error][task_queue] Task counter is negative for 'uploads'
//! ```
//!
//! Not intended for production use - implement [`LogSink`] over your own
//! logging backend for structured output.

use super::sink::{LogRecord, LogSink};

/// Reference sink that prints every record to stdout.
///
/// Reports every tag as enabled, so a queue constructed with it always logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutLog;

impl LogSink for StdoutLog {
    fn is_level_enabled(&self, _tag: &str) -> bool {
        true
    }

    fn log(&self, tags: &[&str], record: &LogRecord<'_>) {
        let mut prefix = String::new();
        for tag in tags {
            prefix.push('[');
            prefix.push_str(tag);
            prefix.push(']');
        }
        println!("{} {}", prefix, record.message);
    }
}
