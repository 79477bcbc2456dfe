pub mod sink;
pub mod writer;

pub use sink::{LogRecord, LogSink, ERROR_TAG, LOG_TAG};
pub use writer::StdoutLog;
