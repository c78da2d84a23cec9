//! Sink implementations
//!
//! Contains LogSink, FileSink, and NullSink.

mod file;
mod log;
mod null;

pub use self::file::FileSink;
pub use self::log::LogSink;
pub use self::null::NullSink;
