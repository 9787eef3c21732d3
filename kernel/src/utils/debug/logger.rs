/*
 * Kernel Logging System
 *
 * Backend for the `log` facade. Every enabled record is formatted as
 * `[LEVEL] message` and appended to the kernel log buffer; long messages
 * are truncated to one line buffer.
 */

use core::fmt::Write;

use heapless::String;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

use super::log_buffer;

/// Longest formatted line kept, without the newline
const LINE_MAX: usize = 256;

/// Logger writing into the kernel log buffer
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record);
        log_buffer::write_line(&line);
    }

    fn flush(&self) {}
}

/// The KernelLogger instance used for logging.
static LOGGER: KernelLogger = KernelLogger;

/// Format a record, truncating what does not fit
fn format_line(record: &Record) -> String<LINE_MAX> {
    let mut line = String::new();
    // A full buffer only cuts the message short.
    let _ = write!(line, "[{}] {}", record.level(), record.args());
    line
}

/// Install the kernel logger with `level` as the maximum level
///
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
