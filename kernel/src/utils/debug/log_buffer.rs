/*
 * Buffered Logging System
 *
 * Log lines go into one global ring buffer and are drained by whoever reads
 * the kernel log (a dmesg-style syscall, a debugger, a test). There is no
 * console here; console drivers live outside the scheduling core.
 *
 * The buffer mutex is a leaf lock: nothing else is acquired while it is
 * held, so logging is safe under the process-table lock.
 */

use spin::Mutex;

use super::ring_buffer::RingBuffer;

/// Size of the kernel log
pub const LOG_BUFFER_SIZE: usize = 16 * 1024;

/// Global log buffer
static LOG_BUFFER: Mutex<RingBuffer<LOG_BUFFER_SIZE>> = Mutex::new(RingBuffer::new());

/// Append one complete line (the newline is added here)
pub fn write_line(line: &str) {
    let mut buffer = LOG_BUFFER.lock();
    buffer.write(line.as_bytes());
    buffer.write(b"\n");
}

/// Drain the oldest buffered bytes into `dest`
pub fn read_log(dest: &mut [u8]) -> usize {
    LOG_BUFFER.lock().read(dest)
}

/// Bytes currently buffered and the buffer capacity
pub fn buffer_usage() -> (usize, usize) {
    let buffer = LOG_BUFFER.lock();
    (buffer.len(), buffer.capacity())
}
