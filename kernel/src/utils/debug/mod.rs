/*
 * Debugging and Logging Utilities
 *
 * This module contains the kernel logger and the in-memory log it writes to.
 */

pub mod log_buffer;
pub mod logger;
pub mod ring_buffer;

pub use log_buffer::{buffer_usage, read_log};
