/*
 * Process Table Errors
 *
 * Runtime failures are reported by value. Broken invariants (a process marked
 * Running twice, an illegal state edge, a process handing the CPU back while
 * still Running) are not errors: they panic, because the table can no longer
 * be trusted.
 */

/// Process-management error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcError {
    /// No free process-table slot
    Exhausted,
    /// No process with that pid (never existed or already reaped)
    NotFound,
    /// Caller has no children to collect
    NoChildren,
    /// Out-of-range policy id, priority or configuration value
    InvalidArgument,
    /// Kernel stack could not be allocated for a new process
    OutOfMemory,
    /// Caller was killed while waiting for its children
    Killed,
}

impl core::fmt::Display for ProcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProcError::Exhausted => write!(f, "Process table full"),
            ProcError::NotFound => write!(f, "No such process"),
            ProcError::NoChildren => write!(f, "No children"),
            ProcError::InvalidArgument => write!(f, "Invalid argument"),
            ProcError::OutOfMemory => write!(f, "Out of memory for kernel stack"),
            ProcError::Killed => write!(f, "Process killed while waiting"),
        }
    }
}
