/*
 * Sleep/Wakeup Channels
 *
 * A sleeping process records the channel it waits on directly in its
 * process-table slot; there is no separate wait-queue registry. Wakeups scan
 * the table under the same lock that the sleeper held while recording its
 * channel, so a wakeup issued after the channel was recorded always observes
 * the Sleeping state.
 *
 * ## Blocking (process context)
 *
 * ```ignore
 * let guard = BUFFER_LOCK.lock();
 * if guard.is_empty() {
 *     // releases BUFFER_LOCK only after the table lock is held
 *     let resume = proc.block_on(Channel::Device(0), &BUFFER_LOCK, guard);
 * }
 * ```
 *
 * ## Waking (any context, including interrupts)
 *
 * ```ignore
 * kernel.wake_all(Channel::Device(0));
 * ```
 */

use super::process::{ProcessId, ProcessState};
use super::table::ProcTable;

/// Sleep channel identifier
///
/// Opaque to the scheduler: two sleepers wait on the same resource exactly
/// when their channels compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// A parent waiting for one of its children to terminate
    Child(ProcessId),

    /// Timer/clock events
    Timer,

    /// A kernel lock; the lock-ownership provider can name its holder
    Lock(usize),

    /// Generic device or resource
    Device(u32),
}

/// Wake every process sleeping on `channel`
///
/// Must be called with the table lock held. Returns the number of processes
/// made Runnable; waking a channel nobody sleeps on does nothing.
pub(crate) fn wakeup(table: &mut ProcTable, channel: Channel) -> usize {
    let mut woken = 0;
    for process in table.iter_mut() {
        if process.state() == ProcessState::Sleeping && process.channel() == Some(channel) {
            process.transition(ProcessState::Runnable);
            woken += 1;
        }
    }
    if woken > 0 {
        log::debug!("[wakeup] {:?}: {} process(es) runnable", channel, woken);
    }
    woken
}

/// Count processes sleeping on `channel`
///
/// Useful for debugging and diagnostics.
pub(crate) fn waiter_count(table: &ProcTable, channel: Channel) -> usize {
    table
        .iter()
        .filter(|p| p.state() == ProcessState::Sleeping && p.channel() == Some(channel))
        .count()
}
