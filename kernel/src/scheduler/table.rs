/*
 * Process table
 *
 * Fixed-capacity array of process slots plus the pid counter and the
 * designated root process. The table never locks itself: it is always
 * reached through the kernel state mutex.
 */

use core::array;

use super::process::{Process, ProcessId, ProcessState, SchedAttrs};
use super::types::{ProcessHandle, Priority};
use crate::config::NPROC;
use crate::error::ProcError;

pub struct ProcTable {
    procs: [Process; NPROC],
    next_pid: usize,
    root: Option<ProcessId>,
}

impl ProcTable {
    pub fn new() -> Self {
        Self {
            procs: array::from_fn(|_| Process::unused()),
            next_pid: 1,
            root: None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.procs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.procs.iter_mut()
    }

    /// Slot by index; panics on an index past NPROC
    pub fn slot(&self, index: usize) -> &Process {
        &self.procs[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Process {
        &mut self.procs[index]
    }

    /// Slot index of a live (non-Unused) process
    pub fn find(&self, pid: ProcessId) -> Option<usize> {
        if pid == ProcessId::NONE {
            return None;
        }
        self.procs
            .iter()
            .position(|p| p.pid == pid && !p.is_unused())
    }

    pub fn get(&self, pid: ProcessId) -> Option<&Process> {
        let index = self.find(pid)?;
        Some(&self.procs[index])
    }

    pub fn get_mut(&mut self, pid: ProcessId) -> Option<&mut Process> {
        let index = self.find(pid)?;
        Some(&mut self.procs[index])
    }

    pub fn root(&self) -> Option<ProcessId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, pid: ProcessId) {
        self.root = Some(pid);
    }

    /// Number of non-Unused slots
    pub fn live_count(&self) -> usize {
        self.procs.iter().filter(|p| !p.is_unused()).count()
    }

    /// Reserve the first free slot as an Embryo with the next pid
    pub(crate) fn reserve(
        &mut self,
        name: &str,
        parent: Option<ProcessId>,
        priority: Priority,
        level0_slice: u32,
        now: u64,
    ) -> Result<ProcessHandle, ProcError> {
        let slot = self
            .procs
            .iter()
            .position(|p| p.state() == ProcessState::Unused)
            .ok_or(ProcError::Exhausted)?;

        let pid = ProcessId(self.next_pid);
        self.next_pid += 1;

        self.procs[slot].reserve(pid, name, parent, SchedAttrs::new(priority, level0_slice, now));
        Ok(ProcessHandle { slot, pid })
    }
}

impl Default for ProcTable {
    fn default() -> Self {
        Self::new()
    }
}
