/*
 * MLFQ Transition Recorder
 *
 * While recording is on, the MLFQ policy appends an occupancy snapshot every
 * `snapshot_interval` ticks and on every demotion. Snapshots are bounded by
 * `max_snapshots`; once full, further snapshots are silently dropped.
 *
 * The recorder is write-only from the scheduler's point of view: nothing in
 * the dispatch path ever reads it back.
 */

use alloc::vec::Vec;

use heapless::Vec as BoundedVec;

use super::process::{ProcessId, ProcessState};
use super::table::ProcTable;
use crate::config::{NPROC, NQUEUE};

/// Per-level occupancy at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlfqSnapshot {
    /// Tick the snapshot was taken at
    pub tick: u64,

    /// Processes per level
    pub counts: [usize; NQUEUE],

    /// Pids per level, in table order
    pub pids: [BoundedVec<ProcessId, NPROC>; NQUEUE],
}

impl MlfqSnapshot {
    /// Capture level occupancy of the processes whose state passes `include`
    pub fn capture(table: &ProcTable, tick: u64, include: impl Fn(ProcessState) -> bool) -> Self {
        let mut snapshot = MlfqSnapshot {
            tick,
            counts: [0; NQUEUE],
            pids: core::array::from_fn(|_| BoundedVec::new()),
        };

        for process in table.iter() {
            let level = process.sched.queue_level;
            if level >= NQUEUE || !include(process.state()) {
                continue;
            }
            snapshot.counts[level] += 1;
            // At most NPROC processes exist, so the push cannot overflow.
            let _ = snapshot.pids[level].push(process.pid);
        }

        snapshot
    }

    /// Total processes across all levels
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Recorded snapshots plus the recording switch
#[derive(Debug)]
pub struct MlfqRecorder {
    recording: bool,
    capacity: usize,
    last_snapshot_tick: u64,
    snapshots: Vec<MlfqSnapshot>,
}

impl MlfqRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            recording: false,
            capacity,
            last_snapshot_tick: 0,
            snapshots: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Clear old snapshots, start recording and take a baseline
    pub fn start(&mut self, table: &ProcTable, now: u64) {
        self.recording = true;
        self.snapshots.clear();
        self.last_snapshot_tick = now;
        self.record(table, now);
        log::info!("[MLFQ recorder] recording started at tick {}", now);
    }

    /// Stop recording; the buffer is kept for inspection
    pub fn stop(&mut self) {
        self.recording = false;
        log::info!("[MLFQ recorder] recording stopped, {} snapshot(s)", self.snapshots.len());
    }

    /// Append a snapshot of Runnable and Running processes
    ///
    /// No-op when not recording or when the buffer is full.
    pub fn record(&mut self, table: &ProcTable, now: u64) {
        if !self.recording || self.snapshots.len() >= self.capacity {
            return;
        }
        self.snapshots.push(MlfqSnapshot::capture(table, now, |state| {
            matches!(state, ProcessState::Runnable | ProcessState::Running)
        }));
    }

    /// Append a snapshot if `interval` ticks passed since the last periodic one
    pub fn record_periodic(&mut self, table: &ProcTable, now: u64, interval: u64) {
        if self.recording && now >= self.last_snapshot_tick.saturating_add(interval) {
            self.record(table, now);
            self.last_snapshot_tick = now;
        }
    }

    pub fn snapshots(&self) -> &[MlfqSnapshot] {
        &self.snapshots
    }
}
