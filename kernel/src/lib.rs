/*
 * Process Scheduling Core
 *
 * The process table, the per-CPU dispatcher with its round-robin,
 * priority-with-aging and MLFQ policies, the sleep/wakeup protocol and a
 * diagnostic deadlock detector, for a small multiprocessor kernel.
 *
 * Everything the core does not own (context switching, kernel stacks, file
 * cleanup, lock ownership, the tick counter) comes in through the traits in
 * `platform`.
 *
 * Boot sequence:
 *
 * ```ignore
 * utils::logger::init(LevelFilter::Info)?;
 * let kernel = scheduler::init(SchedConfig::default(), platform, cpu_count)?;
 * kernel.spawn_root("init")?;
 * kernel.run(cpu_id); // on every CPU
 * ```
 */

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod deadlock;
pub mod error;
pub mod platform;
pub mod scheduler;
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::SchedConfig;
pub use deadlock::DeadlockInfo;
pub use error::ProcError;
pub use platform::Platform;
pub use scheduler::{
    Channel, CpuId, Kernel, PolicyId, Priority, ProcessId, ProcessState, RunningProcess,
};
