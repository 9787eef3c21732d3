/*
 * Process Lifecycle Tests
 *
 * Allocation and table capacity, fork/exit/reap, reparenting of orphans,
 * kill delivery and the fatal paths of the lifecycle.
 */

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex as StdMutex};

use serial_test::serial;

use super::harness::{Harness, reaper, trace};
use crate::config::{NPROC, SchedConfig};
use crate::error::ProcError;
use crate::platform::{AtomicTicks, Platform};
use crate::scheduler::{
    self, Channel, PolicyId, ProcessHandle, ProcessId, ProcessState, ReapOutcome,
};

fn rr_harness() -> Harness {
    let h = Harness::new();
    h.kernel.set_policy(PolicyId::RoundRobin);
    h
}

#[test]
fn table_fills_up_and_frees_a_slot_on_reap() {
    let h = rr_harness();
    let root = h.kernel.spawn_root("init").unwrap();
    let reaped = trace();
    h.script(root, reaper(&reaped));

    let mut handles = Vec::new();
    for i in 1..NPROC {
        handles.push(h.kernel.allocate(&format!("p{}", i)).unwrap());
    }
    assert_eq!(h.kernel.sysinfo().nproc, NPROC);
    assert_eq!(h.kernel.allocate("overflow"), Err(ProcError::Exhausted));

    // Only the last one ever runs; it exits straight away.
    let last = *handles.last().unwrap();
    h.kernel.make_runnable(last).unwrap();
    h.script(last.pid, |p| p.exit());

    h.round();
    assert_eq!(h.state(last.pid), Some(ProcessState::Zombie));
    assert_eq!(h.state(root), Some(ProcessState::Runnable));

    h.round();
    assert_eq!(reaped.lock().unwrap().as_slice(), &[last.pid]);
    assert_eq!(h.state(last.pid), None);
    assert_eq!(h.stacks.freed.load(Ordering::SeqCst), 1);

    let again = h.kernel.allocate("again").unwrap();
    assert_eq!(again.slot, last.slot);
    assert!(again.pid > last.pid);
}

#[test]
fn stack_failure_rolls_the_slot_back() {
    let h = Harness::new();
    h.stacks.fail_next.store(true, Ordering::SeqCst);

    assert_eq!(h.kernel.allocate("doomed"), Err(ProcError::OutOfMemory));
    assert_eq!(h.kernel.sysinfo().nproc, 0);
    assert!(h.kernel.processes().is_empty());

    let next = h.kernel.allocate("fine").unwrap();
    assert_eq!(next.slot, 0);
    assert_eq!(next.pid, ProcessId(2));
}

#[test]
fn make_runnable_checks_the_handle() {
    let h = Harness::new();
    let handle = h.kernel.allocate("p").unwrap();
    assert_eq!(h.state(handle.pid), Some(ProcessState::Embryo));

    let stale = ProcessHandle {
        slot: handle.slot,
        pid: ProcessId(99),
    };
    assert_eq!(h.kernel.make_runnable(stale), Err(ProcError::NotFound));
    let bogus = ProcessHandle {
        slot: NPROC + 3,
        pid: handle.pid,
    };
    assert_eq!(h.kernel.make_runnable(bogus), Err(ProcError::NotFound));

    h.kernel.make_runnable(handle).unwrap();
    assert_eq!(h.state(handle.pid), Some(ProcessState::Runnable));
    assert_eq!(h.kernel.make_runnable(handle), Err(ProcError::InvalidArgument));
}

#[test]
fn reap_without_children_reports_no_children() {
    let h = rr_harness();
    let lonely = h.spawn("lonely");
    let result = Arc::new(StdMutex::new(None));
    let seen = result.clone();
    h.script(lonely, move |p| {
        *seen.lock().unwrap() = Some(p.reap());
        p.yield_now();
    });

    h.round();
    assert_eq!(*result.lock().unwrap(), Some(Err(ProcError::NoChildren)));
    assert_eq!(h.state(lonely), Some(ProcessState::Runnable));
}

#[test]
fn fork_inherits_priority_and_level() {
    let h = rr_harness();
    let parent = h.spawn("parent");
    h.kernel.set_priority(parent, 7).unwrap();

    let child = Arc::new(StdMutex::new(None));
    let slot = child.clone();
    h.script(parent, move |p| {
        if slot.lock().unwrap().is_none() {
            *slot.lock().unwrap() = Some(p.fork("child").unwrap());
        }
        p.yield_now();
    });

    h.round();
    let child = child.lock().unwrap().unwrap();
    let info = h.info(child);
    assert_eq!(info.ppid, Some(parent));
    assert_eq!(info.priority.0, 7);
    assert_eq!(info.mlfq_level, h.info(parent).mlfq_level);
    assert_eq!(info.name.as_str(), "child");
}

#[test]
fn exit_reparents_children_and_wakes_the_root_for_zombies() {
    let h = rr_harness();
    let root = h.kernel.spawn_root("init").unwrap();
    let reaped = trace();
    h.script(root, reaper(&reaped));

    // parent -> middle -> {zombie, live}
    let parent = h.spawn("parent");
    let forked = Arc::new(StdMutex::new(Vec::new()));

    let record = forked.clone();
    let h_switch = h.switch.clone();
    h.script(parent, move |p| {
        let middle = p.fork("middle").unwrap();
        record.lock().unwrap().push(middle);

        let record = record.clone();
        let h_switch2 = h_switch.clone();
        let mut exited = false;
        h_switch.set(middle, move |m| {
            if exited {
                return m.yield_now();
            }
            if record.lock().unwrap().len() == 1 {
                let zombie = m.fork("zombie").unwrap();
                let live = m.fork("live").unwrap();
                record.lock().unwrap().extend([zombie, live]);
                h_switch2.set(zombie, |z| z.exit());
                m.yield_now();
            } else {
                exited = true;
                m.exit();
            }
        });
        // Not waiting for children, so the middle's exit must not wake it.
        p.sleep_on(Channel::Timer);
    });

    // Round 1: root blocks in reap, parent forks middle and sleeps, middle
    // forks both children, the zombie exits, the live child yields.
    h.round();
    let pids = forked.lock().unwrap().clone();
    let (middle, zombie, live) = (pids[0], pids[1], pids[2]);
    assert_eq!(h.state(root), Some(ProcessState::Sleeping));
    assert_eq!(h.state(zombie), Some(ProcessState::Zombie));
    assert_eq!(h.info(zombie).ppid, Some(middle));

    // Round 2: middle exits.
    h.round();
    assert_eq!(h.state(middle), Some(ProcessState::Zombie));
    assert_eq!(h.info(middle).ppid, Some(parent));
    assert_eq!(h.info(zombie).ppid, Some(root));
    assert_eq!(h.info(live).ppid, Some(root));
    assert_eq!(h.state(root), Some(ProcessState::Runnable));
    assert_eq!(h.state(parent), Some(ProcessState::Sleeping));
    assert_eq!(h.cleanup.released.lock().unwrap().as_slice(), &[zombie, middle]);

    // Round 3: the root collects the adopted zombie.
    h.round();
    assert_eq!(reaped.lock().unwrap().as_slice(), &[zombie]);
    assert_eq!(h.state(zombie), None);
}

#[test]
fn kill_wakes_a_sleeper_which_then_exits() {
    let h = rr_harness();
    let victim = h.spawn("victim");
    h.script(victim, |p| {
        if p.is_killed() {
            p.exit();
        } else {
            p.sleep_on(Channel::Device(3));
        }
    });

    h.round();
    assert_eq!(h.state(victim), Some(ProcessState::Sleeping));

    h.kernel.signal_kill(victim).unwrap();
    assert_eq!(h.state(victim), Some(ProcessState::Runnable));
    assert_eq!(h.kernel.waiter_count(Channel::Device(3)), 0);

    h.round();
    assert_eq!(h.state(victim), Some(ProcessState::Zombie));

    assert_eq!(h.kernel.signal_kill(ProcessId(999)), Err(ProcError::NotFound));
}

#[test]
fn killed_reaper_stops_waiting() {
    let h = rr_harness();
    h.kernel.spawn_root("init").unwrap();
    let parent = h.spawn("parent");
    let outcomes = Arc::new(StdMutex::new(Vec::new()));

    let log = outcomes.clone();
    let mut forked = false;
    h.script(parent, move |p| {
        if !forked {
            forked = true;
            p.fork("child").unwrap();
            return p.yield_now();
        }
        let outcome = p.reap();
        log.lock().unwrap().push(outcome);
        match outcome {
            Ok(ReapOutcome::Blocked) => {}
            Err(ProcError::Killed) => p.exit(),
            _ => p.yield_now(),
        }
    });

    h.rounds(2);
    assert_eq!(h.state(parent), Some(ProcessState::Sleeping));

    h.kernel.signal_kill(parent).unwrap();
    h.round();
    assert_eq!(
        outcomes.lock().unwrap().as_slice(),
        &[Ok(ReapOutcome::Blocked), Err(ProcError::Killed)]
    );
    assert_eq!(h.state(parent), Some(ProcessState::Zombie));
}

#[test]
#[should_panic(expected = "root process")]
fn root_exit_is_fatal() {
    let h = Harness::new();
    let root = h.kernel.spawn_root("init").unwrap();
    h.script(root, |p| p.exit());
    h.round();
}

#[test]
#[should_panic(expected = "still Running")]
fn returning_without_giving_up_the_cpu_is_fatal() {
    let h = Harness::new();
    let pid = h.spawn("rude");
    h.script(pid, |_| {});
    h.round();
}

#[test]
#[should_panic(expected = "after giving up the CPU")]
fn ending_a_burst_twice_is_fatal() {
    let h = Harness::new();
    let pid = h.spawn("twice");
    h.script(pid, |p| {
        p.yield_now();
        p.yield_now();
    });
    h.round();
}

#[test]
fn reporting_covers_every_live_process() {
    let h = rr_harness();
    h.ticks.set(40);
    let root = h.kernel.spawn_root("init").unwrap();
    let worker = h.spawn("worker");
    h.kernel.allocate("embryo").unwrap();

    h.rounds(3);
    h.ticks.set(45);

    let listing = h.kernel.processes();
    assert_eq!(listing.len(), 3);
    let names: Vec<&str> = listing.iter().map(|info| info.name.as_str()).collect();
    assert_eq!(names, ["init", "worker", "embryo"]);
    assert_eq!(listing[1].ppid, Some(root));
    assert_eq!(listing[1].created_tick, 40);
    assert_eq!(listing[1].cpu_ticks, 3);
    assert_eq!(listing[2].state, ProcessState::Embryo);
    assert_eq!(listing[2].cpu_ticks, 0);

    let sys = h.kernel.sysinfo();
    assert_eq!(sys.nproc, 3);
    assert_eq!(sys.ticks, 45);
    assert_eq!(h.kernel.process(worker).unwrap().state, ProcessState::Runnable);
    assert_eq!(h.kernel.current(crate::scheduler::CpuId::BSP), None);
    assert_eq!(format!("{}", listing[1]), format!("{} runble worker", worker.0));
    h.kernel.procdump();
}

#[test]
fn kernel_rejects_bad_configuration() {
    let platform = || Platform::new(Arc::new(super::harness::Scripted::default()));

    let mut config = SchedConfig::default();
    config.time_slices[1] = 0;
    assert!(matches!(
        crate::scheduler::Kernel::new(config, platform(), 1),
        Err(ProcError::InvalidArgument)
    ));
    assert!(matches!(
        crate::scheduler::Kernel::new(SchedConfig::default(), platform(), 0),
        Err(ProcError::InvalidArgument)
    ));
    assert!(matches!(
        crate::scheduler::Kernel::new(SchedConfig::default(), platform(), crate::config::NCPU + 1),
        Err(ProcError::InvalidArgument)
    ));
}

#[test]
#[serial]
fn global_kernel_is_initialized_once() {
    let ticks = Arc::new(AtomicTicks::new());
    let platform = Platform::new(Arc::new(super::harness::Scripted::default())).with_ticks(ticks);

    let first = scheduler::init(SchedConfig::default(), platform.clone(), 2).unwrap();
    let second = scheduler::init(SchedConfig::default(), platform, 1).unwrap();
    assert!(core::ptr::eq(first, second));
    assert!(scheduler::kernel().is_some_and(|k| core::ptr::eq(k, first)));
    assert_eq!(first.cpu_count(), 2);
}
