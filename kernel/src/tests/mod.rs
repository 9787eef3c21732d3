/*
 * Test Suite for the Scheduling Core
 *
 * Scenario tests driving a whole Kernel through the scripted harness. Unit
 * tests of single modules live next to the code.
 *
 * - `lifecycle` - allocation, capacity, fork/exit/reap, reparenting, kill
 * - `wakeup` - sleep/wakeup, block_on lock hand-off, lost-wakeup stress
 * - `policies` - round-robin fairness, priority aging, MLFQ demotion, boost
 *   and recorder, policy switching, dispatcher statistics
 * - `deadlock` - wait-for graph construction and cycle reports
 */

mod lifecycle;
