//! Worker-Node MapReduce Task Processing Library
//!
//! This library crate implements the task processing engine that runs on each
//! worker node of a batch-processing cluster. A central controller hands
//! individual map, combine and reduce tasks to the worker; this crate is
//! responsible for queueing them, running a bounded number of them
//! concurrently, surviving per-task failures, and reporting outcomes back to
//! the controller-facing sinks.
//!
//! ## Architecture Modules
//!
//! - **`processor`**: The task processing engine itself. Owns the pending
//!   queue, the running-task table, the terminal sets, and the scheduler
//!   loop that drives admission and result delivery.
//! - **`actions`**: Built-in map/reduce workloads (word count, line grep)
//!   that ship with the worker binary and double as realistic fixtures.

pub mod actions;
pub mod processor;
