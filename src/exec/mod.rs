// src/exec/mod.rs

//! Task execution layer.
//!
//! Runs the tasks the scheduler dispatches and reports back to the runtime
//! via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that spawns one tokio task per
//!   dispatched node.
//! - [`task_runner`] runs a single node and emits its `TaskCompleted` event.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `PipelineExecutor`; tests substitute fake implementations.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use executor_loop::spawn_executor;
