// src/dag/mod.rs

//! Task graph and per-run scheduling.
//!
//! A [`Plan`] composes atomic tasks in series and in parallel; [`DagGraph`]
//! compiles it into dependency edges; [`Scheduler`] walks those edges one
//! run at a time.

pub mod graph;
pub mod node;
pub mod plan;
pub mod scheduler;
pub mod state_manager;

pub use graph::DagGraph;
pub use node::{ScheduledTask, TaskRunState};
pub use plan::{Plan, TaskKind, EXPORTED_TASKS};
pub use scheduler::{Scheduler, SchedulerStep};
