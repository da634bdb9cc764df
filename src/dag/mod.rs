// src/dag/mod.rs

//! Task graph, execution-order resolution, and per-session state.
//!
//! - [`graph`] holds the directed acyclic graph of tasks (arena + name index).
//! - [`resolver`] computes a deterministic topological execution order.
//! - [`session`] is the single-writer status table owned by the scheduler.

pub mod graph;
pub mod resolver;
pub mod session;

pub use graph::{TaskGraph, TaskId};
pub use resolver::execution_order;
pub use session::{CompletionEffects, ExecutionSession, SessionLimits, TaskSlot, TaskStatus};
