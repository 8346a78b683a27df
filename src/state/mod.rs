//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskState`: How a scheduled task ended (parsed, dead link, robots denied, ...)
//! - `HostState`: Per-host request pacing and counters

mod host_state;
mod task_state;

pub use host_state::HostState;
pub use task_state::TaskState;
