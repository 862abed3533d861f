//! Background Tasks Module
//!
//! Contains background tasks that run periodically during node operation.
//!
//! # Tasks
//! - Stats reporter: logs per-group cache statistics at configured intervals

mod stats;

pub use stats::spawn_stats_task;
