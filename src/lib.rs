// Thu Jan 15 2026 - Alex

//! Single-threaded cooperative task scheduler.
//!
//! Tasks are pipelines of steps (`then`, `once`, `wait`, `wait_for`,
//! `repeat`) driven by an explicit [`Scheduler`]. A task started from
//! inside another task's handler becomes its child: the parent hangs until
//! every child settles, and the first child failure cancels the rest.

pub mod config;
pub mod engine;
pub mod ui;
pub mod utils;

pub use config::{ConfigError, SchedulerConfig};
pub use engine::{
    Args, Context, Emitter, Fault, LoopRange, ManualClock, Scheduler, SchedulerError, Step, TaskHandle,
    TaskOutcome, TaskRef, TaskStatus, TriggerId, TriggerMode,
};
