// Tue Jan 13 2026 - Alex

pub mod builder;
pub mod clock;
pub mod context;
pub mod error;
pub mod looping;
mod observer;
pub mod registry;
pub mod result;
pub mod scheduler;
pub mod step;
pub mod task;
mod timer;
pub mod trigger;

pub use builder::TaskRef;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::Context;
pub use error::{Fault, SchedulerError};
pub use looping::{Bound, LoopRange, Stride};
pub use registry::{RegistryState, TaskRegistry};
pub use result::{Flow, TaskOutcome};
pub use scheduler::Scheduler;
pub use step::{Args, Step, StepKind};
pub use task::{Task, TaskHandle, TaskId, TaskSnapshot, TaskStatus};
pub use trigger::{Emitter, TriggerId, TriggerMode};
