// Tue Jan 13 2026 - Alex

use crate::engine::task::{TaskHandle, TaskId};
use crate::engine::trigger::TriggerId;
use serde_json::Value;
use thiserror::Error;

/// Misuse of the scheduler API or a broken registry invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid operation on task {task}: {reason}")]
    InvalidOperation { task: TaskHandle, reason: String },
    #[error("Task id {0} is already live")]
    DuplicateId(TaskId),
    #[error("No task id left to allocate (capacity {0})")]
    ExhaustedIdSpace(usize),
    #[error("Unknown task {0}")]
    UnknownTask(TaskHandle),
    #[error("Unknown trigger {0}")]
    UnknownTrigger(TriggerId),
    #[error("Trigger {0} is closed")]
    TriggerClosed(TriggerId),
    #[error("Scheduler is already running")]
    Reentrant,
}

impl SchedulerError {
    pub fn invalid(task: TaskHandle, reason: impl Into<String>) -> Self {
        SchedulerError::InvalidOperation { task, reason: reason.into() }
    }
}

/// A fault travelling through a task pipeline.
///
/// Faults are data, not panics: a `then` handler returns `Err(Fault)` to
/// switch its task into fault mode, and the next `once` step receives it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    #[error("{0}")]
    Raised(String),
    #[error("Fault value: {0}")]
    Value(Value),
    #[error("Abort: task {task} aborted: {reason}")]
    Aborted { task: TaskHandle, reason: String },
    #[error("SubtaskException: subtask {child} has exception: {source}")]
    Subtask { child: TaskHandle, source: Box<Fault> },
    #[error("Trigger {trigger} failed: {source}")]
    Trigger { trigger: TriggerId, source: Box<Fault> },
}

impl Fault {
    pub fn raise(message: impl Into<String>) -> Self {
        Fault::Raised(message.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Fault::Aborted { .. })
    }

    /// Follows `Subtask`/`Trigger` wrappers down to the fault that started it.
    pub fn root(&self) -> &Fault {
        match self {
            Fault::Subtask { source, .. } | Fault::Trigger { source, .. } => source.root(),
            other => other,
        }
    }

    /// Handles of every task the fault bubbled through, innermost last.
    pub fn path(&self) -> Vec<TaskHandle> {
        let mut path = Vec::new();
        let mut current = self;
        while let Fault::Subtask { child, source } = current {
            path.push(*child);
            current = source;
        }
        path
    }
}

impl From<SchedulerError> for Fault {
    fn from(e: SchedulerError) -> Self {
        Fault::Raised(e.to_string())
    }
}

impl From<Value> for Fault {
    fn from(value: Value) -> Self {
        Fault::Value(value)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Fault::Raised(message.to_string())
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::Raised(message)
    }
}
