// Tue Jan 13 2026 - Alex

use crate::engine::error::Fault;
use crate::engine::step::{Args, Step, StepKind};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;

/// Slot index in the scheduler arena plus the slot's generation. Stays
/// valid across resets and after completion; goes stale once the task is
/// released and its slot handed to a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// Registry id; handed back to the pool when the task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub(crate) u32);

impl TaskHandle {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl TaskId {
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        if self.generation > 0 {
            write!(f, "/{}", self.generation)?;
        }
        Ok(())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Idle,
    Hanging,
    Firing,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Hanging => "hanging",
            TaskStatus::Firing => "firing",
            TaskStatus::Success => "success",
            TaskStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Task {
    pub(crate) handle: TaskHandle,
    pub(crate) id: TaskId,
    pub(crate) label: Option<String>,
    pub(crate) status: TaskStatus,
    /// Bumped whenever queued resumptions for this task must be dropped.
    pub(crate) epoch: u64,
    pub(crate) pending_steps: VecDeque<Step>,
    pub(crate) completed_steps: Vec<StepKind>,
    history_limit: usize,
    pub(crate) last_args: Args,
    pub(crate) last_result: Option<Value>,
    pub(crate) last_error: Option<Fault>,
    pub(crate) focused: bool,
    pub(crate) observer: Option<TaskHandle>,
    pub(crate) linked: bool,
    pub(crate) notified: bool,
    pub(crate) pending_children: Vec<TaskHandle>,
    pub(crate) collected: Vec<Value>,
    pub(crate) deferred_fault: Option<Fault>,
    /// Released as soon as it completes; nothing outside holds its handle.
    pub(crate) transient: bool,
    /// Placeholder for a released slot waiting to be reused.
    pub(crate) vacant: bool,
}

impl Task {
    pub(crate) fn new(handle: TaskHandle, id: TaskId, history_limit: usize) -> Self {
        Self {
            handle,
            id,
            label: None,
            status: TaskStatus::Idle,
            epoch: 0,
            pending_steps: VecDeque::new(),
            completed_steps: Vec::new(),
            history_limit,
            last_args: Vec::new(),
            last_result: None,
            last_error: None,
            focused: false,
            observer: None,
            linked: false,
            notified: false,
            pending_children: Vec::new(),
            collected: Vec::new(),
            deferred_fault: None,
            transient: false,
            vacant: false,
        }
    }

    pub(crate) fn vacant(handle: TaskHandle) -> Self {
        let mut task = Task::new(handle, TaskId(u32::MAX), 0);
        task.vacant = true;
        task
    }

    /// Starts a new generation under the same handle.
    pub(crate) fn reinit(&mut self, id: TaskId) {
        let label = self.label.take();
        let epoch = self.epoch + 1;
        *self = Task::new(self.handle, id, self.history_limit);
        self.label = label;
        self.epoch = epoch;
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn observer(&self) -> Option<TaskHandle> {
        self.observer
    }

    pub fn pending_children(&self) -> &[TaskHandle] {
        &self.pending_children
    }

    pub fn collected(&self) -> &[Value] {
        &self.collected
    }

    pub fn pending_step_count(&self) -> usize {
        self.pending_steps.len()
    }

    pub fn completed_steps(&self) -> &[StepKind] {
        &self.completed_steps
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&Fault> {
        self.last_error.as_ref()
    }

    pub(crate) fn has_outstanding_children(&self) -> bool {
        self.collected.len() < self.pending_children.len()
    }

    pub(crate) fn record_step(&mut self, kind: StepKind) {
        if self.history_limit == 0 {
            return;
        }
        if self.completed_steps.len() >= self.history_limit {
            self.completed_steps.remove(0);
        }
        self.completed_steps.push(kind);
    }

    pub(crate) fn cancel_resumptions(&mut self) {
        self.epoch += 1;
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            handle: self.handle,
            id: self.id,
            label: self.label.clone(),
            status: self.status,
            pending_steps: self.pending_steps.iter().map(Step::kind).collect(),
            completed_steps: self.completed_steps.clone(),
            last_result: self.last_result.clone(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
            observer: self.observer,
            pending_children: self.pending_children.clone(),
            collected: self.collected.len(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("handle", &self.handle)
            .field("id", &self.id)
            .field("status", &self.status)
            .field("pending_steps", &self.pending_steps.len())
            .field("observer", &self.observer)
            .field("pending_children", &self.pending_children)
            .finish()
    }
}

/// Point-in-time view of a task, for logs and tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub handle: TaskHandle,
    pub id: TaskId,
    pub label: Option<String>,
    pub status: TaskStatus,
    pub pending_steps: Vec<StepKind>,
    pub completed_steps: Vec<StepKind>,
    pub last_result: Option<Value>,
    pub last_error: Option<String>,
    pub observer: Option<TaskHandle>,
    pub pending_children: Vec<TaskHandle>,
    pub collected: usize,
}

impl fmt::Display for TaskSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} [{}]", self.handle, self.status)?;
        if let Some(label) = &self.label {
            write!(f, " '{}'", label)?;
        }
        if !self.completed_steps.is_empty() {
            write!(f, " ran: {}", self.completed_steps.iter().join(" -> "))?;
        }
        if !self.pending_children.is_empty() {
            write!(f, " waiting on: {}", self.pending_children.iter().join(", "))?;
        }
        if let Some(err) = &self.last_error {
            write!(f, " error: {}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Failure.is_terminal());
        assert!(!TaskStatus::Idle.is_terminal());
        assert!(!TaskStatus::Hanging.is_terminal());
        assert!(!TaskStatus::Firing.is_terminal());
    }

    #[test]
    fn test_history_is_capped() {
        let mut task = Task::new(TaskHandle::new(0, 0), TaskId(0), 2);
        task.record_step(StepKind::Normal);
        task.record_step(StepKind::Delay);
        task.record_step(StepKind::Exception);
        assert_eq!(task.completed_steps(), &[StepKind::Delay, StepKind::Exception]);

        let mut silent = Task::new(TaskHandle::new(1, 0), TaskId(1), 0);
        silent.record_step(StepKind::Normal);
        assert!(silent.completed_steps().is_empty());
    }

    #[test]
    fn test_reinit_keeps_handle_and_label() {
        let mut task = Task::new(TaskHandle::new(3, 0), TaskId(7), 8);
        task.label = Some("poller".to_string());
        task.status = TaskStatus::Failure;
        task.last_error = Some(Fault::raise("boom"));
        task.linked = true;
        let epoch = task.epoch;

        task.reinit(TaskId(1));

        assert_eq!(task.handle(), TaskHandle::new(3, 0));
        assert_eq!(task.id(), TaskId(1));
        assert_eq!(task.label(), Some("poller"));
        assert_eq!(task.status(), TaskStatus::Idle);
        assert!(task.last_error().is_none());
        assert!(!task.linked);
        assert!(task.epoch > epoch);
    }

    #[test]
    fn test_snapshot_display() {
        let mut task = Task::new(TaskHandle::new(2, 0), TaskId(0), 8);
        task.label = Some("fetch".to_string());
        task.record_step(StepKind::Normal);
        task.record_step(StepKind::Delay);
        task.pending_children = vec![TaskHandle::new(5, 0), TaskHandle::new(6, 0)];

        let text = task.snapshot().to_string();
        assert_eq!(text, "task #2 [idle] 'fetch' ran: then -> wait waiting on: #5, #6");
    }

    #[test]
    fn test_reused_slot_shows_generation() {
        assert_eq!(TaskHandle::new(4, 0).to_string(), "#4");
        assert_eq!(TaskHandle::new(4, 2).to_string(), "#4/2");
        assert_ne!(TaskHandle::new(4, 0), TaskHandle::new(4, 1));
    }
}
