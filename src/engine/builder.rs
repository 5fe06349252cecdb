// Wed Jan 14 2026 - Alex

use crate::engine::context::Context;
use crate::engine::error::{Fault, SchedulerError};
use crate::engine::looping::{self, LoopRange};
use crate::engine::scheduler::Scheduler;
use crate::engine::step::{Args, Step};
use crate::engine::task::TaskHandle;
use crate::engine::trigger::TriggerId;
use serde_json::Value;
use std::time::Duration;

/// Chainable pipeline builder for one task.
///
/// The first failing call is remembered and every later call becomes a
/// no-op; the error comes out of `build`, `fire` or `start`.
pub struct TaskRef<'a> {
    scheduler: &'a mut Scheduler,
    state: Result<TaskHandle, SchedulerError>,
}

impl<'a> TaskRef<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, state: Result<TaskHandle, SchedulerError>) -> Self {
        Self { scheduler, state }
    }

    pub fn add_step(mut self, step: Step) -> Self {
        if let Ok(handle) = self.state {
            if let Err(e) = self.scheduler.append_step(handle, step) {
                self.state = Err(e);
            }
        }
        self
    }

    pub fn then<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut Context<'_>, Args) -> Result<Value, Fault> + 'static,
    {
        self.add_step(Step::normal(handler))
    }

    pub fn once<F>(self, handler: F) -> Self
    where
        F: FnMut(&mut Context<'_>, Fault) -> Result<Value, Fault> + 'static,
    {
        self.add_step(Step::exception(handler))
    }

    pub fn wait(self, duration: Duration) -> Self {
        self.add_step(Step::delay(duration))
    }

    pub fn wait_ms(self, millis: i64) -> Self {
        self.add_step(Step::delay_ms(millis))
    }

    pub fn wait_for(self, trigger: TriggerId) -> Self {
        self.add_step(Step::trigger(trigger))
    }

    pub fn repeat<R, F>(self, range: R, body: F) -> Self
    where
        R: Into<LoopRange>,
        F: FnMut(&mut Context<'_>, i64, Value) -> Result<Value, Fault> + 'static,
    {
        self.add_step(looping::loop_step(range.into(), Box::new(body)))
    }

    pub fn named(mut self, label: impl Into<String>) -> Self {
        if let Ok(handle) = self.state {
            if let Err(e) = self.scheduler.set_label(handle, label) {
                self.state = Err(e);
            }
        }
        self
    }

    /// Frees the task's slot as soon as it completes.
    pub(crate) fn transient(mut self) -> Self {
        if let Ok(handle) = self.state {
            if let Some(task) = self.scheduler.slot_mut(handle) {
                task.transient = true;
            }
        }
        self
    }

    /// Starts a fresh generation of the task; see [`Scheduler::reset`].
    pub fn reset(mut self) -> Self {
        if let Ok(handle) = self.state {
            if let Err(e) = self.scheduler.reset(handle) {
                self.state = Err(e);
            }
        }
        self
    }

    pub fn abort(self, reason: impl Into<String>) -> Option<Vec<Step>> {
        let handle = self.state.ok()?;
        self.scheduler.abort(handle, reason)
    }

    pub fn handle(&self) -> Option<TaskHandle> {
        self.state.as_ref().ok().copied()
    }

    pub fn build(self) -> Result<TaskHandle, SchedulerError> {
        self.state
    }

    pub fn fire(self, args: Args) -> Result<TaskHandle, SchedulerError> {
        let handle = self.state?;
        self.scheduler.start(handle, args)?;
        Ok(handle)
    }

    pub fn start(self) -> Result<TaskHandle, SchedulerError> {
        self.fire(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::engine::step::StepKind;
    use crate::engine::task::TaskStatus;

    #[test]
    fn test_build_queues_steps_in_order() {
        let mut scheduler = Scheduler::default();
        let handle = scheduler
            .task()
            .named("pipeline")
            .then(|_, _| Ok(Value::Null))
            .wait_ms(10)
            .once(|_, fault| Err(fault))
            .build()
            .unwrap();

        let snapshot = scheduler.snapshot(handle).unwrap();
        assert_eq!(snapshot.label.as_deref(), Some("pipeline"));
        assert_eq!(snapshot.pending_steps, vec![StepKind::Normal, StepKind::Delay, StepKind::Exception]);
        assert_eq!(snapshot.status, TaskStatus::Idle);
    }

    #[test]
    fn test_errors_are_deferred_to_fire() {
        let mut scheduler = Scheduler::new(SchedulerConfig::default().with_max_live_tasks(Some(1)));
        scheduler.task().build().unwrap();

        let result = scheduler.task().then(|_, _| Ok(Value::Null)).fire(vec![]);
        assert_eq!(result, Err(SchedulerError::ExhaustedIdSpace(1)));
    }

    #[test]
    fn test_unknown_handle() {
        let mut scheduler = Scheduler::default();
        let result = scheduler.get(TaskHandle::new(42, 0)).wait_ms(5).build();
        assert_eq!(result, Err(SchedulerError::UnknownTask(TaskHandle::new(42, 0))));
    }

    #[test]
    fn test_reset_then_abort_through_builder() {
        let mut scheduler = Scheduler::default();
        let handle = scheduler.task().wait_ms(5).start().unwrap();

        let reset = scheduler.get(handle).reset().then(|_, _| Ok(Value::Null)).build().unwrap();
        assert_eq!(reset, handle);
        assert_eq!(scheduler.status(handle), Some(TaskStatus::Idle));

        let dropped = scheduler.get(handle).abort("done").unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(scheduler.get(handle).abort("again").is_none());
    }

    #[test]
    fn test_fire_twice_is_rejected() {
        let mut scheduler = Scheduler::default();
        let handle = scheduler.task().wait_ms(5).start().unwrap();
        let again = scheduler.get(handle).start();
        assert!(matches!(again, Err(SchedulerError::InvalidOperation { .. })));
    }
}
