// Tue Jan 13 2026 - Alex

use crate::engine::scheduler::Scheduler;
use crate::engine::task::TaskHandle;
use std::ops::{Deref, DerefMut};

/// What a step handler sees while it runs: the scheduler, plus the task
/// the handler belongs to. Tasks started through it are linked to that
/// task as children.
pub struct Context<'a> {
    scheduler: &'a mut Scheduler,
    task: TaskHandle,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, task: TaskHandle) -> Self {
        Self { scheduler, task }
    }

    pub fn current(&self) -> TaskHandle {
        self.task
    }

    pub fn scheduler(&mut self) -> &mut Scheduler {
        self.scheduler
    }
}

impl Deref for Context<'_> {
    type Target = Scheduler;

    fn deref(&self) -> &Scheduler {
        self.scheduler
    }
}

impl DerefMut for Context<'_> {
    fn deref_mut(&mut self) -> &mut Scheduler {
        self.scheduler
    }
}
