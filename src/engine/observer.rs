// Wed Jan 14 2026 - Alex

use crate::engine::error::Fault;
use crate::engine::result::{self, TaskOutcome};
use crate::engine::scheduler::Scheduler;
use crate::engine::task::{TaskHandle, TaskStatus};
use log::{debug, trace};

// Parent/child bookkeeping. A task started while another task's handler
// holds focus becomes that task's child: the parent hangs until every
// child has settled, and the first child failure cancels the rest.
impl Scheduler {
    pub(crate) fn link_to_focus(&mut self, child: TaskHandle) {
        let Some(holder) = self.registry().context() else {
            return;
        };
        if holder == child || !self.slot(holder).is_some_and(|t| t.focused) {
            return;
        }
        let Some(task) = self.slot_mut(child) else {
            return;
        };
        if task.linked {
            return;
        }
        task.observer = Some(holder);
        task.linked = true;

        let parent = &mut self.tasks[holder.index];
        parent.pending_children.push(child);
        parent.status = TaskStatus::Hanging;
        debug!("task {} linked as child of {}", child, holder);
    }

    pub(crate) fn on_child_settled(&mut self, parent: TaskHandle, child: TaskHandle, outcome: TaskOutcome) {
        let Some(task) = self.slot_mut(parent) else {
            return;
        };
        if task.is_completed() {
            trace!("task {} already completed, ignoring child {}", parent, child);
            return;
        }
        if !task.pending_children.contains(&child) {
            trace!("task {} is not waiting on {}", parent, child);
            return;
        }

        match outcome {
            TaskOutcome::Success(value) => {
                task.collected.push(value);
                trace!(
                    "task {} collected {}/{} child result(s)",
                    parent,
                    task.collected.len(),
                    task.pending_children.len()
                );
                // A focused parent folds its children when its handler returns.
                if task.focused || task.has_outstanding_children() {
                    return;
                }
                let collected = std::mem::take(&mut task.collected);
                task.pending_children.clear();
                let args = result::fold_children(collected, task.last_args.clone());
                self.resume(parent, Ok(args));
            }
            TaskOutcome::Failure(fault) => {
                debug!("child {} of task {} failed: {}", child, parent, fault);
                self.abort_children(parent);

                let fault = Fault::Subtask { child, source: Box::new(fault) };
                let task = &mut self.tasks[parent.index];
                if task.focused {
                    task.deferred_fault = Some(fault);
                } else {
                    self.resume(parent, Err(fault));
                }
            }
        }
    }

    /// Aborts every child that has not settled yet. Detached children do
    /// not report back, so the parent is never notified twice.
    pub(crate) fn abort_children(&mut self, parent: TaskHandle) {
        let Some(task) = self.slot_mut(parent) else {
            return;
        };
        let children = std::mem::take(&mut task.pending_children);
        task.collected.clear();

        for child in children {
            let observer = match self.slot_mut(child) {
                Some(task) if !task.is_completed() => task.observer.take(),
                _ => continue,
            };
            self.abort(child, format!("cancelled by task {}", parent));
            if let Some(task) = self.slot_mut(child) {
                task.observer = observer;
            }
        }
    }
}
