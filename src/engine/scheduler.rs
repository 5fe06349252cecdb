// Wed Jan 14 2026 - Alex

use crate::config::SchedulerConfig;
use crate::engine::builder::TaskRef;
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::context::Context;
use crate::engine::error::{Fault, SchedulerError};
use crate::engine::looping::LoopRange;
use crate::engine::registry::TaskRegistry;
use crate::engine::result::{self, Flow, TaskOutcome};
use crate::engine::step::{Args, ExceptionHandler, NormalHandler, Step, StepKind};
use crate::engine::task::{Task, TaskHandle, TaskSnapshot, TaskStatus};
use crate::engine::timer::{ResumeKind, Resumption, TimerQueue};
use crate::engine::trigger::{Emitter, Inbox, Trigger, TriggerHandler, TriggerId, TriggerMode};
use ahash::AHashMap;
use log::{debug, trace, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

enum Invocation {
    Normal(NormalHandler, Args),
    Exception(ExceptionHandler, Fault),
}

/// Single-threaded cooperative scheduler.
///
/// Owns every task (arena of reusable slots indexed by [`TaskHandle`]), the registry, the
/// ready queue of resumptions, the timer queue and the triggers. Nothing
/// runs until one of `run`, `run_until_stalled` or `advance` is called, and
/// each queued resumption dispatches exactly one step.
pub struct Scheduler {
    config: SchedulerConfig,
    pub(super) tasks: Vec<Task>,
    free_slots: Vec<usize>,
    registry: TaskRegistry,
    ready: VecDeque<Resumption>,
    timers: TimerQueue,
    triggers: AHashMap<TriggerId, Trigger>,
    next_trigger: u32,
    inbox: Inbox,
    clock: Box<dyn Clock>,
    running: bool,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }

    pub fn with_clock<C: Clock + 'static>(config: SchedulerConfig, clock: C) -> Self {
        let registry = TaskRegistry::with_capacity(config.max_live_tasks);

        Self {
            config,
            tasks: Vec::new(),
            free_slots: Vec::new(),
            registry,
            ready: VecDeque::new(),
            timers: TimerQueue::new(),
            triggers: AHashMap::new(),
            next_trigger: 0,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            clock: Box::new(clock),
            running: false,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    //------------------------------------------------------------
    // Task creation and inspection
    //------------------------------------------------------------

    pub fn create_task(&mut self) -> Result<TaskHandle, SchedulerError> {
        let id = self.registry.allocate()?;
        let handle = match self.free_slots.last() {
            Some(&index) => TaskHandle::new(index, self.tasks[index].handle.generation.wrapping_add(1)),
            None => TaskHandle::new(self.tasks.len(), 0),
        };
        self.registry.register(id, handle)?;

        let task = Task::new(handle, id, self.config.history_limit);
        if handle.index < self.tasks.len() {
            self.free_slots.pop();
            self.tasks[handle.index] = task;
        } else {
            self.tasks.push(task);
        }
        debug!("task {} created with id {}", handle, id);
        Ok(handle)
    }

    /// Frees the slot of a completed task for reuse. The handle, and any
    /// copy of it, is stale afterwards.
    pub fn release(&mut self, handle: TaskHandle) -> Result<(), SchedulerError> {
        if !self.task_ref(handle)?.is_completed() {
            return Err(SchedulerError::invalid(handle, "only completed tasks can be released"));
        }
        self.vacate(handle);
        Ok(())
    }

    /// Releases every completed task. Returns how many slots were freed.
    pub fn prune_completed(&mut self) -> usize {
        let done: Vec<TaskHandle> = self
            .tasks
            .iter()
            .filter(|t| !t.vacant && t.is_completed())
            .map(Task::handle)
            .collect();
        for &handle in &done {
            self.vacate(handle);
        }
        if !done.is_empty() {
            debug!("pruned {} completed task(s)", done.len());
        }
        done.len()
    }

    /// Slots allocated in the arena, free ones included.
    pub fn arena_len(&self) -> usize {
        self.tasks.len()
    }

    fn vacate(&mut self, handle: TaskHandle) {
        self.tasks[handle.index] = Task::vacant(handle);
        self.free_slots.push(handle.index);
        trace!("task {} released", handle);
    }

    /// New task, ready to be built.
    pub fn task(&mut self) -> TaskRef<'_> {
        let created = self.create_task();
        TaskRef::new(self, created)
    }

    /// Builder for an existing task.
    pub fn get(&mut self, handle: TaskHandle) -> TaskRef<'_> {
        let found = if self.contains(handle) {
            Ok(handle)
        } else {
            Err(SchedulerError::UnknownTask(handle))
        };
        TaskRef::new(self, found)
    }

    pub fn then<F>(&mut self, handler: F) -> TaskRef<'_>
    where
        F: FnMut(&mut Context<'_>, Args) -> Result<Value, Fault> + 'static,
    {
        self.task().then(handler)
    }

    pub fn once<F>(&mut self, handler: F) -> TaskRef<'_>
    where
        F: FnMut(&mut Context<'_>, Fault) -> Result<Value, Fault> + 'static,
    {
        self.task().once(handler)
    }

    pub fn wait(&mut self, duration: Duration) -> TaskRef<'_> {
        self.task().wait(duration)
    }

    pub fn repeat<R, F>(&mut self, range: R, body: F) -> TaskRef<'_>
    where
        R: Into<LoopRange>,
        F: FnMut(&mut Context<'_>, i64, Value) -> Result<Value, Fault> + 'static,
    {
        self.task().repeat(range, body)
    }

    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn inspect(&self, handle: TaskHandle) -> Option<&Task> {
        self.slot(handle)
    }

    pub fn status(&self, handle: TaskHandle) -> Option<TaskStatus> {
        self.inspect(handle).map(Task::status)
    }

    pub fn last_result(&self, handle: TaskHandle) -> Option<&Value> {
        self.inspect(handle)?.last_result()
    }

    pub fn last_error(&self, handle: TaskHandle) -> Option<&Fault> {
        self.inspect(handle)?.last_error()
    }

    /// Final outcome, once the task has completed.
    pub fn outcome(&self, handle: TaskHandle) -> Option<TaskOutcome> {
        self.inspect(handle).and_then(outcome_of)
    }

    pub fn snapshot(&self, handle: TaskHandle) -> Option<TaskSnapshot> {
        self.inspect(handle).map(Task::snapshot)
    }

    pub fn snapshots(&self) -> Vec<TaskSnapshot> {
        self.tasks.iter().filter(|t| !t.vacant).map(Task::snapshot).collect()
    }

    pub fn set_label(&mut self, handle: TaskHandle, label: impl Into<String>) -> Result<(), SchedulerError> {
        self.task_mut(handle)?.label = Some(label.into());
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// True when nothing is queued: no ready resumption, no timer and no
    /// pending emission. Tasks parked on triggers may still be hanging.
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.timers.is_empty() && self.inbox.borrow().is_empty()
    }

    /// The task behind `handle`, unless its slot was released or reused.
    pub(crate) fn slot(&self, handle: TaskHandle) -> Option<&Task> {
        self.tasks.get(handle.index).filter(|t| t.handle == handle && !t.vacant)
    }

    pub(crate) fn slot_mut(&mut self, handle: TaskHandle) -> Option<&mut Task> {
        self.tasks.get_mut(handle.index).filter(|t| t.handle == handle && !t.vacant)
    }

    fn task_ref(&self, handle: TaskHandle) -> Result<&Task, SchedulerError> {
        self.slot(handle).ok_or(SchedulerError::UnknownTask(handle))
    }

    fn task_mut(&mut self, handle: TaskHandle) -> Result<&mut Task, SchedulerError> {
        self.slot_mut(handle).ok_or(SchedulerError::UnknownTask(handle))
    }

    //------------------------------------------------------------
    // Lifecycle
    //------------------------------------------------------------

    pub fn append_step(&mut self, handle: TaskHandle, step: Step) -> Result<(), SchedulerError> {
        if self.task_ref(handle)?.is_completed() {
            if !self.config.implicit_reset {
                return Err(SchedulerError::invalid(handle, "cannot add steps to a completed task"));
            }
            debug!("task {} already completed, resetting before adding a step", handle);
            self.reset(handle)?;
        }
        self.task_mut(handle)?.pending_steps.push_back(step);
        Ok(())
    }

    /// Starts the pipeline with `args` as input to the first step. A task
    /// started while another task's handler runs becomes its child.
    pub fn start(&mut self, handle: TaskHandle, args: Args) -> Result<(), SchedulerError> {
        let task = self.task_mut(handle)?;
        match task.status {
            TaskStatus::Success | TaskStatus::Failure => {
                debug!("task {} already completed, start ignored", handle);
                return Ok(());
            }
            TaskStatus::Firing | TaskStatus::Hanging => {
                return Err(SchedulerError::invalid(handle, "task is already running"));
            }
            TaskStatus::Idle => {}
        }
        task.status = TaskStatus::Firing;
        let epoch = task.epoch;

        self.link_to_focus(handle);
        debug!("task {} fired", handle);
        self.ready.push_back(Resumption::dispatch(handle, epoch, Ok(args)));
        Ok(())
    }

    /// Cancels the task and completes it with an abort fault. Returns the
    /// steps that never ran, or `None` if the task had already completed.
    pub fn abort(&mut self, handle: TaskHandle, reason: impl Into<String>) -> Option<Vec<Step>> {
        let task = self.slot_mut(handle)?;
        if task.is_completed() {
            return None;
        }
        let steps: Vec<Step> = task.pending_steps.drain(..).collect();
        task.cancel_resumptions();
        task.focused = false;
        self.release_focus(handle);

        let reason = reason.into();
        debug!("task {} aborted ({} step(s) dropped): {}", handle, steps.len(), reason);
        self.complete(handle, Err(Fault::Aborted { task: handle, reason }));
        Some(steps)
    }

    /// Aborts the task if it is still running, then starts a new generation
    /// under the same handle with a freshly allocated id.
    pub fn reset(&mut self, handle: TaskHandle) -> Result<(), SchedulerError> {
        if !self.task_ref(handle)?.is_completed() {
            self.abort(handle, "reset");
        }
        self.task_ref(handle)?;
        let id = self.registry.allocate()?;
        self.registry.register(id, handle)?;
        self.tasks[handle.index].reinit(id);
        debug!("task {} reset with id {}", handle, id);
        Ok(())
    }

    //------------------------------------------------------------
    // Run loop
    //------------------------------------------------------------

    /// Processes everything that is ready now, without waiting on timers.
    /// Returns the number of resumptions dispatched.
    pub fn run_until_stalled(&mut self) -> Result<usize, SchedulerError> {
        self.turn(self.config.max_turns).map(|(turns, _)| turns)
    }

    /// Runs until no work is left, sleeping on the clock between timers.
    /// Tasks parked on triggers that nobody fires stay hanging.
    pub fn run(&mut self) -> Result<usize, SchedulerError> {
        let mut total = 0;

        loop {
            let budget = self.config.max_turns.map(|max| max.saturating_sub(total));
            if budget == Some(0) {
                warn!("turn budget of {} exhausted", total);
                break;
            }

            let (turns, exhausted) = self.turn(budget)?;
            total += turns;
            if exhausted {
                break;
            }
            if !self.inbox.borrow().is_empty() {
                continue;
            }

            match self.timers.next_deadline() {
                Some(deadline) => self.clock.sleep_until(deadline),
                None => break,
            }
        }

        Ok(total)
    }

    /// Moves the clock forward by `by`, firing every timer that falls due
    /// on the way in deadline order.
    pub fn advance(&mut self, by: Duration) -> Result<usize, SchedulerError> {
        if self.running {
            return Err(SchedulerError::Reentrant);
        }
        let target = self.clock.now().saturating_add(by);
        let mut total = self.run_until_stalled()?;

        while let Some(deadline) = self.timers.next_deadline().filter(|d| *d <= target) {
            self.clock.sleep_until(deadline);
            total += self.run_until_stalled()?;
        }

        self.clock.sleep_until(target);
        total += self.run_until_stalled()?;
        Ok(total)
    }

    fn turn(&mut self, budget: Option<usize>) -> Result<(usize, bool), SchedulerError> {
        if self.running {
            return Err(SchedulerError::Reentrant);
        }
        self.running = true;

        let mut turns = 0;
        let mut exhausted = false;

        loop {
            self.drain_inbox();
            self.collect_due_timers();

            let Some(next) = self.ready.pop_front() else {
                break;
            };
            self.dispatch(next);
            turns += 1;

            if budget.is_some_and(|max| turns >= max) {
                exhausted = !self.ready.is_empty();
                if exhausted {
                    warn!("stopping after {} turns with {} resumption(s) queued", turns, self.ready.len());
                }
                break;
            }
        }

        self.running = false;
        Ok((turns, exhausted))
    }

    fn collect_due_timers(&mut self) {
        let now = self.clock.now();
        while let Some(resumption) = self.timers.pop_due(now) {
            self.ready.push_back(resumption);
        }
    }

    fn drain_inbox(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some((trigger, args)) = next else {
                break;
            };
            if let Err(e) = self.emit(trigger, args) {
                warn!("dropping emission for trigger {}: {}", trigger, e);
            }
        }
    }

    //------------------------------------------------------------
    // Step dispatch
    //------------------------------------------------------------

    fn dispatch(&mut self, resumption: Resumption) {
        let Resumption { task: handle, epoch, kind, flow } = resumption;
        let Some(task) = self.slot_mut(handle) else {
            trace!("dropping resumption for released task {}", handle);
            return;
        };
        if task.epoch != epoch {
            trace!("dropping stale resumption for task {}", handle);
            return;
        }
        if kind == ResumeKind::Wake && task.status == TaskStatus::Hanging {
            task.status = TaskStatus::Firing;
        }
        if task.status != TaskStatus::Firing {
            trace!("task {} is {}, resumption discarded", handle, task.status);
            return;
        }
        self.run_step(handle, flow);
    }

    fn run_step(&mut self, handle: TaskHandle, flow: Flow) {
        self.acquire_focus(handle);

        let Some(step) = self.tasks[handle.index].pending_steps.pop_front() else {
            self.complete(handle, flow);
            return;
        };
        let kind = step.kind();
        trace!("task {} runs a {} step", handle, kind);

        match step {
            Step::Delay(duration) => {
                let task = &mut self.tasks[handle.index];
                task.record_step(kind);
                task.status = TaskStatus::Hanging;
                let epoch = task.epoch;
                self.release_focus(handle);

                let deadline = self.clock.now().saturating_add(duration);
                self.timers.schedule(deadline, Resumption::wake(handle, epoch, flow));
            }
            Step::Trigger(trigger) => self.park_on_trigger(handle, trigger, flow),
            Step::Normal(handler) => match flow {
                Ok(args) => self.invoke(handle, kind, Invocation::Normal(handler, args)),
                Err(fault) => self.pass_through(handle, kind, Err(fault)),
            },
            Step::Exception(handler) => match flow {
                Ok(args) => self.pass_through(handle, kind, Ok(args)),
                Err(fault) => self.invoke(handle, kind, Invocation::Exception(handler, fault)),
            },
        }
    }

    fn pass_through(&mut self, handle: TaskHandle, kind: StepKind, flow: Flow) {
        self.tasks[handle.index].record_step(kind);
        self.release_focus(handle);
        self.resume(handle, flow);
    }

    fn invoke(&mut self, handle: TaskHandle, kind: StepKind, invocation: Invocation) {
        let task = &mut self.tasks[handle.index];
        task.focused = true;
        let epoch = task.epoch;

        let (returned, previous) = match invocation {
            Invocation::Normal(mut handler, args) => {
                let previous = args.clone();
                let mut ctx = Context::new(self, handle);
                (handler(&mut ctx, args), previous)
            }
            Invocation::Exception(mut handler, fault) => {
                let previous = self.tasks[handle.index].last_args.clone();
                let mut ctx = Context::new(self, handle);
                (handler(&mut ctx, fault), previous)
            }
        };

        let task = match self.slot_mut(handle) {
            Some(task) if task.epoch == epoch => task,
            _ => {
                trace!("task {} was aborted, reset or released by its own handler", handle);
                return;
            }
        };
        task.record_step(kind);
        task.focused = false;

        let mut flow = match returned {
            Ok(value) => {
                let args = result::next_args(&value, previous);
                task.last_result = Some(value);
                task.last_args = args.clone();
                Ok(args)
            }
            Err(fault) => {
                debug!("task {} raised: {}", handle, fault);
                Err(fault)
            }
        };
        if let Some(fault) = task.deferred_fault.take() {
            flow = Err(fault);
        }

        self.release_focus(handle);
        self.after_step(handle, flow);
    }

    /// Decides how a task continues once its handler has returned.
    fn after_step(&mut self, handle: TaskHandle, flow: Flow) {
        let task = &mut self.tasks[handle.index];

        if task.has_outstanding_children() {
            match flow {
                Ok(_) => {
                    task.status = TaskStatus::Hanging;
                    trace!(
                        "task {} hangs on {} child(ren)",
                        handle,
                        task.pending_children.len() - task.collected.len()
                    );
                }
                Err(fault) => {
                    self.abort_children(handle);
                    self.resume(handle, Err(fault));
                }
            }
            return;
        }

        let flow = if task.pending_children.is_empty() {
            flow
        } else {
            let collected = std::mem::take(&mut task.collected);
            task.pending_children.clear();
            flow.map(|own| result::fold_children(collected, own))
        };
        self.resume(handle, flow);
    }

    pub(crate) fn resume(&mut self, handle: TaskHandle, flow: Flow) {
        let task = &mut self.tasks[handle.index];
        task.status = TaskStatus::Firing;
        let epoch = task.epoch;
        self.ready.push_back(Resumption::dispatch(handle, epoch, flow));
    }

    fn acquire_focus(&mut self, handle: TaskHandle) {
        if let Some(previous) = self.registry.set_focus(handle) {
            trace!("focus moves from task {} to {}", previous, handle);
        }
    }

    pub(crate) fn release_focus(&mut self, handle: TaskHandle) {
        let observer = self.tasks[handle.index].observer;
        self.registry.release_focus(handle, observer);
    }

    //------------------------------------------------------------
    // Completion
    //------------------------------------------------------------

    pub(crate) fn complete(&mut self, handle: TaskHandle, flow: Flow) {
        let Some(task) = self.slot_mut(handle) else {
            return;
        };
        if task.is_completed() {
            return;
        }
        task.pending_steps.clear();
        task.focused = false;
        task.cancel_resumptions();
        self.release_focus(handle);

        let cancelled = self.timers.cancel(handle);
        if cancelled > 0 {
            trace!("task {} dropped {} pending timer(s)", handle, cancelled);
        }
        for trigger in self.triggers.values_mut() {
            trigger.waiting.retain(|(waiter, _)| *waiter != handle);
        }

        match flow {
            Ok(args) => {
                let task = &mut self.tasks[handle.index];
                task.status = TaskStatus::Success;
                task.last_error = None;
                if task.last_result.as_ref().map_or(true, Value::is_null) {
                    if let Some(value) = final_value(args) {
                        task.last_result = Some(value);
                    }
                }
            }
            Err(fault) => {
                self.abort_children(handle);
                let task = &mut self.tasks[handle.index];
                task.status = TaskStatus::Failure;
                task.last_error = Some(fault);
            }
        }

        let task = &mut self.tasks[handle.index];
        let (id, observer, status) = (task.id, task.observer, task.status);
        self.registry.notify_complete(id, handle, observer);
        debug!("task {} completed with {}", handle, status);

        let task = &mut self.tasks[handle.index];
        match observer {
            Some(parent) if !task.notified => {
                task.notified = true;
                if let Some(outcome) = outcome_of(task) {
                    self.on_child_settled(parent, handle, outcome);
                }
            }
            Some(_) => {}
            None => match &task.last_error {
                Some(fault) if fault.is_abort() => trace!("task {} ended by abort", handle),
                Some(fault) => warn!("task {} failed with an unhandled fault: {}", handle, fault),
                None => {}
            },
        }

        if self.slot(handle).is_some_and(|t| t.transient) {
            self.vacate(handle);
        }
    }

    //------------------------------------------------------------
    // Triggers
    //------------------------------------------------------------

    /// Repeatable trigger whose firings pass their arguments straight on.
    pub fn trigger(&mut self, name: impl Into<String>) -> TriggerId {
        self.add_trigger(name.into(), TriggerMode::Repeat, None)
    }

    pub fn trigger_once(&mut self, name: impl Into<String>) -> TriggerId {
        self.add_trigger(name.into(), TriggerMode::Once, None)
    }

    /// Trigger that runs `handler` on every firing; the handler's result
    /// (or fault) is what the parked tasks resume with.
    pub fn trigger_with<F>(&mut self, name: impl Into<String>, mode: TriggerMode, handler: F) -> TriggerId
    where
        F: FnMut(&mut Scheduler, Args) -> Result<Value, Fault> + 'static,
    {
        let handler: TriggerHandler = Box::new(handler);
        self.add_trigger(name.into(), mode, Some(handler))
    }

    fn add_trigger(&mut self, name: String, mode: TriggerMode, handler: Option<TriggerHandler>) -> TriggerId {
        let id = TriggerId(self.next_trigger);
        self.next_trigger += 1;
        debug!("trigger {} '{}' registered ({:?})", id, name, mode);
        self.triggers.insert(id, Trigger::new(id, name, mode, handler));
        id
    }

    pub fn emitter(&self, trigger: TriggerId) -> Result<Emitter, SchedulerError> {
        if !self.triggers.contains_key(&trigger) {
            return Err(SchedulerError::UnknownTrigger(trigger));
        }
        Ok(Emitter::new(trigger, self.inbox.clone()))
    }

    pub fn waiting_on(&self, trigger: TriggerId) -> usize {
        self.triggers.get(&trigger).map_or(0, |t| {
            t.waiting
                .iter()
                .filter(|(task, epoch)| self.slot(*task).is_some_and(|t| t.epoch == *epoch))
                .count()
        })
    }

    pub fn trigger_name(&self, trigger: TriggerId) -> Option<&str> {
        self.triggers.get(&trigger).map(|t| t.name.as_str())
    }

    pub fn fired_count(&self, trigger: TriggerId) -> usize {
        self.triggers.get(&trigger).map_or(0, |t| t.fired)
    }

    /// Fires the trigger now, resolving every task parked on it. Returns
    /// how many tasks were resumed.
    pub fn emit(&mut self, trigger: TriggerId, args: Args) -> Result<usize, SchedulerError> {
        let t = self.triggers.get_mut(&trigger).ok_or(SchedulerError::UnknownTrigger(trigger))?;
        if t.closed {
            return Err(SchedulerError::TriggerClosed(trigger));
        }
        t.fired += 1;
        if t.mode == TriggerMode::Once {
            t.closed = true;
        }
        let waiting = std::mem::take(&mut t.waiting);
        let handler = t.handler.take();

        let produced: Result<Args, Fault> = match handler {
            Some(mut handler) => {
                let returned = handler(self, args);
                if let Some(t) = self.triggers.get_mut(&trigger) {
                    t.handler = Some(handler);
                }
                returned.map(|value| if value.is_null() { Vec::new() } else { vec![value] })
            }
            None => Ok(args),
        };

        let mut resolved = 0;
        for (handle, epoch) in waiting {
            let task = match self.slot(handle) {
                Some(task) if task.epoch == epoch && task.status == TaskStatus::Hanging => task,
                _ => {
                    trace!("task {} no longer waits on trigger {}", handle, trigger);
                    continue;
                }
            };
            let flow = match &produced {
                Ok(args) if args.iter().any(|v| !v.is_null()) => Ok(args.clone()),
                Ok(_) => Ok(task.last_args.clone()),
                Err(fault) => Err(Fault::Trigger { trigger, source: Box::new(fault.clone()) }),
            };
            self.resume(handle, flow);
            resolved += 1;
        }

        debug!("trigger {} fired, {} task(s) resumed", trigger, resolved);
        Ok(resolved)
    }

    /// Closes the trigger; tasks still parked on it resume with a fault.
    pub fn close_trigger(&mut self, trigger: TriggerId) -> Result<usize, SchedulerError> {
        let t = self.triggers.get_mut(&trigger).ok_or(SchedulerError::UnknownTrigger(trigger))?;
        t.closed = true;
        let waiting = std::mem::take(&mut t.waiting);
        debug!("trigger {} '{}' closed", t.id, t.name);

        let mut released = 0;
        for (handle, epoch) in waiting {
            if !self.slot(handle).is_some_and(|t| t.epoch == epoch && t.status == TaskStatus::Hanging) {
                continue;
            }
            let fault = Fault::Trigger { trigger, source: Box::new(Fault::raise("trigger closed")) };
            self.resume(handle, Err(fault));
            released += 1;
        }
        Ok(released)
    }

    fn park_on_trigger(&mut self, handle: TaskHandle, trigger: TriggerId, flow: Flow) {
        let task = &mut self.tasks[handle.index];
        task.record_step(StepKind::Trigger);
        let epoch = task.epoch;
        self.release_focus(handle);

        // Fault mode skips the wait, like any other normal step.
        let args = match flow {
            Ok(args) => args,
            Err(fault) => {
                self.resume(handle, Err(fault));
                return;
            }
        };

        let parked = match self.triggers.get_mut(&trigger) {
            Some(t) if !t.closed => {
                t.park(handle, epoch);
                true
            }
            _ => false,
        };

        if parked {
            let task = &mut self.tasks[handle.index];
            task.last_args = args;
            task.status = TaskStatus::Hanging;
            trace!("task {} parked on trigger {}", handle, trigger);
        } else {
            let fault = Fault::Trigger {
                trigger,
                source: Box::new(Fault::raise("trigger is closed or unknown")),
            };
            self.resume(handle, Err(fault));
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

fn outcome_of(task: &Task) -> Option<TaskOutcome> {
    match task.status {
        TaskStatus::Success => Some(TaskOutcome::Success(task.last_result.clone().unwrap_or(Value::Null))),
        TaskStatus::Failure => Some(TaskOutcome::Failure(
            task.last_error.clone().unwrap_or_else(|| Fault::raise("unknown failure")),
        )),
        _ => None,
    }
}

fn final_value(mut args: Args) -> Option<Value> {
    match args.len() {
        0 => None,
        1 => args.pop(),
        _ => Some(Value::Array(args)),
    }
}
