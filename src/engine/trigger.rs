// Thu Jan 15 2026 - Alex

use crate::engine::error::Fault;
use crate::engine::scheduler::Scheduler;
use crate::engine::step::Args;
use crate::engine::task::TaskHandle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub(crate) u32);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// Closes after its first firing.
    Once,
    Repeat,
}

pub type TriggerHandler = Box<dyn FnMut(&mut Scheduler, Args) -> Result<Value, Fault>>;

/// A monitored external event source. Tasks park on it with
/// `wait_for`; every firing resolves all tasks parked at that moment.
pub(crate) struct Trigger {
    pub id: TriggerId,
    pub name: String,
    pub mode: TriggerMode,
    pub handler: Option<TriggerHandler>,
    pub waiting: Vec<(TaskHandle, u64)>,
    pub closed: bool,
    pub fired: usize,
}

impl Trigger {
    pub fn new(id: TriggerId, name: String, mode: TriggerMode, handler: Option<TriggerHandler>) -> Self {
        Self {
            id,
            name,
            mode,
            handler,
            waiting: Vec::new(),
            closed: false,
            fired: 0,
        }
    }

    pub fn park(&mut self, task: TaskHandle, epoch: u64) {
        self.waiting.push((task, epoch));
    }
}

pub(crate) type Inbox = Rc<RefCell<VecDeque<(TriggerId, Args)>>>;

/// Cloneable callback side of a trigger. Foreign callbacks that cannot
/// borrow the scheduler report firings through it; the run loop picks
/// them up on its next turn.
#[derive(Clone)]
pub struct Emitter {
    trigger: TriggerId,
    inbox: Inbox,
}

impl Emitter {
    pub(crate) fn new(trigger: TriggerId, inbox: Inbox) -> Self {
        Self { trigger, inbox }
    }

    pub fn trigger(&self) -> TriggerId {
        self.trigger
    }

    pub fn emit(&self, args: Args) {
        self.inbox.borrow_mut().push_back((self.trigger, args));
    }

    /// Wraps the emitter into a plain callback.
    pub fn into_callback(self) -> impl Fn(Args) {
        move |args| self.emit(args)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").field("trigger", &self.trigger).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_emitter_queues_into_shared_inbox() {
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let emitter = Emitter::new(TriggerId(1), inbox.clone());
        let callback = emitter.clone().into_callback();

        emitter.emit(vec![json!("click")]);
        callback(vec![]);

        let queued: Vec<_> = inbox.borrow().iter().cloned().collect();
        assert_eq!(queued, vec![(TriggerId(1), vec![json!("click")]), (TriggerId(1), vec![])]);
    }
}
