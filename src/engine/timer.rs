// Wed Jan 14 2026 - Alex

use crate::engine::result::Flow;
use crate::engine::task::TaskHandle;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResumeKind {
    /// Continue a task that is already firing.
    Dispatch,
    /// Wake a hanging task (timer expiry) and continue it.
    Wake,
}

/// A queued re-entry into a task's pipeline.
#[derive(Debug)]
pub(crate) struct Resumption {
    pub task: TaskHandle,
    pub epoch: u64,
    pub kind: ResumeKind,
    pub flow: Flow,
}

impl Resumption {
    pub fn dispatch(task: TaskHandle, epoch: u64, flow: Flow) -> Self {
        Self { task, epoch, kind: ResumeKind::Dispatch, flow }
    }

    pub fn wake(task: TaskHandle, epoch: u64, flow: Flow) -> Self {
        Self { task, epoch, kind: ResumeKind::Wake, flow }
    }
}

struct TimerEntry {
    deadline: Duration,
    seq: u64,
    resumption: Resumption,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    // Reversed so the BinaryHeap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, resumption: Resumption) {
        self.seq += 1;
        self.heap.push(TimerEntry { deadline, seq: self.seq, resumption });
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|e| e.deadline)
    }

    pub fn pop_due(&mut self, now: Duration) -> Option<Resumption> {
        if self.heap.peek()?.deadline <= now {
            self.heap.pop().map(|e| e.resumption)
        } else {
            None
        }
    }

    /// Drops every timer held by `task`; returns how many were removed.
    pub fn cancel(&mut self, task: TaskHandle) -> usize {
        let before = self.heap.len();
        self.heap.retain(|e| e.resumption.task != task);
        before - self.heap.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wake(task: usize) -> Resumption {
        Resumption::wake(TaskHandle::new(task, 0), 0, Ok(Vec::new()))
    }

    #[test]
    fn test_pops_in_deadline_then_insertion_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::from_millis(50), wake(0));
        timers.schedule(Duration::from_millis(10), wake(1));
        timers.schedule(Duration::from_millis(10), wake(2));

        assert_eq!(timers.next_deadline(), Some(Duration::from_millis(10)));
        assert!(timers.pop_due(Duration::from_millis(5)).is_none());

        let now = Duration::from_millis(60);
        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(now))
            .map(|r| r.task.index())
            .collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_zero_deadline_is_due_immediately() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::ZERO, wake(3));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(Duration::ZERO).map(|r| r.task), Some(TaskHandle::new(3, 0)));
    }

    #[test]
    fn test_cancel_removes_only_that_task() {
        let mut timers = TimerQueue::new();
        timers.schedule(Duration::from_secs(3600), wake(0));
        timers.schedule(Duration::from_millis(20), wake(1));
        timers.schedule(Duration::from_millis(5), wake(0));

        assert_eq!(timers.cancel(TaskHandle::new(0, 0)), 2);
        assert_eq!(timers.cancel(TaskHandle::new(0, 0)), 0);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(Duration::from_millis(20)));
    }
}
