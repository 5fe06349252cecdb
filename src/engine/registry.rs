// Wed Jan 14 2026 - Alex

use crate::engine::error::SchedulerError;
use crate::engine::task::{TaskHandle, TaskId};
use indexmap::IndexMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Idle,
    Busy,
}

/// Live-task table, id pool and focus pointer.
///
/// The registry only stores handles; task state lives in the scheduler
/// arena, so nothing here owns a task.
#[derive(Debug)]
pub struct TaskRegistry {
    capacity: Option<usize>,
    next_id: u32,
    free_ids: VecDeque<TaskId>,
    live: IndexMap<TaskId, TaskHandle>,
    context: Option<TaskHandle>,
    state: RegistryState,
    retired: usize,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            next_id: 0,
            free_ids: VecDeque::new(),
            live: IndexMap::new(),
            context: None,
            state: RegistryState::Idle,
            retired: 0,
        }
    }

    pub fn allocate(&mut self) -> Result<TaskId, SchedulerError> {
        if let Some(id) = self.free_ids.pop_front() {
            return Ok(id);
        }
        if let Some(capacity) = self.capacity {
            if self.next_id as usize >= capacity {
                return Err(SchedulerError::ExhaustedIdSpace(capacity));
            }
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    pub fn register(&mut self, id: TaskId, handle: TaskHandle) -> Result<(), SchedulerError> {
        if self.live.contains_key(&id) {
            return Err(SchedulerError::DuplicateId(id));
        }
        self.live.insert(id, handle);
        Ok(())
    }

    /// Removes the id from the live table and returns it to the pool.
    pub fn unregister(&mut self, id: TaskId) -> Option<TaskHandle> {
        let handle = self.live.shift_remove(&id)?;
        self.free_ids.push_back(id);
        self.retired += 1;
        Some(handle)
    }

    /// Makes `handle` the focus holder and returns the previous holder when
    /// it was a different task.
    pub fn set_focus(&mut self, handle: TaskHandle) -> Option<TaskHandle> {
        let previous = self.context.filter(|&held| held != handle);
        self.context = Some(handle);
        self.state = RegistryState::Busy;
        previous
    }

    /// Hands focus back to `observer` if `handle` holds it (or nobody does).
    pub fn release_focus(&mut self, handle: TaskHandle, observer: Option<TaskHandle>) {
        if self.context.is_none() || self.context == Some(handle) {
            self.context = observer;
            self.state = RegistryState::Idle;
        }
    }

    pub fn notify_complete(&mut self, id: TaskId, handle: TaskHandle, observer: Option<TaskHandle>) {
        self.release_focus(handle, observer);
        self.unregister(id);
    }

    pub fn is_live(&self, id: TaskId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<TaskHandle> {
        self.live.get(&id).copied()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.live.keys().copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn retired_count(&self) -> usize {
        self.retired
    }

    pub fn context(&self) -> Option<TaskHandle> {
        self.context
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
