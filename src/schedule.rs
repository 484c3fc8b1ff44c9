use super::*;

pub(crate) const TIMER_STEP_LIMIT: usize = 10_000;

/// Identity of a replaceable timer. Scheduling against a key cancels
/// any pending timer holding the same key, which is how the scroll
/// debounce collapses bursts into a single trailing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    ScrollSpy,
    StepJumpScroll,
    StepHighlightClear,
}

/// Snapshot of one queued timer, for inspection from tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: u64,
    pub due_at: u64,
    pub key: Option<TimerKey>,
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask {
    pub(crate) id: u64,
    pub(crate) due_at: u64,
    pub(crate) order: u64,
    pub(crate) key: Option<TimerKey>,
    pub(crate) action: Action,
}

/// Virtual-time task queue. Nothing runs until the owner advances the
/// clock; ties on due time resolve in scheduling order.
#[derive(Debug)]
pub(crate) struct Scheduler {
    pub(crate) task_queue: Vec<ScheduledTask>,
    pub(crate) now_ms: u64,
    next_timer_id: u64,
    next_task_order: u64,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self {
            task_queue: Vec::new(),
            now_ms: 0,
            next_timer_id: 1,
            next_task_order: 0,
        }
    }

    fn allocate_timer_id(&mut self) -> u64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        id
    }

    fn allocate_task_order(&mut self) -> u64 {
        let order = self.next_task_order;
        self.next_task_order += 1;
        order
    }

    pub(crate) fn schedule(
        &mut self,
        delay_ms: u64,
        key: Option<TimerKey>,
        action: Action,
    ) -> u64 {
        if let Some(key) = key {
            self.clear_key(key);
        }
        let id = self.allocate_timer_id();
        let order = self.allocate_task_order();
        self.task_queue.push(ScheduledTask {
            id,
            due_at: self.now_ms + delay_ms,
            order,
            key,
            action,
        });
        id
    }

    pub(crate) fn clear_key(&mut self, key: TimerKey) {
        self.task_queue.retain(|task| task.key != Some(key));
    }

    pub(crate) fn clear_timer(&mut self, id: u64) {
        self.task_queue.retain(|task| task.id != id);
    }

    pub(crate) fn clear_all_timers(&mut self) {
        self.task_queue.clear();
    }

    pub(crate) fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut pending: Vec<&ScheduledTask> = self.task_queue.iter().collect();
        pending.sort_by_key(|task| (task.due_at, task.order));
        pending
            .into_iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                key: task.key,
            })
            .collect()
    }

    /// Removes and returns the earliest task due at or before
    /// `deadline`, or `None` when the queue has nothing runnable.
    pub(crate) fn take_next_due(&mut self, deadline: u64) -> Option<ScheduledTask> {
        let index = self
            .task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_at <= deadline)
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(index, _)| index)?;
        Some(self.task_queue.remove(index))
    }
}
