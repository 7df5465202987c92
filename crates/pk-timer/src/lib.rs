//! Cancellable scheduled tasks driven by an explicit clock.
//!
//! The queue never reads wall time. Owners advance it with the time that has
//! elapsed on their event loop, which keeps scheduling deterministic under test.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;

/// Handle returned by [`TimerQueue::schedule_after`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// Task popped from the queue once its deadline is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask<T> {
    pub handle: TaskHandle,
    pub deadline: Duration,
    pub task: T,
}

/// Deadline-ordered task queue. Ties run in scheduling order.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 1,
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule_after(&mut self, delay: Duration, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;

        let deadline = self.now.saturating_add(delay);
        self.pending.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TaskHandle(id)
    }

    /// Removes a pending task. Returns `None` if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.pending.remove(&(deadline, handle.0))
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Time remaining until the earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(self.now))
    }

    /// Pops the earliest task due at or before `target`, moving the clock to its deadline.
    ///
    /// Tasks scheduled while handling a popped task are measured from that
    /// deadline, so a chain of follow-ups inside one window runs in order.
    pub fn pop_until(&mut self, target: Duration) -> Option<DueTask<T>> {
        let (&(deadline, id), _) = self.pending.first_key_value()?;
        if deadline > target {
            return None;
        }

        let task = self.pending.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        if deadline > self.now {
            self.now = deadline;
        }

        Some(DueTask {
            handle: TaskHandle(id),
            deadline,
            task,
        })
    }

    /// Moves the clock forward without running anything. Never moves it back.
    pub fn advance_to(&mut self, target: Duration) {
        if target > self.now {
            self.now = target;
        }
    }

    /// Advances by `elapsed` and returns every task that became due, in order.
    pub fn drain_due(&mut self, elapsed: Duration) -> Vec<DueTask<T>> {
        let target = self.now.saturating_add(elapsed);
        let mut due = Vec::new();
        while let Some(task) = self.pop_until(target) {
            due.push(task);
        }
        self.advance_to(target);
        due
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
