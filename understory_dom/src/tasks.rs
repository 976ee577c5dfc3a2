// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Macrotask queue with a virtual millisecond clock.
//!
//! Tasks are ordered by due time, then by enqueue order. Running a task moves the clock
//! forward to its due time; the clock never moves backward.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use crate::types::TimerId;

pub(crate) type Task = Box<dyn FnOnce()>;

#[derive(Default)]
pub(crate) struct TaskQueue {
    now: u64,
    next_seq: u64,
    // (due, seq) -> task; seq doubles as the timer id.
    queue: BTreeMap<(u64, u64), Task>,
    due_of: BTreeMap<u64, u64>,
}

impl core::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl TaskQueue {
    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn schedule(&mut self, delay_ms: u32, task: Task) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now.saturating_add(u64::from(delay_ms));
        self.queue.insert((due, seq), task);
        self.due_of.insert(seq, due);
        TimerId(seq)
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let Some(due) = self.due_of.remove(&id.0) else {
            return false;
        };
        self.queue.remove(&(due, id.0)).is_some()
    }

    /// Due time of the next task, if any.
    pub(crate) fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Pop the next task and advance the clock to its due time.
    pub(crate) fn pop(&mut self) -> Option<(TimerId, Task)> {
        let ((due, seq), task) = self.queue.pop_first()?;
        self.due_of.remove(&seq);
        self.now = self.now.max(due);
        Some((TimerId(seq), task))
    }

    pub(crate) fn advance_to(&mut self, t: u64) {
        self.now = self.now.max(t);
    }
}
