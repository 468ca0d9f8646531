//! Task and microtask queues plus the logical clock
//!
//! The task queue is ordered by delay with ties kept in enqueue order. The
//! microtask queue is strict FIFO. Neither queue runs anything itself; the
//! event loop in [`crate::interpreter`] drains them.

use std::collections::VecDeque;

use serde::Serialize;

use crate::value::{JsString, PromiseId, Reaction, Value};

/// Identifier returned by `setTimeout`, accepted by `clearTimeout`
pub type TimerId = u64;

/// A deferred macrotask (timer callback)
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TimerId,
    pub name: JsString,
    /// Logical delay, used only as an ordering key
    pub delay: f64,
    pub callback: Value,
    pub args: Vec<Value>,
}

/// What a task looks like in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEntry {
    pub name: JsString,
    pub delay: f64,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
    next_id: TimerId,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for a task about to be enqueued
    pub fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        self.next_id
    }

    /// Insert after every task with a delay less than or equal to this one,
    /// which keeps the queue sorted and ties in insertion order.
    pub fn enqueue(&mut self, task: Task) {
        let index = self.tasks.partition_point(|queued| queued.delay <= task.delay);
        self.tasks.insert(index, task);
    }

    /// Remove the task with the lowest delay
    pub fn dequeue(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Remove a pending task by id
    pub fn cancel(&mut self, id: TimerId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        self.tasks.remove(index)
    }

    pub fn entries(&self) -> Vec<TaskEntry> {
        self.tasks
            .iter()
            .map(|task| TaskEntry {
                name: task.name.clone(),
                delay: task.delay,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Work carried by a microtask
#[derive(Debug, Clone)]
pub enum MicrotaskJob {
    /// `queueMicrotask(callback)`
    Callback { callback: Value },
    /// A promise reaction, run with the value its source promise settled to
    Reaction { reaction: Reaction, value: Value },
    /// `promise` was resolved with another promise: subscribe to `thenable`
    /// so `promise` follows it
    ResolveThenable { promise: PromiseId, thenable: PromiseId },
}

#[derive(Debug, Clone)]
pub struct Microtask {
    pub name: JsString,
    pub job: MicrotaskJob,
}

#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    jobs: VecDeque<Microtask>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, microtask: Microtask) {
        self.jobs.push_back(microtask);
    }

    pub fn dequeue(&mut self) -> Option<Microtask> {
        self.jobs.pop_front()
    }

    pub fn names(&self) -> Vec<JsString> {
        self.jobs.iter().map(|job| job.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Monotonic logical time. Informational only; it never reorders tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogicalClock {
    now: f64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move forward to `time` if it is later than the current time
    pub fn advance_to(&mut self, time: f64) {
        if time > self.now {
            self.now = time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(queue: &mut TaskQueue, name: &str, delay: f64) -> TimerId {
        let id = queue.next_id();
        queue.enqueue(Task {
            id,
            name: JsString::from(name),
            delay,
            callback: Value::Undefined,
            args: Vec::new(),
        });
        id
    }

    fn names(queue: &TaskQueue) -> Vec<String> {
        queue.iter().map(|task| task.name.to_string()).collect()
    }

    #[test]
    fn test_tasks_sorted_by_delay() {
        let mut queue = TaskQueue::new();
        task(&mut queue, "slow", 100.0);
        task(&mut queue, "fast", 10.0);
        task(&mut queue, "medium", 50.0);

        assert_eq!(names(&queue), vec!["fast", "medium", "slow"]);
        assert_eq!(queue.dequeue().map(|t| t.delay), Some(10.0));
    }

    #[test]
    fn test_equal_delays_keep_insertion_order() {
        let mut queue = TaskQueue::new();
        task(&mut queue, "a", 0.0);
        task(&mut queue, "b", 5.0);
        task(&mut queue, "c", 0.0);
        task(&mut queue, "d", 5.0);

        assert_eq!(names(&queue), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_cancel_by_id() {
        let mut queue = TaskQueue::new();
        let first = task(&mut queue, "a", 0.0);
        task(&mut queue, "b", 0.0);

        assert!(queue.cancel(first).is_some());
        assert!(queue.cancel(first).is_none());
        assert_eq!(names(&queue), vec!["b"]);
    }

    #[test]
    fn test_timer_ids_start_at_one() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.next_id(), 1);
        assert_eq!(queue.next_id(), 2);
    }

    #[test]
    fn test_microtasks_fifo() {
        let mut queue = MicrotaskQueue::new();
        for name in ["first", "second"] {
            queue.enqueue(Microtask {
                name: JsString::from(name),
                job: MicrotaskJob::Callback {
                    callback: Value::Undefined,
                },
            });
        }
        assert_eq!(queue.dequeue().map(|m| m.name.to_string()), Some("first".to_string()));
        assert_eq!(queue.names(), vec![JsString::from("second")]);
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut clock = LogicalClock::new();
        clock.advance_to(100.0);
        clock.advance_to(10.0);
        assert_eq!(clock.now(), 100.0);
    }
}
