//! Task queue seam with an in-memory implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::QueueError;
use crate::models::task::{Task, TaskKind, TaskStatus};

/// Queue collaborator contract.
///
/// Delivery is at-least-once: `dequeue` moves the task to a processing
/// list, making it visible to exactly one worker, and the worker must
/// then `complete`, `fail`, or `requeue` it. A crashed worker leaves its
/// task in the processing list, recoverable rather than lost.
pub trait TaskQueue: Send + Sync {
    /// Enqueue a new task, returning its id.
    fn enqueue(&self, queue: &str, kind: TaskKind, payload: Value) -> Result<String, QueueError>;

    /// Pull the next task, waiting at most `timeout`. `None` means the
    /// queue stayed empty; it is not an error.
    fn dequeue(&self, queue: &str, timeout: Duration) -> Result<Option<Task>, QueueError>;

    /// Acknowledge a task as completed, recording its result.
    fn complete(&self, queue: &str, id: &str, result: Value) -> Result<(), QueueError>;

    /// Mark a task permanently failed (dead-lettered, surfaced for
    /// manual inspection, not retried further).
    fn fail(&self, queue: &str, id: &str, reason: &str) -> Result<(), QueueError>;

    /// Return a dequeued task to the pending queue for another attempt.
    fn requeue(&self, queue: &str, id: &str) -> Result<(), QueueError>;
}

impl<T: TaskQueue + ?Sized> TaskQueue for std::sync::Arc<T> {
    fn enqueue(&self, queue: &str, kind: TaskKind, payload: Value) -> Result<String, QueueError> {
        (**self).enqueue(queue, kind, payload)
    }

    fn dequeue(&self, queue: &str, timeout: Duration) -> Result<Option<Task>, QueueError> {
        (**self).dequeue(queue, timeout)
    }

    fn complete(&self, queue: &str, id: &str, result: Value) -> Result<(), QueueError> {
        (**self).complete(queue, id, result)
    }

    fn fail(&self, queue: &str, id: &str, reason: &str) -> Result<(), QueueError> {
        (**self).fail(queue, id, reason)
    }

    fn requeue(&self, queue: &str, id: &str) -> Result<(), QueueError> {
        (**self).requeue(queue, id)
    }
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<String, VecDeque<String>>,
    processing: HashMap<String, Vec<String>>,
    tasks: HashMap<String, Task>,
}

/// In-memory [`TaskQueue`], used by the worker binary and tests.
#[derive(Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, QueueError> {
        self.state
            .lock()
            .map_err(|_| QueueError::Backend("queue lock poisoned".to_string()))
    }

    /// Look up a task by id.
    pub fn task(&self, id: &str) -> Result<Option<Task>, QueueError> {
        Ok(self.lock()?.tasks.get(id).cloned())
    }

    /// Tasks that were permanently failed, for manual inspection.
    pub fn dead_letters(&self) -> Result<Vec<Task>, QueueError> {
        let state = self.lock()?;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Failed)
            .cloned()
            .collect())
    }

    /// Move every task stuck in the processing list back to pending.
    ///
    /// Covers the crashed-worker case: a task dequeued but never
    /// acknowledged sits in processing until someone recovers it.
    pub fn recover_stale(&self, queue: &str) -> Result<usize, QueueError> {
        let mut state = self.lock()?;
        let stale: Vec<String> = state
            .processing
            .get_mut(queue)
            .map(std::mem::take)
            .unwrap_or_default();

        let recovered = stale.len();
        for id in stale {
            if let Some(task) = state.tasks.get_mut(&id) {
                task.status = TaskStatus::Pending;
                task.updated_at = Utc::now();
            }
            state.pending.entry(queue.to_string()).or_default().push_back(id);
        }

        if recovered > 0 {
            info!(queue, recovered, "recovered stale processing tasks");
            self.available.notify_all();
        }
        Ok(recovered)
    }

    fn take_processing(
        state: &mut QueueState,
        queue: &str,
        id: &str,
    ) -> Result<(), QueueError> {
        let list = state
            .processing
            .get_mut(queue)
            .ok_or_else(|| QueueError::TaskNotFound(id.to_string()))?;
        let pos = list.iter().position(|t| t == id).ok_or_else(|| {
            QueueError::InvalidState {
                id: id.to_string(),
                expected: "processing".to_string(),
            }
        })?;
        list.remove(pos);
        Ok(())
    }
}

impl TaskQueue for InMemoryQueue {
    fn enqueue(&self, queue: &str, kind: TaskKind, payload: Value) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let task = Task {
            id: id.clone(),
            kind,
            payload,
            status: TaskStatus::Pending,
            attempts: 0,
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.lock()?;
        state.tasks.insert(id.clone(), task);
        state
            .pending
            .entry(queue.to_string())
            .or_default()
            .push_back(id.clone());
        drop(state);

        self.available.notify_one();
        debug!(queue, task_id = %id, "task enqueued");
        Ok(id)
    }

    fn dequeue(&self, queue: &str, timeout: Duration) -> Result<Option<Task>, QueueError> {
        let mut state = self.lock()?;

        if state.pending.get(queue).map_or(true, VecDeque::is_empty) {
            let (guard, wait) = self
                .available
                .wait_timeout(state, timeout)
                .map_err(|_| QueueError::Backend("queue lock poisoned".to_string()))?;
            state = guard;
            if wait.timed_out() && state.pending.get(queue).map_or(true, VecDeque::is_empty) {
                return Ok(None);
            }
        }

        let Some(id) = state.pending.get_mut(queue).and_then(VecDeque::pop_front) else {
            return Ok(None);
        };

        state
            .processing
            .entry(queue.to_string())
            .or_default()
            .push(id.clone());

        let task = state
            .tasks
            .get_mut(&id)
            .ok_or_else(|| QueueError::TaskNotFound(id.clone()))?;
        task.status = TaskStatus::Processing;
        task.attempts += 1;
        task.updated_at = Utc::now();

        debug!(queue, task_id = %id, attempts = task.attempts, "task dequeued");
        Ok(Some(task.clone()))
    }

    fn complete(&self, queue: &str, id: &str, result: Value) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        Self::take_processing(&mut state, queue, id)?;

        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| QueueError::TaskNotFound(id.to_string()))?;
        task.status = TaskStatus::Completed;
        task.result = Some(result);
        task.updated_at = Utc::now();

        info!(queue, task_id = %id, "task completed");
        Ok(())
    }

    fn fail(&self, queue: &str, id: &str, reason: &str) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        Self::take_processing(&mut state, queue, id)?;

        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| QueueError::TaskNotFound(id.to_string()))?;
        task.status = TaskStatus::Failed;
        task.error = Some(reason.to_string());
        task.updated_at = Utc::now();

        warn!(queue, task_id = %id, reason, "task dead-lettered");
        Ok(())
    }

    fn requeue(&self, queue: &str, id: &str) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        Self::take_processing(&mut state, queue, id)?;

        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| QueueError::TaskNotFound(id.to_string()))?;
        task.status = TaskStatus::Pending;
        task.updated_at = Utc::now();

        state
            .pending
            .entry(queue.to_string())
            .or_default()
            .push_back(id.to_string());
        drop(state);

        self.available.notify_one();
        info!(queue, task_id = %id, "task requeued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const Q: &str = "default";
    const NO_WAIT: Duration = Duration::from_millis(0);

    #[test]
    fn enqueue_dequeue_complete() {
        let queue = InMemoryQueue::new();
        let id = queue
            .enqueue(Q, TaskKind::Extract, json!({"receipt_id": 1}))
            .unwrap();

        let task = queue.dequeue(Q, NO_WAIT).unwrap().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.attempts, 1);

        queue.complete(Q, &id, json!({"ok": true})).unwrap();
        let task = queue.task(&id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"ok": true})));
    }

    #[test]
    fn empty_queue_times_out_to_none() {
        let queue = InMemoryQueue::new();
        assert!(queue.dequeue(Q, Duration::from_millis(5)).unwrap().is_none());
    }

    #[test]
    fn dequeued_task_is_invisible_to_other_consumers() {
        let queue = InMemoryQueue::new();
        queue.enqueue(Q, TaskKind::Match, json!({"text": "x"})).unwrap();

        assert!(queue.dequeue(Q, NO_WAIT).unwrap().is_some());
        assert!(queue.dequeue(Q, NO_WAIT).unwrap().is_none());
    }

    #[test]
    fn requeue_makes_task_visible_again_and_counts_attempts() {
        let queue = InMemoryQueue::new();
        let id = queue
            .enqueue(Q, TaskKind::Extract, json!({"receipt_id": 1}))
            .unwrap();

        queue.dequeue(Q, NO_WAIT).unwrap().unwrap();
        queue.requeue(Q, &id).unwrap();

        let task = queue.dequeue(Q, NO_WAIT).unwrap().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.attempts, 2);
    }

    #[test]
    fn failed_tasks_are_dead_lettered() {
        let queue = InMemoryQueue::new();
        let id = queue
            .enqueue(Q, TaskKind::Extract, json!({"receipt_id": 1}))
            .unwrap();
        queue.dequeue(Q, NO_WAIT).unwrap();
        queue.fail(Q, &id, "boom").unwrap();

        let dead = queue.dead_letters().unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].error.as_deref(), Some("boom"));

        // permanently failed: not visible to dequeue anymore
        assert!(queue.dequeue(Q, NO_WAIT).unwrap().is_none());
    }

    #[test]
    fn stale_processing_tasks_are_recoverable() {
        let queue = InMemoryQueue::new();
        let id = queue
            .enqueue(Q, TaskKind::Extract, json!({"receipt_id": 1}))
            .unwrap();

        // a worker dequeues and then crashes without acknowledging
        queue.dequeue(Q, NO_WAIT).unwrap().unwrap();
        assert!(queue.dequeue(Q, NO_WAIT).unwrap().is_none());

        assert_eq!(queue.recover_stale(Q).unwrap(), 1);
        let task = queue.dequeue(Q, NO_WAIT).unwrap().unwrap();
        assert_eq!(task.id, id);
    }

    #[test]
    fn completing_an_unknown_task_is_an_error() {
        let queue = InMemoryQueue::new();
        let err = queue.complete(Q, "nope", json!(null)).unwrap_err();
        assert!(matches!(err, QueueError::TaskNotFound(_)));
    }
}
