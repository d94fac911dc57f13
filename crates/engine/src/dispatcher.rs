// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project FIFO admission.
//!
//! Each project has one running slot and a FIFO of pending executions. The
//! slot is only ever empty when the FIFO is empty too. Projects are
//! independent: each queue has its own lock, and the outer map lock is held
//! only long enough to find or create a queue.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use sy_core::{ExecutionId, ProjectKey};

/// Outcome of admitting an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The execution took the running slot and should be started now
    Start,
    /// The execution waits behind others; 1 is next in line
    Queued { position: usize },
}

/// A project's queue at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub running: Option<ExecutionId>,
    pub pending: Vec<ExecutionId>,
}

#[derive(Debug, Default)]
struct ProjectQueue {
    running: Option<ExecutionId>,
    pending: VecDeque<ExecutionId>,
}

#[derive(Debug, Default)]
pub(crate) struct Dispatcher {
    queues: Mutex<HashMap<ProjectKey, Arc<Mutex<ProjectQueue>>>>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn queue(&self, project: &ProjectKey) -> Arc<Mutex<ProjectQueue>> {
        Arc::clone(self.queues.lock().entry(project.clone()).or_default())
    }

    fn existing(&self, project: &ProjectKey) -> Option<Arc<Mutex<ProjectQueue>>> {
        self.queues.lock().get(project).cloned()
    }

    /// Take the running slot if free, else join the back of the queue.
    pub(crate) fn admit(&self, project: &ProjectKey, id: ExecutionId) -> Admission {
        let queue = self.queue(project);
        let mut queue = queue.lock();
        if queue.running.is_none() {
            queue.running = Some(id);
            Admission::Start
        } else {
            queue.pending.push_back(id);
            Admission::Queued {
                position: queue.pending.len(),
            }
        }
    }

    /// Release the running slot held by `id` and promote the next pending
    /// execution, which the caller must then start.
    ///
    /// Returns `None` when nothing is waiting, or when `id` does not hold
    /// the slot.
    pub(crate) fn complete(&self, project: &ProjectKey, id: &ExecutionId) -> Option<ExecutionId> {
        let queue = self.existing(project)?;
        let mut queue = queue.lock();
        if queue.running.as_ref() != Some(id) {
            tracing::warn!(%project, execution_id = %id, "completion for execution not holding the slot");
            return None;
        }
        queue.running = queue.pending.pop_front();
        queue.running.clone()
    }

    /// Remove `id` from the pending FIFO. Returns whether it was there; a
    /// `true` means no one else will ever start it.
    pub(crate) fn remove_pending(&self, project: &ProjectKey, id: &ExecutionId) -> bool {
        let Some(queue) = self.existing(project) else {
            return false;
        };
        let mut queue = queue.lock();
        match queue.pending.iter().position(|p| p == id) {
            Some(index) => {
                queue.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self, project: &ProjectKey) -> QueueSnapshot {
        match self.existing(project) {
            Some(queue) => {
                let queue = queue.lock();
                QueueSnapshot {
                    running: queue.running.clone(),
                    pending: queue.pending.iter().cloned().collect(),
                }
            }
            None => QueueSnapshot::default(),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
