//! Work items and the shared FIFO task queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A unit of dispatchable work. Consumed exactly once; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Search a keyword; successful results feed new `Visit` tasks.
    Search { keyword: String },
    /// Visit a URL directly.
    Visit { url: String },
}

/// FIFO queue shared by all workers. Enqueue order is preserved; completion
/// order across workers is not.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    inner: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, task: Task) {
        self.inner.lock().unwrap().push_back(task);
    }

    pub fn pop(&self) -> Option<Task> {
        self.inner.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
