use std::collections::HashMap;
use tokio::task::JoinHandle;

/// Background task slots owned by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Reads frames off the live transport
    Reader,
    /// Sleeps out a backoff delay, then reopens the transport
    Reconnect,
}

/// Manages background tasks, at most one per [`TaskKind`]
pub struct TaskManager {
    handles: HashMap<TaskKind, JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Spawn a task in the given slot, aborting whatever occupied it
    pub fn spawn<F>(&mut self, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }

    /// Abort the task in one slot; returns whether one was running
    pub fn abort(&mut self, kind: TaskKind) -> bool {
        match self.handles.remove(&kind) {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    /// Forget a slot without aborting it (used by a task finishing itself)
    pub fn release(&mut self, kind: TaskKind) {
        self.handles.remove(&kind);
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.handles
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
