use std::sync::{Arc, Mutex};

/// Shared, ordered record of which tasks were dispatched.
#[derive(Debug, Clone, Default)]
pub struct DispatchLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl DispatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, task: &str) {
        self.entries.lock().unwrap().push(task.to_string());
    }

    /// Snapshot of everything recorded so far, in dispatch order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, task: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == task)
            .count()
    }

    pub fn position(&self, task: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|t| t == task)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
