//! Cross-thread task handoff into the frame loop.
//!
//! Pick readbacks complete on renderer threads; their results queue here
//! and drain at fixed points in the next frame's draw.

use std::sync::Mutex;

/// Unbounded multi-producer queue drained in one shot each frame.
#[derive(Debug)]
pub struct TaskQueue<T> {
    inner: Mutex<Vec<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn push(&self, task: T) {
        self.lock().push(task);
    }

    /// Take everything queued so far. Items pushed while draining land in
    /// the next drain.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // A panicked producer leaves the vec intact; keep serving it.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn drains_in_push_order() {
        let q = TaskQueue::default();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.drain(), vec![1, 2, 3]);
        assert!(q.is_empty());
    }

    #[test]
    fn concurrent_pushes_all_arrive() {
        let q = Arc::new(TaskQueue::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let q = Arc::clone(&q);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        q.push(t * 100 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(q.drain().len(), 800);
    }
}
