//! history.rs: session-scoped log of recent scans for UI display.
//! Never persisted; callers that want durable records store the events
//! themselves.

use std::sync::Mutex;

use crate::orchestrator::ScanEvent;

#[derive(Debug)]
pub struct ScanHistory {
    inner: Mutex<Vec<ScanEvent>>,
    cap: usize,
}

impl ScanHistory {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(1_000))),
            cap: cap.min(1_000),
        }
    }

    pub fn push(&self, event: &ScanEvent) {
        let mut v = self.inner.lock().expect("scan history mutex poisoned");
        v.push(event.clone());
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Most recent `n` scans, newest last.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<ScanEvent> {
        let v = self.inner.lock().expect("scan history mutex poisoned");
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("scan history mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
