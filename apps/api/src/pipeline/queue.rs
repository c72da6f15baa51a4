#![allow(dead_code)]

//! Unbounded FIFO work queue with a cancellation-aware blocking pop.
//!
//! Built on a single mpsc channel whose receiver is shared behind a mutex, so
//! any number of workers can drain one queue and every item is delivered to
//! exactly one of them, in enqueue order.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

pub struct WorkQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<T>>>,
}

// Manual impl: a queue of non-Clone items is still cloneable.
impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Appends to the tail. Never blocks.
    pub fn push(&self, item: T) {
        // Cannot fail: the queue owns its receiver for its whole lifetime.
        let _ = self.tx.send(item);
    }

    /// Blocks until an item is available or `cancel` fires; `None` means
    /// cancelled. Workers parked here (or waiting on the receiver lock) wake
    /// immediately on cancellation rather than polling.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<T> {
        let mut rx = tokio::select! {
            _ = cancel.cancelled() => return None,
            guard = self.rx.lock() => guard,
        };
        tokio::select! {
            _ = cancel.cancelled() => None,
            item = rx.recv() => item,
        }
    }

    /// Non-blocking pop, for draining in tests and shutdown accounting.
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }
}
