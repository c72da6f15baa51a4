#![allow(dead_code)]

//! Fixed-size worker pool draining one work queue.
//!
//! Constructed eagerly at process start and handed to whoever needs to submit
//! work; there is no lazy singleton. Shutdown cancels the pool's token; each
//! worker finishes the item it holds, then exits on its next pop.

use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::pipeline::queue::WorkQueue;

/// Anything a worker pool can process. The id ties log lines and failure
/// writes back to the run record.
pub trait WorkItem: Send + 'static {
    fn id(&self) -> Uuid;
}

pub struct WorkerPool {
    name: &'static str,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` tasks, each looping pop → handle. Errors reaching the
    /// loop are service failures the stage chose not to absorb: they are
    /// logged with the item id and the worker moves on, leaving the run
    /// record untouched.
    pub fn start<T, F, Fut>(
        name: &'static str,
        workers: usize,
        queue: WorkQueue<T>,
        handler: F,
    ) -> Self
    where
        T: WorkItem,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<(), PipelineError>> + Send,
    {
        let cancel = CancellationToken::new();
        let handles = (0..workers)
            .map(|worker| {
                let queue = queue.clone();
                let handler = handler.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    debug!("{name} worker {worker} started");
                    while let Some(item) = queue.pop(&cancel).await {
                        let item_id = item.id();
                        debug!("{name} worker {worker} picked up {item_id}");
                        if let Err(e) = handler(item).await {
                            error!("{name} worker {worker}: processing {item_id} failed: {e:#}");
                        }
                    }
                    debug!("{name} worker {worker} stopped");
                })
            })
            .collect();

        info!("{name} pool started with {workers} workers");
        Self {
            name,
            cancel,
            handles,
        }
    }

    /// Cancels the pool and waits for every worker to finish its current
    /// item. An item already dequeued always runs to completion.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("{} worker panicked: {e}", self.name);
            }
        }
        info!("{} pool stopped", self.name);
    }
}
