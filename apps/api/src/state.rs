use crate::config::Config;
use crate::pipeline::{QueueItem, WorkQueue};
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
    /// Intake queues for the two document pipelines. Handlers only push;
    /// the worker pools draining them are owned by main.
    pub resume_queue: WorkQueue<QueueItem>,
    pub listing_queue: WorkQueue<QueueItem>,
}
