//! Publisher that reports every write through `tracing`
//! Location: src/publish/logging.rs

use super::traits::PublishAdapter;
use crate::error::PublishError;
use crate::topology::Factory;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TracingPublisher {
    verbose: bool,
    writes: AtomicU64,
}

impl TracingPublisher {
    /// `verbose` logs each write at info level, otherwise at debug
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            writes: AtomicU64::new(0),
        }
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PublishAdapter for TracingPublisher {
    type Handle = Arc<str>;

    async fn register(&self, factory: &Factory) -> Result<Vec<Arc<str>>, PublishError> {
        let handles: Vec<Arc<str>> = factory
            .tags()
            .map(|entry| Arc::from(entry.path.to_string()))
            .collect();
        info!(variables = handles.len(), "Registered tags with tracing publisher");
        Ok(handles)
    }

    async fn write(&self, handle: &Arc<str>, value: f64) -> Result<(), PublishError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if self.verbose {
            info!(tag = %handle, value, "Updated");
        } else {
            debug!(tag = %handle, value, "Updated");
        }
        Ok(())
    }
}
