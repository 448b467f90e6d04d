// src/publish/traits.rs
//! Boundary between the generator and the external data-access server

use crate::error::PublishError;
use crate::topology::Factory;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Writes generated values into an external server's address space
#[async_trait]
pub trait PublishAdapter: Send + Sync {
    /// Opaque reference to one published variable
    type Handle: Clone + Debug + Send + Sync + 'static;

    /// Create one writable variable per tag.
    ///
    /// Called once at startup. Handles come back in topology order: lines,
    /// machines within a line, tags within a machine.
    async fn register(&self, factory: &Factory) -> Result<Vec<Self::Handle>, PublishError>;

    /// Write one value to one variable
    async fn write(&self, handle: &Self::Handle, value: f64) -> Result<(), PublishError>;
}

#[async_trait]
impl<A: PublishAdapter> PublishAdapter for Arc<A> {
    type Handle = A::Handle;

    async fn register(&self, factory: &Factory) -> Result<Vec<Self::Handle>, PublishError> {
        self.as_ref().register(factory).await
    }

    async fn write(&self, handle: &Self::Handle, value: f64) -> Result<(), PublishError> {
        self.as_ref().write(handle, value).await
    }
}
