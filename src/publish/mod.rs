// src/publish/mod.rs
//! Publish adapters for generated tag values

pub mod logging;
pub mod memory;
pub mod traits;

pub use logging::TracingPublisher;
pub use memory::{InMemoryAddressSpace, NodeId, VariableNode};
pub use traits::PublishAdapter;
