//! In-process address space
//! Location: src/publish/memory.rs
//!
//! Mirrors the layout a data-access server exposes for the factory: a root
//! `Factory` object, one object per line and machine, and one writable
//! variable per tag addressed as `ns=<idx>;s=Factory/<line>/<machine>/<tag>`.
//! Variables start at `0.0` until the first write.

use super::traits::PublishAdapter;
use crate::config::constants::server;
use crate::config::ServerSettings;
use crate::error::PublishError;
use crate::topology::{Factory, TagId, TagRange};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// First namespace index available to applications
const APPLICATION_NAMESPACE_INDEX: u16 = 2;

/// String node identifier within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: String,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};s={}", self.namespace, self.identifier)
    }
}

/// One published variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableNode {
    pub node_id: NodeId,
    pub browse_path: String,
    pub tag: TagId,
    pub range: TagRange,
    pub value: f64,
    pub unit: Option<String>,
    pub writable: bool,
}

/// Address space held in memory
pub struct InMemoryAddressSpace {
    settings: ServerSettings,
    namespace_index: u16,
    nodes: RwLock<HashMap<NodeId, VariableNode>>,
    order: RwLock<Vec<NodeId>>,
    writes: AtomicU64,
}

impl InMemoryAddressSpace {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            settings,
            namespace_index: APPLICATION_NAMESPACE_INDEX,
            nodes: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }

    pub fn server_name(&self) -> &str {
        &self.settings.server_name
    }

    pub fn namespace_uri(&self) -> &str {
        &self.settings.namespace_uri
    }

    pub fn namespace_index(&self) -> u16 {
        self.namespace_index
    }

    /// Node id of the variable at `line/machine/tag`
    pub fn node_id(&self, path: &str) -> NodeId {
        NodeId {
            namespace: self.namespace_index,
            identifier: format!("{}/{}", server::ROOT_OBJECT_NAME, path),
        }
    }

    pub fn read(&self, node: &NodeId) -> Option<f64> {
        self.nodes.read().get(node).map(|variable| variable.value)
    }

    pub fn variable(&self, node: &NodeId) -> Option<VariableNode> {
        self.nodes.read().get(node).cloned()
    }

    /// All variables in registration order
    pub fn variables(&self) -> Vec<VariableNode> {
        let nodes = self.nodes.read();
        self.order
            .read()
            .iter()
            .filter_map(|id| nodes.get(id).cloned())
            .collect()
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// A client writing a variable directly.
    ///
    /// Values outside the tag's range are rejected, as the runtime state
    /// would reject them. Returns the tag behind the node so the caller can
    /// forward the value into the runtime state.
    pub fn client_write(&self, node: &NodeId, value: f64) -> Result<TagId, PublishError> {
        let mut nodes = self.nodes.write();
        let variable = nodes
            .get_mut(node)
            .ok_or_else(|| PublishError::UnknownHandle(node.to_string()))?;

        if !variable.writable {
            return Err(PublishError::Rejected {
                node: node.to_string(),
                reason: "variable is read-only".to_string(),
            });
        }

        if !variable.range.contains(value) {
            return Err(PublishError::Rejected {
                node: node.to_string(),
                reason: format!(
                    "value {} outside [{}, {}]",
                    value,
                    variable.range.min(),
                    variable.range.max()
                ),
            });
        }

        variable.value = value;
        Ok(variable.tag)
    }
}

impl Default for InMemoryAddressSpace {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}

#[async_trait]
impl PublishAdapter for InMemoryAddressSpace {
    type Handle = NodeId;

    async fn register(&self, factory: &Factory) -> Result<Vec<NodeId>, PublishError> {
        let mut nodes = self.nodes.write();
        let mut order = self.order.write();
        if !nodes.is_empty() {
            return Err(PublishError::Registration(
                "address space already holds a factory".to_string(),
            ));
        }

        let mut handles = Vec::with_capacity(factory.tag_count());
        for entry in factory.tags() {
            let browse_path = format!("{}/{}", server::ROOT_OBJECT_NAME, entry.path);
            let node_id = NodeId {
                namespace: self.namespace_index,
                identifier: browse_path.clone(),
            };

            nodes.insert(
                node_id.clone(),
                VariableNode {
                    node_id: node_id.clone(),
                    browse_path,
                    tag: entry.id,
                    range: entry.tag.range(),
                    value: server::INITIAL_VARIABLE_VALUE,
                    unit: entry.tag.unit().map(str::to_string),
                    writable: true,
                },
            );
            order.push(node_id.clone());
            handles.push(node_id);
        }

        info!(
            endpoint = %self.settings.endpoint,
            namespace = %self.settings.namespace_uri,
            variables = handles.len(),
            "Registered factory address space"
        );
        Ok(handles)
    }

    async fn write(&self, handle: &NodeId, value: f64) -> Result<(), PublishError> {
        let mut nodes = self.nodes.write();
        let variable = nodes
            .get_mut(handle)
            .ok_or_else(|| PublishError::UnknownHandle(handle.to_string()))?;
        variable.value = value;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{default_topology, WaveformRules};

    fn factory() -> Factory {
        Factory::from_spec(&default_topology(), WaveformRules::default()).unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_variable_per_tag() {
        let space = InMemoryAddressSpace::default();
        let factory = factory();
        let handles = space.register(&factory).await.unwrap();

        assert_eq!(handles.len(), factory.tag_count());
        assert_eq!(handles[0].to_string(), "ns=2;s=Factory/Line1/Machine1/speed");

        let variables = space.variables();
        assert_eq!(variables.len(), 9);
        assert!(variables.iter().all(|v| v.writable && v.value == 0.0));
        assert_eq!(variables[0].unit.as_deref(), Some("m/s"));
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let space = InMemoryAddressSpace::default();
        let factory = factory();
        space.register(&factory).await.unwrap();
        assert!(matches!(
            space.register(&factory).await,
            Err(PublishError::Registration(_))
        ));
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let space = InMemoryAddressSpace::default();
        let handles = space.register(&factory()).await.unwrap();

        space.write(&handles[3], 1234.5).await.unwrap();
        assert_eq!(space.read(&handles[3]), Some(1234.5));
        assert_eq!(space.write_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_handle() {
        let space = InMemoryAddressSpace::default();
        space.register(&factory()).await.unwrap();

        let bogus = space.node_id("Line9/Machine9/speed");
        assert!(matches!(
            space.write(&bogus, 1.0).await,
            Err(PublishError::UnknownHandle(_))
        ));
    }

    #[tokio::test]
    async fn test_client_write_returns_tag() {
        let space = InMemoryAddressSpace::default();
        let factory = factory();
        space.register(&factory).await.unwrap();

        let node = space.node_id("Line1/Machine2/torque");
        let tag = space.client_write(&node, 11.0).unwrap();

        assert_eq!(Some(tag), factory.find("Line1", "Machine2", "torque"));
        assert_eq!(space.read(&node), Some(11.0));
    }

    #[tokio::test]
    async fn test_client_write_out_of_range_rejected() {
        let space = InMemoryAddressSpace::default();
        let handles = space.register(&factory()).await.unwrap();
        space.write(&handles[4], 23.0).await.unwrap();

        let torque = space.node_id("Line1/Machine2/torque");
        for value in [99.0, 9.99, f64::NAN] {
            assert!(matches!(
                space.client_write(&torque, value),
                Err(PublishError::Rejected { .. })
            ));
        }
        assert_eq!(space.read(&torque), Some(23.0));
        assert_eq!(space.variable(&torque).unwrap().range.max(), 30.0);
    }

    #[test]
    fn test_server_identity_defaults() {
        let space = InMemoryAddressSpace::default();
        assert_eq!(space.endpoint(), "opc.tcp://0.0.0.0:4840/factory/");
        assert_eq!(space.server_name(), "Multi-Line OPC UA Factory Simulator");
        assert_eq!(space.namespace_uri(), "http://helloworld.com/opcua/factory/");
    }
}
