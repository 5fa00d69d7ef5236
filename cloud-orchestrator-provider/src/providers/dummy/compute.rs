use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{ProviderError, Result};
use crate::traits::{NodeDriver, ProviderDriver};
use crate::types::{
    CreateNodeRequest, CreateVolumeRequest, Extra, Node, NodeImage, NodeLocation, NodeSize,
    NodeState, StorageVolume, VolumeState,
};

use super::PROVIDER;

/// Status checks a fresh node spends in `pending` before it reports `running`.
const DEFAULT_BOOT_CHECKS: u32 = 2;

struct DummyNode {
    node: Node,
    /// Remaining `get_node` calls before a transitional state settles.
    checks_left: u32,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, DummyNode>,
    volumes: BTreeMap<String, StorageVolume>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory compute driver. Nodes boot through `pending` before reaching `running`.
pub struct DummyNodeDriver {
    state: RwLock<State>,
    boot_checks: u32,
}

impl Default for DummyNodeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyNodeDriver {
    pub fn new() -> Self {
        Self::with_boot_checks(DEFAULT_BOOT_CHECKS)
    }

    /// Driver whose nodes report `pending` for `checks` status checks after boot.
    pub fn with_boot_checks(checks: u32) -> Self {
        Self {
            state: RwLock::new(State::default()),
            boot_checks: checks,
        }
    }

    fn sizes() -> Vec<NodeSize> {
        [("small", 1, 1024, 25), ("medium", 2, 4096, 80), ("large", 4, 8192, 160)]
            .into_iter()
            .map(|(id, vcpus, ram_mb, disk_gb)| NodeSize {
                id: id.to_string(),
                name: format!("Dummy {id}"),
                ram_mb,
                disk_gb,
                vcpus,
                price_hourly: None,
                extra: Extra::new(),
            })
            .collect()
    }

    fn set_transition(&self, entry: &mut DummyNode, state: NodeState) {
        entry.node.state = state;
        entry.checks_left = self.boot_checks;
    }
}

fn node_not_found(node_id: &str) -> ProviderError {
    ProviderError::not_found(PROVIDER, "node", node_id)
}

fn volume_not_found(volume_id: &str) -> ProviderError {
    ProviderError::not_found(PROVIDER, "volume", volume_id)
}

fn invalid(param: &str, detail: impl Into<String>) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: PROVIDER.to_string(),
        param: param.to_string(),
        detail: detail.into(),
    }
}

#[async_trait]
impl ProviderDriver for DummyNodeDriver {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn validate_credentials(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl NodeDriver for DummyNodeDriver {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        Ok(state.nodes.values().map(|n| n.node.clone()).collect())
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        let mut state = self.state.write().await;
        let entry = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| node_not_found(node_id))?;

        if matches!(
            entry.node.state,
            NodeState::Pending | NodeState::Rebooting | NodeState::Starting
        ) {
            if entry.checks_left == 0 {
                entry.node.state = NodeState::Running;
            } else {
                entry.checks_left -= 1;
            }
        }
        Ok(entry.node.clone())
    }

    async fn create_node(&self, req: &CreateNodeRequest) -> Result<Node> {
        if req.name.trim().is_empty() {
            return Err(invalid("name", "node name must not be empty"));
        }
        if !Self::sizes().iter().any(|s| s.id == req.size) {
            return Err(invalid("size", format!("unknown size '{}'", req.size)));
        }
        if !self.list_images().await?.iter().any(|i| i.id == req.image) {
            return Err(invalid("image", format!("unknown image '{}'", req.image)));
        }

        let mut state = self.state.write().await;
        let n = state.next_id();
        let mut extra = req.extra.clone();
        if let Some(location) = &req.location {
            extra.insert("location".to_string(), Value::String(location.clone()));
        }
        let node = Node {
            id: n.to_string(),
            name: req.name.clone(),
            state: NodeState::Pending,
            public_ips: vec![format!("127.0.0.{}", n % 250 + 1)],
            private_ips: vec![format!("10.0.0.{}", n % 250 + 1)],
            size: Some(req.size.clone()),
            image: Some(req.image.clone()),
            created_at: Some(Utc::now()),
            extra,
        };
        log::debug!("[{PROVIDER}] Created node {} ({})", node.id, node.name);
        state.nodes.insert(
            node.id.clone(),
            DummyNode {
                node: node.clone(),
                checks_left: self.boot_checks,
            },
        );
        Ok(node)
    }

    async fn destroy_node(&self, node_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .nodes
            .remove(node_id)
            .ok_or_else(|| node_not_found(node_id))?;
        for volume in state.volumes.values_mut() {
            if volume.extra.get("node_id").and_then(Value::as_str) == Some(node_id) {
                volume.extra.remove("node_id");
                volume.state = VolumeState::Available;
            }
        }
        Ok(())
    }

    async fn reboot_node(&self, node_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| node_not_found(node_id))?;
        if entry.node.state != NodeState::Running {
            return Err(invalid(
                "node_id",
                format!("node {node_id} is {}, not running", entry.node.state),
            ));
        }
        self.set_transition(entry, NodeState::Rebooting);
        Ok(())
    }

    async fn start_node(&self, node_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| node_not_found(node_id))?;
        if entry.node.state == NodeState::Stopped {
            self.set_transition(entry, NodeState::Starting);
        }
        Ok(())
    }

    async fn stop_node(&self, node_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| node_not_found(node_id))?;
        entry.node.state = NodeState::Stopped;
        Ok(())
    }

    async fn list_sizes(&self) -> Result<Vec<NodeSize>> {
        Ok(Self::sizes())
    }

    async fn list_images(&self) -> Result<Vec<NodeImage>> {
        Ok([("ubuntu-24-04", "Ubuntu 24.04"), ("debian-12", "Debian 12")]
            .into_iter()
            .map(|(id, name)| NodeImage {
                id: id.to_string(),
                name: name.to_string(),
                extra: Extra::new(),
            })
            .collect())
    }

    async fn list_locations(&self) -> Result<Vec<NodeLocation>> {
        Ok(vec![NodeLocation {
            id: "dummy-1".to_string(),
            name: "Dummy Region 1".to_string(),
            country: Some("US".to_string()),
            extra: Extra::new(),
        }])
    }

    async fn list_volumes(&self) -> Result<Vec<StorageVolume>> {
        Ok(self.state.read().await.volumes.values().cloned().collect())
    }

    async fn create_volume(&self, req: &CreateVolumeRequest) -> Result<StorageVolume> {
        if req.size == 0 {
            return Err(invalid("size", "volume size must be at least 1 GiB"));
        }
        let mut state = self.state.write().await;
        let id = format!("vol-{}", state.next_id());
        let mut extra = Extra::new();
        if let Some(description) = &req.description {
            extra.insert("description".to_string(), Value::String(description.clone()));
        }
        let volume = StorageVolume {
            id: id.clone(),
            name: req.name.clone(),
            size: req.size,
            state: VolumeState::Available,
            extra,
        };
        state.volumes.insert(id, volume.clone());
        Ok(volume)
    }

    async fn destroy_volume(&self, volume_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let volume = state
            .volumes
            .get(volume_id)
            .ok_or_else(|| volume_not_found(volume_id))?;
        if volume.state == VolumeState::InUse {
            return Err(invalid(
                "volume_id",
                format!("volume {volume_id} is attached"),
            ));
        }
        state.volumes.remove(volume_id);
        Ok(())
    }

    async fn attach_volume(&self, volume_id: &str, node_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(node_id) {
            return Err(node_not_found(node_id));
        }
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| volume_not_found(volume_id))?;
        if volume.state == VolumeState::InUse {
            return Err(invalid(
                "volume_id",
                format!("volume {volume_id} is already attached"),
            ));
        }
        volume.state = VolumeState::InUse;
        volume
            .extra
            .insert("node_id".to_string(), Value::String(node_id.to_string()));
        Ok(())
    }

    async fn detach_volume(&self, volume_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let volume = state
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| volume_not_found(volume_id))?;
        volume.state = VolumeState::Available;
        volume.extra.remove("node_id");
        Ok(())
    }
}
