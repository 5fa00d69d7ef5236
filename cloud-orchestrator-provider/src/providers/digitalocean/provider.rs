//! DigitalOcean NodeDriver trait 实现

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::HttpRequest;
use crate::error::{ProviderError, Result};
use crate::providers::common::path_segment;
use crate::traits::{ErrorContext, NodeDriver, ProviderDriver, ProviderErrorMapper};
use crate::types::{
    CreateNodeRequest, CreateVolumeRequest, Node, NodeImage, NodeLocation, NodeSize, NodeState,
    StorageVolume, VolumeState,
};

use super::DigitalOceanNodeDriver;
use super::types::{
    AccountEnvelope, ActionBody, ActionEnvelope, CreateDropletBody, CreateVolumeBody, DoDroplet,
    DoImage, DoNetwork, DoRegion, DoSize, DoVolume, DropletEnvelope, VolumeEnvelope,
};

impl DigitalOceanNodeDriver {
    /// 将 droplet 状态映射为 `NodeState`
    /// DigitalOcean 状态：new, active, off, archive
    fn droplet_state(status: &str) -> NodeState {
        match status {
            "new" => NodeState::Pending,
            "active" => NodeState::Running,
            "off" => NodeState::Stopped,
            "archive" => NodeState::Terminated,
            _ => NodeState::Unknown,
        }
    }

    pub(crate) fn droplet_to_node(droplet: DoDroplet) -> Node {
        let addresses = |kind: &str| -> Vec<String> {
            droplet
                .networks
                .v4
                .iter()
                .chain(&droplet.networks.v6)
                .filter(|n: &&DoNetwork| n.network_type == kind)
                .map(|n| n.ip_address.clone())
                .collect()
        };
        let public_ips = addresses("public");
        let private_ips = addresses("private");

        let mut extra = droplet.extra;
        extra.insert("status".to_string(), Value::String(droplet.status.clone()));
        if let Some(region) = droplet.region {
            extra.insert("region".to_string(), Value::String(region.slug));
        }
        let image = droplet.image.map(|i| {
            extra.insert("image_name".to_string(), Value::String(i.name));
            i.slug.unwrap_or_else(|| i.id.to_string())
        });

        Node {
            id: droplet.id.to_string(),
            name: droplet.name,
            state: Self::droplet_state(&droplet.status),
            public_ips,
            private_ips,
            size: droplet.size_slug,
            image,
            created_at: droplet.created_at,
            extra,
        }
    }

    fn volume_to_storage_volume(volume: DoVolume) -> StorageVolume {
        let state = if volume.droplet_ids.is_empty() {
            VolumeState::Available
        } else {
            VolumeState::InUse
        };
        let mut extra = volume.extra;
        extra.insert(
            "droplet_ids".to_string(),
            Value::from(volume.droplet_ids.clone()),
        );
        if let Some(region) = volume.region {
            extra.insert("region".to_string(), Value::String(region.slug));
        }
        StorageVolume {
            id: volume.id,
            name: volume.name,
            size: volume.size_gigabytes,
            state,
            extra,
        }
    }

    /// 节点 ID 必须是数字
    fn droplet_id(&self, node_id: &str) -> Result<u64> {
        node_id
            .parse()
            .map_err(|_| ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "node_id".to_string(),
                detail: format!("'{node_id}' is not a droplet id"),
            })
    }

    /// 提交 droplet 电源操作并等待完成
    async fn droplet_action(&self, node_id: &str, action_type: &str) -> Result<()> {
        let droplet_id = self.droplet_id(node_id)?;
        let body = ActionBody {
            action_type,
            droplet_id: None,
            region: None,
        };
        let ActionEnvelope { action } = self
            .call(
                HttpRequest::post(format!("/droplets/{droplet_id}/actions"))
                    .json(self.provider_name(), &body)?,
                ErrorContext::resource("droplet").id(node_id),
            )
            .await?;
        log::info!("[digitalocean] Droplet {node_id}: {action_type} action {}", action.id);
        self.wait_for_action(action, action_type).await
    }

    async fn get_volume_raw(&self, volume_id: &str) -> Result<DoVolume> {
        let VolumeEnvelope { volume } = self
            .call(
                HttpRequest::get(format!("/volumes/{}", path_segment(volume_id))),
                ErrorContext::resource("volume").id(volume_id),
            )
            .await?;
        Ok(volume)
    }

    async fn volume_action(
        &self,
        volume: &DoVolume,
        action_type: &str,
        droplet_id: u64,
    ) -> Result<()> {
        let body = ActionBody {
            action_type,
            droplet_id: Some(droplet_id),
            region: volume.region.as_ref().map(|r| r.slug.as_str()),
        };
        let ActionEnvelope { action } = self
            .call(
                HttpRequest::post(format!("/volumes/{}/actions", path_segment(&volume.id)))
                    .json(self.provider_name(), &body)?,
                ErrorContext::resource("volume").id(&volume.id),
            )
            .await?;
        self.wait_for_action(action, action_type).await
    }
}

#[async_trait]
impl ProviderDriver for DigitalOceanNodeDriver {
    fn id(&self) -> &'static str {
        "digitalocean"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self
            .call::<AccountEnvelope>(HttpRequest::get("/account"), ErrorContext::default())
            .await
        {
            Ok(resp) => Ok(resp.account.status != "locked"),
            Err(ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl NodeDriver for DigitalOceanNodeDriver {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let droplets: Vec<DoDroplet> = self
            .list_all("/droplets", "droplets", &[], ErrorContext::resource("droplet"))
            .await?;
        Ok(droplets.into_iter().map(Self::droplet_to_node).collect())
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        let droplet_id = self.droplet_id(node_id)?;
        let DropletEnvelope { droplet } = self
            .call(
                HttpRequest::get(format!("/droplets/{droplet_id}")),
                ErrorContext::resource("droplet").id(node_id),
            )
            .await?;
        Ok(Self::droplet_to_node(droplet))
    }

    async fn create_node(&self, req: &CreateNodeRequest) -> Result<Node> {
        let body = CreateDropletBody {
            name: &req.name,
            size: &req.size,
            image: &req.image,
            region: req.location.as_deref(),
            ssh_keys: &req.ssh_keys,
            extra: &req.extra,
        };
        let DropletEnvelope { droplet } = self
            .call(
                HttpRequest::post("/droplets").json(self.provider_name(), &body)?,
                ErrorContext::resource("droplet").name(&req.name),
            )
            .await?;
        log::info!("[digitalocean] Created droplet {} ({})", droplet.id, droplet.name);
        Ok(Self::droplet_to_node(droplet))
    }

    async fn destroy_node(&self, node_id: &str) -> Result<()> {
        let droplet_id = self.droplet_id(node_id)?;
        self.call_unit(
            HttpRequest::delete(format!("/droplets/{droplet_id}")),
            ErrorContext::resource("droplet").id(node_id),
        )
        .await
    }

    async fn reboot_node(&self, node_id: &str) -> Result<()> {
        self.droplet_action(node_id, "reboot").await
    }

    async fn start_node(&self, node_id: &str) -> Result<()> {
        self.droplet_action(node_id, "power_on").await
    }

    async fn stop_node(&self, node_id: &str) -> Result<()> {
        self.droplet_action(node_id, "power_off").await
    }

    async fn list_sizes(&self) -> Result<Vec<NodeSize>> {
        let sizes: Vec<DoSize> = self
            .list_all("/sizes", "sizes", &[], ErrorContext::resource("size"))
            .await?;
        Ok(sizes
            .into_iter()
            .map(|s| NodeSize {
                name: s.slug.clone(),
                id: s.slug,
                ram_mb: s.memory,
                disk_gb: s.disk,
                vcpus: s.vcpus,
                price_hourly: s.price_hourly,
                extra: s.extra,
            })
            .collect())
    }

    async fn list_images(&self) -> Result<Vec<NodeImage>> {
        let images: Vec<DoImage> = self
            .list_all(
                "/images",
                "images",
                &[("type", "distribution")],
                ErrorContext::resource("image"),
            )
            .await?;
        Ok(images
            .into_iter()
            .map(|i| NodeImage {
                id: i.slug.unwrap_or_else(|| i.id.to_string()),
                name: i.name,
                extra: i.extra,
            })
            .collect())
    }

    async fn list_locations(&self) -> Result<Vec<NodeLocation>> {
        let regions: Vec<DoRegion> = self
            .list_all("/regions", "regions", &[], ErrorContext::resource("region"))
            .await?;
        Ok(regions
            .into_iter()
            .map(|r| NodeLocation {
                id: r.slug,
                name: r.name,
                country: None,
                extra: r.extra,
            })
            .collect())
    }

    async fn list_volumes(&self) -> Result<Vec<StorageVolume>> {
        let volumes: Vec<DoVolume> = self
            .list_all("/volumes", "volumes", &[], ErrorContext::resource("volume"))
            .await?;
        Ok(volumes
            .into_iter()
            .map(Self::volume_to_storage_volume)
            .collect())
    }

    async fn create_volume(&self, req: &CreateVolumeRequest) -> Result<StorageVolume> {
        let body = CreateVolumeBody {
            name: &req.name,
            size_gigabytes: req.size,
            region: req.location.as_deref(),
            description: req.description.as_deref(),
        };
        let VolumeEnvelope { volume } = self
            .call(
                HttpRequest::post("/volumes").json(self.provider_name(), &body)?,
                ErrorContext::resource("volume").name(&req.name),
            )
            .await?;
        Ok(Self::volume_to_storage_volume(volume))
    }

    async fn destroy_volume(&self, volume_id: &str) -> Result<()> {
        self.call_unit(
            HttpRequest::delete(format!("/volumes/{}", path_segment(volume_id))),
            ErrorContext::resource("volume").id(volume_id),
        )
        .await
    }

    async fn attach_volume(&self, volume_id: &str, node_id: &str) -> Result<()> {
        let droplet_id = self.droplet_id(node_id)?;
        let volume = self.get_volume_raw(volume_id).await?;
        self.volume_action(&volume, "attach", droplet_id).await
    }

    async fn detach_volume(&self, volume_id: &str) -> Result<()> {
        let volume = self.get_volume_raw(volume_id).await?;
        let Some(&droplet_id) = volume.droplet_ids.first() else {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "volume_id".to_string(),
                detail: format!("volume {volume_id} is not attached"),
            });
        };
        self.volume_action(&volume, "detach", droplet_id).await
    }
}
