use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ProviderError, Result};
use crate::providers::common::sha256_hex;
use crate::traits::{ProviderDriver, StorageDriver};
use crate::types::{Container, Extra, MultipartUpload, StoredObject, UploadedPart};

use super::PROVIDER;

struct PendingUpload {
    container: String,
    object_name: String,
    parts: BTreeMap<u32, Vec<u8>>,
}

#[derive(Default)]
struct State {
    containers: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    uploads: HashMap<String, PendingUpload>,
    next_upload: u64,
}

/// In-memory object storage.
#[derive(Default)]
pub struct DummyStorageDriver {
    state: RwLock<State>,
    failing_part: Option<u32>,
}

impl DummyStorageDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver rejecting every upload of the given part number.
    pub fn with_failing_part(part_number: u32) -> Self {
        Self {
            failing_part: Some(part_number),
            ..Self::default()
        }
    }

    /// Number of multipart uploads neither completed nor aborted.
    pub async fn pending_uploads(&self) -> usize {
        self.state.read().await.uploads.len()
    }

    fn object(container: &str, name: &str, data: &[u8]) -> StoredObject {
        StoredObject {
            name: name.to_string(),
            container: container.to_string(),
            size: data.len() as u64,
            hash: Some(sha256_hex(data)),
            extra: Extra::new(),
        }
    }
}

fn container_not_found(name: &str) -> ProviderError {
    ProviderError::not_found(PROVIDER, "container", name)
}

fn object_not_found(container: &str, name: &str) -> ProviderError {
    ProviderError::not_found(PROVIDER, "object", &format!("{container}/{name}"))
}

fn upload_not_found(id: &str) -> ProviderError {
    ProviderError::not_found(PROVIDER, "multipart upload", id)
}

#[async_trait]
impl ProviderDriver for DummyStorageDriver {
    fn id(&self) -> &'static str {
        PROVIDER
    }

    async fn validate_credentials(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl StorageDriver for DummyStorageDriver {
    async fn list_containers(&self) -> Result<Vec<Container>> {
        let state = self.state.read().await;
        Ok(state
            .containers
            .keys()
            .map(|name| Container {
                name: name.clone(),
                extra: Extra::new(),
            })
            .collect())
    }

    async fn get_container(&self, name: &str) -> Result<Container> {
        let state = self.state.read().await;
        if state.containers.contains_key(name) {
            Ok(Container {
                name: name.to_string(),
                extra: Extra::new(),
            })
        } else {
            Err(container_not_found(name))
        }
    }

    async fn create_container(&self, name: &str) -> Result<Container> {
        let mut state = self.state.write().await;
        if state.containers.contains_key(name) {
            return Err(ProviderError::ResourceExists {
                provider: PROVIDER.to_string(),
                resource: "container".to_string(),
                name: name.to_string(),
                raw_message: None,
            });
        }
        state.containers.insert(name.to_string(), BTreeMap::new());
        Ok(Container {
            name: name.to_string(),
            extra: Extra::new(),
        })
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let objects = state
            .containers
            .get(name)
            .ok_or_else(|| container_not_found(name))?;
        if !objects.is_empty() {
            return Err(ProviderError::InvalidParameter {
                provider: PROVIDER.to_string(),
                param: "container".to_string(),
                detail: format!("container '{name}' is not empty"),
            });
        }
        state.containers.remove(name);
        Ok(())
    }

    async fn list_container_objects(&self, container: &str) -> Result<Vec<StoredObject>> {
        let state = self.state.read().await;
        let objects = state
            .containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?;
        Ok(objects
            .iter()
            .map(|(name, data)| Self::object(container, name, data))
            .collect())
    }

    async fn get_object(&self, container: &str, name: &str) -> Result<StoredObject> {
        let state = self.state.read().await;
        state
            .containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?
            .get(name)
            .map(|data| Self::object(container, name, data))
            .ok_or_else(|| object_not_found(container, name))
    }

    async fn upload_object(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
    ) -> Result<StoredObject> {
        let mut state = self.state.write().await;
        state
            .containers
            .get_mut(container)
            .ok_or_else(|| container_not_found(container))?
            .insert(name.to_string(), data.to_vec());
        Ok(Self::object(container, name, data))
    }

    async fn download_object(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        state
            .containers
            .get(container)
            .ok_or_else(|| container_not_found(container))?
            .get(name)
            .cloned()
            .ok_or_else(|| object_not_found(container, name))
    }

    async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .containers
            .get_mut(container)
            .ok_or_else(|| container_not_found(container))?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| object_not_found(container, name))
    }

    async fn initiate_multipart_upload(
        &self,
        container: &str,
        name: &str,
    ) -> Result<MultipartUpload> {
        let mut state = self.state.write().await;
        if !state.containers.contains_key(container) {
            return Err(container_not_found(container));
        }
        state.next_upload += 1;
        let id = format!("upload-{}", state.next_upload);
        state.uploads.insert(
            id.clone(),
            PendingUpload {
                container: container.to_string(),
                object_name: name.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(MultipartUpload {
            id,
            container: container.to_string(),
            object_name: name.to_string(),
        })
    }

    async fn upload_part(
        &self,
        upload: &MultipartUpload,
        part_number: u32,
        data: Vec<u8>,
    ) -> Result<UploadedPart> {
        if self.failing_part == Some(part_number) {
            return Err(ProviderError::QuotaExceeded {
                provider: PROVIDER.to_string(),
                raw_message: Some(format!("part {part_number} rejected")),
            });
        }
        let mut state = self.state.write().await;
        let pending = state
            .uploads
            .get_mut(&upload.id)
            .ok_or_else(|| upload_not_found(&upload.id))?;
        let part = UploadedPart {
            part_number,
            size: data.len() as u64,
            hash: sha256_hex(&data),
        };
        pending.parts.insert(part_number, data);
        Ok(part)
    }

    async fn complete_multipart_upload(
        &self,
        upload: &MultipartUpload,
        parts: &[UploadedPart],
    ) -> Result<StoredObject> {
        let mut state = self.state.write().await;
        let pending = state
            .uploads
            .remove(&upload.id)
            .ok_or_else(|| upload_not_found(&upload.id))?;

        let mut data = Vec::new();
        for part in parts {
            let bytes = pending.parts.get(&part.part_number).ok_or_else(|| {
                ProviderError::InvalidParameter {
                    provider: PROVIDER.to_string(),
                    param: "parts".to_string(),
                    detail: format!("part {} was never uploaded", part.part_number),
                }
            })?;
            data.extend_from_slice(bytes);
        }

        let object = Self::object(&pending.container, &pending.object_name, &data);
        state
            .containers
            .get_mut(&pending.container)
            .ok_or_else(|| container_not_found(&pending.container))?
            .insert(pending.object_name, data);
        Ok(object)
    }

    async fn abort_multipart_upload(&self, upload: &MultipartUpload) -> Result<()> {
        self.state
            .write()
            .await
            .uploads
            .remove(&upload.id)
            .map(|_| ())
            .ok_or_else(|| upload_not_found(&upload.id))
    }
}
