use async_trait::async_trait;

use crate::connection::{HttpResponse, classify_status};
use crate::error::{ProviderError, Result};
use crate::poller::{OperationStatus, PollPolicy, StatusCheck, poll_until_complete};
use crate::pool::{WorkerPoolConfig, run_bounded};
use crate::types::{
    AutoScaleGroup, AutoScalePolicy, BatchCreateFailure, BatchCreateResult, Container,
    CreateAutoScaleGroupRequest, CreateAutoScalePolicyRequest, CreateNodeRequest,
    CreateRecordRequest, CreateVolumeRequest, CreateZoneRequest, MultipartUpload, Node,
    NodeImage, NodeLocation, NodeSize, NodeState, PaginatedResponse, PaginationParams, Record,
    RecordQueryParams, RecordType, StorageVolume, StoredObject, UpdateRecordRequest,
    UploadedPart, Zone,
};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Provider 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 资源种类（`"zone"`, `"record"`, `"droplet"` ...）
    pub resource: Option<&'static str>,
    /// 资源 ID（用于 `ResourceNotFound`）
    pub id: Option<String>,
    /// 资源名称（用于 `ResourceExists`）
    pub name: Option<String>,
}

impl ErrorContext {
    pub fn resource(resource: &'static str) -> Self {
        Self {
            resource: Some(resource),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn resource_or_default(&self) -> &'static str {
        self.resource.unwrap_or("resource")
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Provider 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始 API 错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：解析错误
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：未知错误（fallback）
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }

    /// 映射非 2xx 响应体中的厂商错误
    ///
    /// 错误码未收录时按 HTTP 状态码分类，保留状态码与原始响应体。
    fn map_response_error(
        &self,
        raw: RawApiError,
        context: ErrorContext,
        path: &str,
        response: &HttpResponse,
    ) -> ProviderError {
        match self.map_error(raw, context) {
            ProviderError::Unknown { .. } if !response.is_success() => {
                classify_status(self.provider_name(), path, response)
            }
            err => err,
        }
    }
}

/// Behaviour shared by every driver, regardless of family.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Provider identifier used in logs and errors (e.g. `"digitalocean"`).
    fn id(&self) -> &'static str;

    /// Check the credentials against the vendor API.
    ///
    /// Returns `Ok(false)` when the vendor rejects them, `Err` on transport failures.
    async fn validate_credentials(&self) -> Result<bool>;
}

/// Compute (virtual machine) driver.
#[async_trait]
pub trait NodeDriver: ProviderDriver {
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    async fn get_node(&self, node_id: &str) -> Result<Node>;

    /// Create a node. Returns as soon as the vendor accepted the request; use
    /// [`wait_until_running`](Self::wait_until_running) to wait for boot.
    async fn create_node(&self, req: &CreateNodeRequest) -> Result<Node>;

    async fn destroy_node(&self, node_id: &str) -> Result<()>;

    async fn reboot_node(&self, node_id: &str) -> Result<()>;

    async fn start_node(&self, _node_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "start_node"))
    }

    async fn stop_node(&self, _node_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "stop_node"))
    }

    async fn list_sizes(&self) -> Result<Vec<NodeSize>>;

    async fn list_images(&self) -> Result<Vec<NodeImage>>;

    async fn list_locations(&self) -> Result<Vec<NodeLocation>>;

    async fn list_volumes(&self) -> Result<Vec<StorageVolume>> {
        Err(ProviderError::unsupported(self.id(), "list_volumes"))
    }

    async fn create_volume(&self, _req: &CreateVolumeRequest) -> Result<StorageVolume> {
        Err(ProviderError::unsupported(self.id(), "create_volume"))
    }

    async fn destroy_volume(&self, _volume_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "destroy_volume"))
    }

    async fn attach_volume(&self, _volume_id: &str, _node_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "attach_volume"))
    }

    async fn detach_volume(&self, _volume_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "detach_volume"))
    }

    /// Poll [`get_node`](Self::get_node) until the node is `Running`.
    ///
    /// A node entering `error`, `terminated` or `suspended` fails the wait; a node that
    /// disappears fails it too unless the policy says otherwise.
    async fn wait_until_running(&self, node_id: &str, policy: &PollPolicy) -> Result<Node> {
        let outcome = poll_until_complete(self.id(), node_id, policy, || async move {
            match self.get_node(node_id).await {
                Ok(node) if node.state == NodeState::Running => {
                    Ok(StatusCheck::Reported(OperationStatus::new("done")))
                }
                Ok(node) if node.state.is_terminal_failure() => {
                    Ok(StatusCheck::Reported(OperationStatus::failed(
                        "error",
                        format!("node {node_id} entered state '{}'", node.state),
                    )))
                }
                Ok(node) => Ok(StatusCheck::Reported(OperationStatus::new(
                    node.state.to_string(),
                ))),
                Err(ProviderError::ResourceNotFound { .. }) => Ok(StatusCheck::Gone),
                Err(e) => Err(e),
            }
        })
        .await?;
        outcome.into_result(self.id(), "wait_until_running", policy)?;
        self.get_node(node_id).await
    }
}

/// Object storage driver.
#[async_trait]
pub trait StorageDriver: ProviderDriver {
    async fn list_containers(&self) -> Result<Vec<Container>>;

    async fn get_container(&self, name: &str) -> Result<Container>;

    async fn create_container(&self, name: &str) -> Result<Container>;

    /// Delete an empty container.
    async fn delete_container(&self, name: &str) -> Result<()>;

    async fn list_container_objects(&self, container: &str) -> Result<Vec<StoredObject>>;

    async fn get_object(&self, container: &str, name: &str) -> Result<StoredObject>;

    async fn upload_object(&self, container: &str, name: &str, data: &[u8])
    -> Result<StoredObject>;

    async fn download_object(&self, container: &str, name: &str) -> Result<Vec<u8>>;

    async fn delete_object(&self, container: &str, name: &str) -> Result<()>;

    async fn initiate_multipart_upload(
        &self,
        _container: &str,
        _name: &str,
    ) -> Result<MultipartUpload> {
        Err(ProviderError::unsupported(
            self.id(),
            "initiate_multipart_upload",
        ))
    }

    async fn upload_part(
        &self,
        _upload: &MultipartUpload,
        _part_number: u32,
        _data: Vec<u8>,
    ) -> Result<UploadedPart> {
        Err(ProviderError::unsupported(self.id(), "upload_part"))
    }

    async fn complete_multipart_upload(
        &self,
        _upload: &MultipartUpload,
        _parts: &[UploadedPart],
    ) -> Result<StoredObject> {
        Err(ProviderError::unsupported(
            self.id(),
            "complete_multipart_upload",
        ))
    }

    async fn abort_multipart_upload(&self, _upload: &MultipartUpload) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "abort_multipart_upload"))
    }

    /// Split `data` into `part_size` chunks and upload them through the worker pool.
    ///
    /// On any part failure the upload is aborted and the part error is returned.
    async fn upload_object_multipart(
        &self,
        container: &str,
        name: &str,
        data: &[u8],
        part_size: usize,
        pool: &WorkerPoolConfig,
    ) -> Result<StoredObject> {
        if part_size == 0 {
            return Err(ProviderError::InvalidParameter {
                provider: self.id().to_string(),
                param: "part_size".to_string(),
                detail: "must be greater than zero".to_string(),
            });
        }

        let upload = self.initiate_multipart_upload(container, name).await?;
        let chunks: Vec<(u32, Vec<u8>)> = data
            .chunks(part_size)
            .zip(1u32..)
            .map(|(chunk, number)| (number, chunk.to_vec()))
            .collect();
        log::debug!(
            "[{}] Multipart upload {} of {container}/{name}: {} parts",
            self.id(),
            upload.id,
            chunks.len()
        );

        let upload_ref = &upload;
        let parts = run_bounded(self.id(), chunks, pool, |(number, bytes)| async move {
            self.upload_part(upload_ref, number, bytes).await
        })
        .await;

        match parts {
            Ok(parts) => self.complete_multipart_upload(&upload, &parts).await,
            Err(e) => {
                log::warn!(
                    "[{}] Multipart upload {} failed, aborting: {e}",
                    self.id(),
                    upload.id
                );
                if let Err(abort_err) = self.abort_multipart_upload(&upload).await {
                    log::error!(
                        "[{}] Failed to abort multipart upload {}: {abort_err}",
                        self.id(),
                        upload.id
                    );
                }
                Err(e)
            }
        }
    }
}

/// DNS driver.
#[async_trait]
pub trait DnsDriver: ProviderDriver {
    /// Record types this vendor accepts.
    fn list_record_types(&self) -> Vec<RecordType>;

    async fn list_zones(&self, params: &PaginationParams) -> Result<PaginatedResponse<Zone>>;

    async fn get_zone(&self, zone_id: &str) -> Result<Zone>;

    async fn create_zone(&self, _req: &CreateZoneRequest) -> Result<Zone> {
        Err(ProviderError::unsupported(self.id(), "create_zone"))
    }

    async fn delete_zone(&self, _zone_id: &str) -> Result<()> {
        Err(ProviderError::unsupported(self.id(), "delete_zone"))
    }

    /// 获取 DNS 记录列表 (分页 + 搜索)
    async fn list_records(
        &self,
        zone_id: &str,
        params: &RecordQueryParams,
    ) -> Result<PaginatedResponse<Record>>;

    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<Record>;

    async fn create_record(&self, req: &CreateRecordRequest) -> Result<Record>;

    async fn update_record(&self, record_id: &str, req: &UpdateRecordRequest) -> Result<Record>;

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()>;

    /// 批量创建 DNS 记录
    ///
    /// 默认实现并发调用 `create_record()`，收集成功/失败结果。
    /// Provider 可覆写以使用原生批量 API。
    async fn batch_create_records(
        &self,
        requests: &[CreateRecordRequest],
    ) -> Result<BatchCreateResult> {
        let futures: Vec<_> = requests.iter().map(|req| self.create_record(req)).collect();
        let results = futures::future::join_all(futures).await;

        let mut created_records = Vec::new();
        let mut failures = Vec::new();

        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => created_records.push(record),
                Err(e) => failures.push(BatchCreateFailure {
                    request_index: i,
                    record_name: requests[i].name.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        Ok(BatchCreateResult {
            success_count: created_records.len(),
            failed_count: failures.len(),
            created_records,
            failures,
        })
    }
}

/// Autoscaling group driver.
#[async_trait]
pub trait AutoScaleDriver: ProviderDriver {
    async fn list_auto_scale_groups(&self) -> Result<Vec<AutoScaleGroup>>;

    async fn get_auto_scale_group(&self, group_id: &str) -> Result<AutoScaleGroup>;

    /// Create a group and wait until the vendor reports it ready.
    async fn create_auto_scale_group(
        &self,
        req: &CreateAutoScaleGroupRequest,
    ) -> Result<AutoScaleGroup>;

    /// Delete a group and wait until it is gone.
    async fn delete_auto_scale_group(&self, group_id: &str) -> Result<()>;

    async fn list_auto_scale_policies(&self, group_id: &str) -> Result<Vec<AutoScalePolicy>>;

    async fn create_auto_scale_policy(
        &self,
        req: &CreateAutoScalePolicyRequest,
    ) -> Result<AutoScalePolicy>;

    async fn delete_auto_scale_policy(&self, policy_id: &str) -> Result<()>;
}
