//! Cloudflare HTTP 请求方法

use serde::de::DeserializeOwned;

use crate::connection::{HttpRequest, HttpResponse, classify_status};
use crate::error::Result;
use crate::providers::common::path_segment;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::types::{PaginatedResponse, PaginationParams};

use super::{CloudflareDnsDriver, CfEnvelope, MAX_PAGE_SIZE_ZONES};

impl CloudflareDnsDriver {
    /// 发送请求并解析 Cloudflare 响应信封
    ///
    /// Cloudflare 在 4xx 时仍返回 `{success:false, errors:[...]}`，优先按错误码映射；
    /// 响应体不是信封时退回按 HTTP 状态码分类。
    async fn envelope<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        context: ErrorContext,
    ) -> Result<CfEnvelope<T>> {
        let path = request.path.clone();
        let response = self.conn.send(request).await?;

        let envelope: CfEnvelope<T> = match serde_json::from_str(&response.body) {
            Ok(r) => r,
            Err(e) if response.is_success() => return Err(self.parse_error(e)),
            Err(_) => return Err(classify_status(self.provider_name(), &path, &response)),
        };

        if !envelope.success {
            return Err(self.envelope_error(&path, &response, envelope, context));
        }
        Ok(envelope)
    }

    fn envelope_error<T>(
        &self,
        path: &str,
        response: &HttpResponse,
        envelope: CfEnvelope<T>,
        context: ErrorContext,
    ) -> crate::error::ProviderError {
        let raw = envelope
            .errors
            .into_iter()
            .next()
            .map(|e| RawApiError::with_code(e.code.to_string(), e.message))
            .unwrap_or_else(|| RawApiError::new(format!("HTTP {}", response.status)));
        let err = self.map_response_error(raw, context, path, response);
        if err.is_expected() {
            log::warn!("[cloudflare] API error: {err}");
        } else {
            log::error!("[cloudflare] API error: {err}");
        }
        err
    }

    /// 执行请求，取出 `result`
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        context: ErrorContext,
    ) -> Result<T> {
        self.envelope(request, context)
            .await?
            .result
            .ok_or_else(|| self.parse_error("response is missing the result field"))
    }

    /// 执行请求，忽略 `result`
    pub(crate) async fn call_unit(&self, request: HttpRequest, context: ErrorContext) -> Result<()> {
        self.envelope::<serde_json::Value>(request, context)
            .await
            .map(|_| ())
    }

    /// 执行分页 GET 请求
    ///
    /// 页大小先收敛到 `max_page_size`，返回的分页信息与实际请求一致。
    pub(crate) async fn get_paginated<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        params: &PaginationParams,
        max_page_size: u32,
        context: ErrorContext,
    ) -> Result<PaginatedResponse<T>> {
        let params = params.validated(max_page_size);
        let request = request
            .query("page", params.page)
            .query("per_page", params.page_size);
        let envelope = self.envelope::<Vec<T>>(request, context).await?;

        let total_count = envelope.result_info.map_or(0, |i| i.total_count);
        Ok(PaginatedResponse::new(
            envelope.result.unwrap_or_default(),
            params.page,
            params.page_size,
            total_count,
        ))
    }

    pub(crate) async fn get_zone_raw(&self, zone_id: &str) -> Result<super::CfZone> {
        self.call(
            HttpRequest::get(format!("/zones/{}", path_segment(zone_id))),
            ErrorContext::resource("zone").id(zone_id),
        )
        .await
    }

    pub(crate) async fn list_zones_raw(
        &self,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<super::CfZone>> {
        self.get_paginated(
            HttpRequest::get("/zones"),
            params,
            MAX_PAGE_SIZE_ZONES,
            ErrorContext::resource("zone"),
        )
        .await
    }
}
