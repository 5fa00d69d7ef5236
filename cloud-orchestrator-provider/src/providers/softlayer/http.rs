//! SoftLayer HTTP 请求方法

use serde::de::DeserializeOwned;

use crate::connection::{HttpRequest, HttpResponse, classify_status};
use crate::error::{ProviderError, Result};
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::SoftlayerAutoScaleDriver;
use super::types::{SlError, SlScaleGroup};

/// 伸缩组查询使用的 object mask
pub(crate) const GROUP_MASK: &str = "mask[id,name,minimumMemberCount,maximumMemberCount,cooldown,status,terminationPolicy,regionalGroup,virtualGuestMemberTemplate]";
/// 伸缩策略查询使用的 object mask
pub(crate) const POLICY_MASK: &str = "mask[id,name,scaleGroupId,scaleActions]";

impl SoftlayerAutoScaleDriver {
    fn response_error(
        &self,
        path: &str,
        response: &HttpResponse,
        context: ErrorContext,
    ) -> ProviderError {
        let Ok(body) = serde_json::from_str::<SlError>(&response.body) else {
            return classify_status(self.provider_name(), path, response);
        };
        let raw = match body.code {
            Some(code) => RawApiError::with_code(code, body.error),
            None => RawApiError::new(body.error),
        };
        let err = self.map_response_error(raw, context, path, response);
        if err.is_expected() {
            log::warn!("[softlayer] API error: {err}");
        } else {
            log::error!("[softlayer] API error: {err}");
        }
        err
    }

    /// 执行请求并解析 JSON 响应
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        context: ErrorContext,
    ) -> Result<T> {
        let path = request.path.clone();
        let response = self.conn.send(request).await?;
        if !response.is_success() {
            return Err(self.response_error(&path, &response, context));
        }
        response.json(self.provider_name())
    }

    pub(crate) async fn get_group_raw(&self, group_id: &str) -> Result<SlScaleGroup> {
        self.call(
            HttpRequest::get(format!("/SoftLayer_Scale_Group/{group_id}.json"))
                .query("objectMask", GROUP_MASK),
            ErrorContext::resource("autoscale group").id(group_id),
        )
        .await
    }
}
