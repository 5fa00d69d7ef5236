//! DigitalOcean HTTP 请求方法

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::connection::{HttpRequest, HttpResponse, classify_status};
use crate::error::{ProviderError, Result};
use crate::poller::{OperationStatus, StatusCheck, poll_until_complete};
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::types::{ActionEnvelope, DoAction, DoErrorBody, DoLinks};
use super::{DigitalOceanNodeDriver, MAX_PAGE_SIZE};

impl DigitalOceanNodeDriver {
    /// 非 2xx 响应：优先解析 `{id, message}`，否则按 HTTP 状态码分类
    fn response_error(
        &self,
        path: &str,
        response: &HttpResponse,
        context: ErrorContext,
    ) -> ProviderError {
        let Ok(body) = serde_json::from_str::<DoErrorBody>(&response.body) else {
            return classify_status(self.provider_name(), path, response);
        };
        let err = self.map_response_error(
            RawApiError::with_code(body.id, body.message),
            context,
            path,
            response,
        );
        if err.is_expected() {
            log::warn!("[digitalocean] API error: {err}");
        } else {
            log::error!("[digitalocean] API error: {err}");
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

    /// 执行请求，忽略响应体（DELETE 返回 204）
    pub(crate) async fn call_unit(&self, request: HttpRequest, context: ErrorContext) -> Result<()> {
        let path = request.path.clone();
        let response = self.conn.send(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(self.response_error(&path, &response, context))
        }
    }

    /// 按 `links.pages.next` 逐页拉取，合并 `key` 下的数组
    pub(crate) async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        filters: &[(&str, &str)],
        context: ErrorContext,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut request = HttpRequest::get(path)
                .query("page", page)
                .query("per_page", MAX_PAGE_SIZE);
            for (name, value) in filters {
                request = request.query(*name, *value);
            }

            let mut body: Value = self.call(request, context.clone()).await?;
            let batch = body.get_mut(key).map(Value::take).unwrap_or_default();
            if !batch.is_null() {
                let batch: Vec<T> =
                    serde_json::from_value(batch).map_err(|e| self.parse_error(e))?;
                items.extend(batch);
            }

            let links: DoLinks = match body.get_mut("links").map(Value::take) {
                Some(links) => serde_json::from_value(links).map_err(|e| self.parse_error(e))?,
                None => DoLinks::default(),
            };
            match links
                .pages
                .and_then(|p| p.next)
                .and_then(|next| next_page_number(&next))
            {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        log::debug!("[digitalocean] {path}: {} items", items.len());
        Ok(items)
    }

    async fn action_status(&self, action_id: &str) -> Result<StatusCheck> {
        let ActionEnvelope { action } = self
            .call(
                HttpRequest::get(format!("/actions/{action_id}")),
                ErrorContext::resource("action").id(action_id),
            )
            .await?;
        let status = if action.status == "errored" {
            OperationStatus::failed(
                action.status,
                format!(
                    "action {action_id} ({}) errored",
                    action.action_type.as_deref().unwrap_or("unknown")
                ),
            )
        } else {
            OperationStatus::new(action.status)
        };
        Ok(StatusCheck::Reported(status))
    }

    /// 轮询 `/actions/{id}` 直到 completed / errored
    pub(crate) async fn wait_for_action(&self, action: DoAction, operation: &str) -> Result<()> {
        if action.status == "completed" {
            return Ok(());
        }
        let action_id = action.id.to_string();
        let id = action_id.as_str();
        let outcome = poll_until_complete(self.provider_name(), id, &self.poll, || async move {
            self.action_status(id).await
        })
        .await?;
        outcome.into_result(self.provider_name(), operation, &self.poll)?;
        Ok(())
    }
}

/// 从 `next` 链接中取出 `page` 参数
///
/// 只取页码而不直接请求该 URL，host 覆盖（代理、测试）时链接仍指向官方地址。
fn next_page_number(next: &str) -> Option<u32> {
    let url = Url::parse(next).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_is_read_from_link() {
        assert_eq!(
            next_page_number("https://api.digitalocean.com/v2/droplets?page=3&per_page=200"),
            Some(3)
        );
        assert_eq!(
            next_page_number("https://api.digitalocean.com/v2/droplets?per_page=200"),
            None
        );
        assert_eq!(next_page_number("not a url"), None);
    }
}
