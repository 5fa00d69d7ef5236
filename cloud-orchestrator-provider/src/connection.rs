//! Per-driver HTTP connection with authentication, retry and redirect handling
//!
//! Every HTTP driver owns one [`Connection`]. Drivers build an [`HttpRequest`], the
//! connection signs it, ships it through a [`Transport`] and classifies the answer.
//!
//! # Retry policy
//! - HTTP 429: honour `Retry-After` (capped), retry up to `max_retries` times, then fail with
//!   [`ProviderError::RateLimited`]
//! - 3xx with `Location`: switch the connection to the new host and retry, up to `max_redirects`
//! - Network errors, timeouts and HTTP 502/503/504: exponential backoff within the same retry bound
//! - Everything else is returned to the driver untouched; [`Connection::request`] turns
//!   non-success statuses into typed errors carrying status code and body

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, Method, Url, redirect};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ProviderError, Result};
use crate::utils::redact::{body_for_log, truncate_for_log};

/// HTTP timeouts and retry bounds of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Retries after a rate-limit or transport failure before the error surfaces.
    pub max_retries: u32,
    /// Redirects followed before giving up.
    pub max_redirects: u32,
    /// Upper bound applied to vendor `Retry-After` hints, in seconds.
    pub max_retry_after_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_retries: 5,
            max_redirects: 5,
            max_retry_after_secs: 30,
        }
    }
}

/// A vendor-agnostic HTTP request.
///
/// `path` is appended to the connection's base URL, so a redirect to another host keeps it intact.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Path below the connection's base URL, starting with `/`.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Extra headers, in order.
    pub headers: Vec<(String, String)>,
    /// Raw request body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Build a request with no query, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a JSON body and the matching `Content-Type`.
    pub fn json<B: Serialize + ?Sized>(mut self, provider: &str, body: &B) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| ProviderError::SerializationError {
            provider: provider.to_string(),
            detail: e.to_string(),
        })?;
        self.body = Some(bytes);
        Ok(self.header("Content-Type", "application/json"))
    }

    /// Short `METHOD path` label used in logs and errors.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Build a response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header (name is lowercased).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// `Retry-After` in whole seconds, when present and numeric.
    pub fn retry_after(&self) -> Option<u64> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self, provider: &str) -> Result<T> {
        parse_json(&self.body, provider)
    }
}

/// Parse JSON response text, logging the raw body on failure.
pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(response_text).map_err(|e| {
        log::error!("[{provider_name}] JSON parse failed: {e}");
        log::error!(
            "[{provider_name}] Raw response: {}",
            truncate_for_log(response_text)
        );
        ProviderError::ParseError {
            provider: provider_name.to_string(),
            detail: e.to_string(),
        }
    })
}

/// Ships one request to one base URL. No retry, no classification.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, base_url: &str, request: &HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Redirect following is disabled in the client so that [`Connection`] stays in charge of it.
pub struct ReqwestTransport {
    client: Client,
    provider: &'static str,
}

impl ReqwestTransport {
    pub fn new(provider: &'static str, config: &ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::NetworkError {
                provider: provider.to_string(),
                detail: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, provider })
    }

    fn network_error(&self, e: &reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                provider: self.provider.to_string(),
                detail: e.to_string(),
            }
        } else {
            ProviderError::NetworkError {
                provider: self.provider.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, base_url: &str, request: &HttpRequest) -> Result<HttpResponse> {
        let url = format!("{base_url}{}", request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.network_error(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: self.provider.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Attaches credentials to outgoing requests.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &mut HttpRequest);
}

/// `Authorization: Bearer <token>`.
pub struct BearerToken(pub String);

impl RequestSigner for BearerToken {
    fn sign(&self, request: &mut HttpRequest) {
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {}", self.0)));
    }
}

/// `Authorization: Basic base64(user:password)`.
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl RequestSigner for BasicAuth {
    fn sign(&self, request: &mut HttpRequest) {
        let token = BASE64.encode(format!("{}:{}", self.username, self.password));
        request
            .headers
            .push(("Authorization".to_string(), format!("Basic {token}")));
    }
}

/// Leaves requests untouched.
pub struct NoAuth;

impl RequestSigner for NoAuth {
    fn sign(&self, _request: &mut HttpRequest) {}
}

/// An authenticated connection to one vendor API.
pub struct Connection {
    provider: &'static str,
    base_url: RwLock<String>,
    transport: Arc<dyn Transport>,
    signer: Arc<dyn RequestSigner>,
    config: ConnectionConfig,
}

impl Connection {
    /// Connection using the `reqwest` transport.
    pub fn new(
        provider: &'static str,
        base_url: impl Into<String>,
        signer: Arc<dyn RequestSigner>,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(provider, &config)?);
        Ok(Self::with_transport(
            provider, base_url, signer, config, transport,
        ))
    }

    /// Connection using a caller-supplied transport.
    pub fn with_transport(
        provider: &'static str,
        base_url: impl Into<String>,
        signer: Arc<dyn RequestSigner>,
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            provider,
            base_url: RwLock::new(base_url.into().trim_end_matches('/').to_string()),
            transport,
            signer,
            config,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Base URL currently in use (changes after a cross-host redirect).
    pub async fn base_url(&self) -> String {
        self.base_url.read().await.clone()
    }

    /// Sign and send a request, applying the retry and redirect policy.
    ///
    /// Returns whatever final response the vendor produced, success or not.
    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        self.signer.sign(&mut request);
        let provider = self.provider;
        let label = request.label();

        let mut retries: u32 = 0;
        let mut redirects: u32 = 0;

        loop {
            let base = self.base_url().await;
            log::debug!("[{provider}] {label} ({base})");
            if let Some(body) = &request.body {
                log::debug!("[{provider}] Request Body: {}", body_for_log(body));
            }

            let error = match self.transport.send(&base, &request).await {
                Ok(response) => {
                    log::debug!("[{provider}] Response Status: {}", response.status);

                    if response.status == 429 {
                        rate_limited(provider, &response)
                    } else if matches!(response.status, 502..=504) {
                        log::warn!("[{provider}] Server error (HTTP {})", response.status);
                        ProviderError::NetworkError {
                            provider: provider.to_string(),
                            detail: format!("HTTP {}: {}", response.status, response.body),
                        }
                    } else if response.is_redirect()
                        && let Some(location) = response.header("location")
                    {
                        if redirects >= self.config.max_redirects {
                            return Err(ProviderError::TooManyRedirects {
                                provider: provider.to_string(),
                                redirects,
                                location: location.to_string(),
                            });
                        }
                        redirects += 1;
                        self.follow_redirect(location).await;
                        continue;
                    } else {
                        log::debug!(
                            "[{provider}] Response Body: {}",
                            truncate_for_log(&response.body)
                        );
                        return Ok(response);
                    }
                }
                Err(e) => e,
            };

            if !error.is_retryable() || retries >= self.config.max_retries {
                if error.is_retryable() {
                    log::error!("[{provider}] {label} giving up after {retries} retries: {error}");
                }
                return Err(error);
            }

            let delay = self.retry_delay(&error, retries);
            retries += 1;
            log::warn!(
                "[{}] Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                provider,
                retries,
                self.config.max_retries,
                delay.as_secs_f32(),
                error
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// [`send`](Self::send), then turn any non-success status into a typed error.
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(classify_status(self.provider, &path, &response))
        }
    }

    /// [`request`](Self::request), then parse the JSON body.
    pub async fn request_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        self.request(request).await?.json(self.provider)
    }

    async fn follow_redirect(&self, location: &str) {
        let provider = self.provider;
        let Ok(target) = Url::parse(location) else {
            // Relative location: same host, just try again
            log::warn!("[{provider}] Relative redirect to {location}, keeping host");
            return;
        };

        let mut base = self.base_url.write().await;
        let prefix = Url::parse(&base)
            .map(|u| u.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        let new_base = format!("{}{}", target.origin().ascii_serialization(), prefix);
        log::info!("[{provider}] Redirected from {base} to {new_base}");
        *base = new_base;
    }

    fn retry_delay(&self, error: &ProviderError, attempt: u32) -> Duration {
        if let ProviderError::RateLimited {
            retry_after: Some(secs),
            ..
        } = error
        {
            Duration::from_secs((*secs).min(self.config.max_retry_after_secs))
        } else {
            backoff_delay(attempt)
        }
    }
}

fn rate_limited(provider: &str, response: &HttpResponse) -> ProviderError {
    let retry_after = response.retry_after();
    log::warn!("[{provider}] Rate limited (HTTP 429), retry_after={retry_after:?}");
    ProviderError::RateLimited {
        provider: provider.to_string(),
        retry_after,
        raw_message: Some(response.body.clone()),
    }
}

/// Default classification of a non-success response that no vendor mapper claimed.
pub fn classify_status(provider: &str, path: &str, response: &HttpResponse) -> ProviderError {
    let raw_message = (!response.body.is_empty()).then(|| response.body.clone());
    match response.status {
        401 => ProviderError::InvalidCredentials {
            provider: provider.to_string(),
            raw_message,
        },
        403 => ProviderError::PermissionDenied {
            provider: provider.to_string(),
            raw_message,
        },
        404 => ProviderError::ResourceNotFound {
            provider: provider.to_string(),
            resource: "resource".to_string(),
            id: path.to_string(),
            raw_message,
        },
        409 => ProviderError::ResourceExists {
            provider: provider.to_string(),
            resource: "resource".to_string(),
            name: path.to_string(),
            raw_message,
        },
        status => ProviderError::HttpStatus {
            provider: provider.to_string(),
            status,
            raw_message,
        },
    }
}

/// Calculate exponential backoff delay
///
/// Backoff strategy: 100ms, 200ms, 400ms, 800ms, 1.6s, ...
/// Maximum delay limit is 10 seconds
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    let delay_ms = delay_ms.min(10_000);
    Duration::from_millis(delay_ms)
}
