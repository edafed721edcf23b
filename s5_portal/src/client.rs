use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use s5_core::{
    Cid, PublicKey, PublishAck, RegistryApi, RegistryEntryRecord, RequestOptions,
    ResolvedOptions, SignedRegistryEntry, TransportError,
};
use s5_registry::{RegistryClient, SubscribeOptions, Subscription};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::{PortalConfig, PortalError, PortalUrlCache};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    cid: String,
}

/// HTTP client for one S5 portal.
///
/// Implements [`RegistryApi`] over the portal's registry endpoints and adds
/// content upload/download and registry subscriptions. Cloning is cheap and
/// shares the connection pool.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    url: Url,
    options: RequestOptions,
    cache: Arc<PortalUrlCache>,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        Ok(Self {
            http: reqwest::Client::new(),
            url: Url::parse(&config.url)?,
            options: config.request,
            cache: PortalUrlCache::shared(),
        })
    }

    /// Uses `cache` instead of the process-wide portal URL cache.
    pub fn with_cache(mut self, cache: Arc<PortalUrlCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The initial portal URL this client was configured with.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Client-level request options.
    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Registry protocol on top of this client.
    pub fn registry(&self) -> RegistryClient<PortalClient> {
        RegistryClient::new(self.clone())
    }

    /// The resolved portal URL.
    pub async fn portal_url(&self) -> Result<Url, TransportError> {
        self.cache.resolve(&self.http, &self.url).await
    }

    fn resolve_options(&self, options: &RequestOptions) -> ResolvedOptions {
        options.merged_over(&self.options).resolve()
    }

    async fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let base = self.portal_url().await?;
        join_endpoint(&base, path)
            .map_err(|err| anyhow::anyhow!("invalid endpoint {path}: {err}").into())
    }

    fn request(&self, method: Method, url: Url, options: &ResolvedOptions) -> RequestBuilder {
        let mut request = self.http.request(method, url);
        for (name, value) in options.header_pairs() {
            request = request.header(name, value);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        request
    }

    /// Sends a request, dropping the resolved portal URL on network failure.
    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        match request.send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                warn!("portal request to {} failed: {err}", self.url);
                self.cache.invalidate(&self.url);
                Err(anyhow::Error::from(err).into())
            }
        }
    }

    /// WebSocket URL of the registry subscription endpoint.
    pub async fn subscribe_url(&self, options: &RequestOptions) -> Result<Url, TransportError> {
        let resolved = self.resolve_options(options);
        let mut url = self.endpoint(&resolved.endpoint_subscribe).await?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| anyhow::anyhow!("cannot use {url} as a websocket url"))?;
        Ok(url)
    }

    /// Opens a registry subscription for `public_key`. `verify` controls
    /// whether pushed entries are checked before delivery.
    pub async fn subscribe<F>(
        &self,
        public_key: PublicKey,
        options: &RequestOptions,
        verify: bool,
        on_entry: F,
    ) -> Result<Subscription, PortalError>
    where
        F: FnMut(SignedRegistryEntry) + Send + 'static,
    {
        let url = self.subscribe_url(options).await?;
        let subscribe_options = SubscribeOptions {
            verify,
            ..SubscribeOptions::from_request(&options.merged_over(&self.options))
        };
        Ok(Subscription::open(url.as_str(), public_key, subscribe_options, on_entry).await?)
    }

    /// Uploads a blob and returns its CID after checking it against the
    /// locally computed one.
    pub async fn upload_bytes(
        &self,
        data: impl Into<Bytes>,
        options: &RequestOptions,
    ) -> Result<Cid, PortalError> {
        let data = data.into();
        let expected = Cid::for_bytes(&data);
        let resolved = self.resolve_options(options);
        let url = self.endpoint(&resolved.endpoint_upload).await?;

        let part = multipart::Part::bytes(data.to_vec()).file_name("file");
        let form = multipart::Form::new().part("file", part);
        let response = self
            .send(self.request(Method::POST, url, &resolved).multipart(form))
            .await?;
        let response = error_for_status(response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| PortalError::UnexpectedResponse(err.to_string()))?;
        let actual = Cid::parse(&body.cid)?;
        if actual != expected {
            return Err(PortalError::HashMismatch { expected, actual });
        }
        debug!("uploaded {} bytes as {actual}", data.len());
        Ok(actual)
    }

    /// Downloads a blob and checks its hash and size against `cid`.
    pub async fn download_bytes(
        &self,
        cid: &Cid,
        options: &RequestOptions,
    ) -> Result<Bytes, PortalError> {
        let resolved = self.resolve_options(options);
        let path = format!(
            "{}/{}",
            resolved.endpoint_download.trim_end_matches('/'),
            cid.to_base58()
        );
        let url = self.endpoint(&path).await?;

        let response = self.send(self.request(Method::GET, url, &resolved)).await?;
        let response = error_for_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Other(err.into()))?;

        let actual = Cid::for_bytes(&body);
        if actual != *cid {
            return Err(PortalError::HashMismatch {
                expected: *cid,
                actual,
            });
        }
        Ok(body)
    }
}

/// Joins an endpoint path below the portal URL's path, so `/s5/registry` on
/// `https://host/portal` becomes `https://host/portal/s5/registry`.
fn join_endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path.trim_start_matches('/'))
}

async fn error_for_status(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RegistryApi for PortalClient {
    async fn get(
        &self,
        key: &PublicKey,
        options: &RequestOptions,
    ) -> Result<Option<RegistryEntryRecord>, TransportError> {
        let resolved = self.resolve_options(options);
        let url = self.endpoint(&resolved.endpoint_get_entry).await?;
        let request = self
            .request(Method::GET, url, &resolved)
            .query(&[("pk", key.to_base64url())]);

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Other(err.into()))?;
        Ok(Some(RegistryEntryRecord::from_json(&body)?))
    }

    async fn set(
        &self,
        record: RegistryEntryRecord,
        options: &RequestOptions,
    ) -> Result<PublishAck, TransportError> {
        let resolved = self.resolve_options(options);
        let url = self.endpoint(&resolved.endpoint_set_entry).await?;
        let request = self.request(Method::POST, url, &resolved).json(&record);

        let response = error_for_status(self.send(request).await?).await?;
        Ok(PublishAck {
            status: response.status().as_u16(),
        })
    }
}
