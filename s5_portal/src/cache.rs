use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use s5_core::TransportError;
use tracing::debug;
use url::Url;

/// Maps an initial portal URL to the URL the portal actually answers on.
///
/// Portals may redirect their public address to an API host. The first
/// request against an initial URL follows those redirects once; later
/// requests reuse the result until [`invalidate`](Self::invalidate) is
/// called after a network failure.
#[derive(Debug, Default)]
pub struct PortalUrlCache {
    resolved: DashMap<String, Url>,
}

impl PortalUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by clients that don't bring their own.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<PortalUrlCache>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::new())).clone()
    }

    pub fn get(&self, initial: &Url) -> Option<Url> {
        self.resolved
            .get(initial.as_str())
            .map(|url| url.value().clone())
    }

    pub fn insert(&self, initial: &Url, resolved: Url) {
        self.resolved.insert(initial.as_str().to_owned(), resolved);
    }

    pub fn invalidate(&self, initial: &Url) {
        if self.resolved.remove(initial.as_str()).is_some() {
            debug!("dropped resolved portal url for {initial}");
        }
    }

    /// Returns the cached URL for `initial`, or resolves it with a `HEAD`
    /// request. Any HTTP status counts as a successful resolution. The
    /// final URL keeps its path so portals served under a prefix work.
    pub async fn resolve(
        &self,
        http: &reqwest::Client,
        initial: &Url,
    ) -> Result<Url, TransportError> {
        if let Some(url) = self.get(initial) {
            return Ok(url);
        }

        let response = http
            .head(initial.clone())
            .send()
            .await
            .map_err(anyhow::Error::from)?;
        let mut resolved = response.url().clone();
        resolved.set_query(None);
        resolved.set_fragment(None);

        debug!("resolved portal url {initial} to {resolved}");
        self.insert(initial, resolved.clone());
        Ok(resolved)
    }
}
