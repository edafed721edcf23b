//! Per-request transport options.
//!
//! Options come from three layers with fixed precedence:
//! call-site > client-level > built-in defaults. Layers are combined with
//! [`RequestOptions::merged_over`] and turned into concrete values exactly
//! once per operation with [`RequestOptions::resolve`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_ENDPOINT_GET_ENTRY: &str = "/s5/registry";
pub const DEFAULT_ENDPOINT_SET_ENTRY: &str = "/s5/registry";
pub const DEFAULT_ENDPOINT_SUBSCRIBE: &str = "/s5/registry/subscription";
pub const DEFAULT_ENDPOINT_UPLOAD: &str = "/s5/upload";
pub const DEFAULT_ENDPOINT_DOWNLOAD: &str = "/s5/download";

/// Optional overrides for a single request or a whole client.
///
/// `None` (or an absent header) means "inherit from the next layer".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Sent as `Authorization: Bearer <api_key>`.
    pub api_key: Option<String>,
    pub custom_user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
    /// Extra headers. Merging is per header name.
    pub headers: BTreeMap<String, String>,
    pub endpoint_get_entry: Option<String>,
    pub endpoint_set_entry: Option<String>,
    pub endpoint_subscribe: Option<String>,
    pub endpoint_upload: Option<String>,
    pub endpoint_download: Option<String>,
}

/// Fully resolved options; every field has a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub api_key: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
    pub headers: BTreeMap<String, String>,
    pub endpoint_get_entry: String,
    pub endpoint_set_entry: String,
    pub endpoint_subscribe: String,
    pub endpoint_upload: String,
    pub endpoint_download: String,
}

impl RequestOptions {
    /// Layers `self` on top of `fallback`: every field set here wins.
    pub fn merged_over(&self, fallback: &RequestOptions) -> RequestOptions {
        let mut headers = fallback.headers.clone();
        headers.extend(self.headers.clone());

        RequestOptions {
            api_key: self.api_key.clone().or_else(|| fallback.api_key.clone()),
            custom_user_agent: self
                .custom_user_agent
                .clone()
                .or_else(|| fallback.custom_user_agent.clone()),
            timeout_ms: self.timeout_ms.or(fallback.timeout_ms),
            headers,
            endpoint_get_entry: self
                .endpoint_get_entry
                .clone()
                .or_else(|| fallback.endpoint_get_entry.clone()),
            endpoint_set_entry: self
                .endpoint_set_entry
                .clone()
                .or_else(|| fallback.endpoint_set_entry.clone()),
            endpoint_subscribe: self
                .endpoint_subscribe
                .clone()
                .or_else(|| fallback.endpoint_subscribe.clone()),
            endpoint_upload: self
                .endpoint_upload
                .clone()
                .or_else(|| fallback.endpoint_upload.clone()),
            endpoint_download: self
                .endpoint_download
                .clone()
                .or_else(|| fallback.endpoint_download.clone()),
        }
    }

    /// Fills every unset field with its default.
    pub fn resolve(&self) -> ResolvedOptions {
        ResolvedOptions {
            api_key: self.api_key.clone(),
            user_agent: self.custom_user_agent.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            headers: self.headers.clone(),
            endpoint_get_entry: self
                .endpoint_get_entry
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_GET_ENTRY.to_owned()),
            endpoint_set_entry: self
                .endpoint_set_entry
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_SET_ENTRY.to_owned()),
            endpoint_subscribe: self
                .endpoint_subscribe
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_SUBSCRIBE.to_owned()),
            endpoint_upload: self
                .endpoint_upload
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_UPLOAD.to_owned()),
            endpoint_download: self
                .endpoint_download
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT_DOWNLOAD.to_owned()),
        }
    }
}

impl ResolvedOptions {
    /// Every header a request carries: authorization, user agent, then the
    /// custom headers (which may override the first two).
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = BTreeMap::new();
        if let Some(api_key) = &self.api_key {
            pairs.insert("authorization".to_owned(), format!("Bearer {api_key}"));
        }
        if let Some(user_agent) = &self.user_agent {
            pairs.insert("user-agent".to_owned(), user_agent.clone());
        }
        for (name, value) in &self.headers {
            pairs.insert(name.to_ascii_lowercase(), value.clone());
        }
        pairs.into_iter().collect()
    }
}
