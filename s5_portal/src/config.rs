use s5_core::RequestOptions;

/// Where a [`PortalClient`](crate::PortalClient) connects and the
/// client-level defaults for every request it makes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortalConfig {
    /// Initial portal URL, e.g. `https://s5.example.com`.
    pub url: String,
    #[serde(default)]
    pub request: RequestOptions,
}

impl PortalConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request: RequestOptions::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.request.api_key = Some(api_key.into());
        self
    }
}
