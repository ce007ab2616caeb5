use crate::config::MirrorConfig;
use crate::error::ModelPullError;
use std::time::Duration;

const USER_AGENT: &str = concat!("modelpull/", env!("CARGO_PKG_VERSION"));

/// Retrieves listing pages and continuation resources as text.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, ModelPullError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestPageFetcher {
    client: reqwest::Client,
}

impl ReqwestPageFetcher {
    pub fn new(mirror: &MirrorConfig) -> Result<Self, ModelPullError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(mirror.connect_timeout_secs))
            .timeout(Duration::from_secs(mirror.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ModelPullError> {
        let page_fetch = |reason: String| ModelPullError::PageFetch {
            url: url.to_string(),
            reason,
        };

        tracing::debug!(url, "Fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| page_fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(page_fetch(format!("HTTP status {status}")));
        }

        response.text().await.map_err(|e| page_fetch(e.to_string()))
    }
}
