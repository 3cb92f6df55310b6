//! Remote plaintext blocklist feed.

use super::source::{normalize_domain, DomainFeed, FeedError};
use crate::config::RemoteFeedConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Newline-delimited domain list fetched over HTTP.
pub struct RemoteListFeed {
    url: String,
    client: Client,
}

impl RemoteListFeed {
    pub fn new(config: &RemoteFeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }
}

#[async_trait]
impl DomainFeed for RemoteListFeed {
    async fn fetch(&self) -> Result<HashSet<String>, FeedError> {
        debug!(url = %self.url, "Fetching remote blocklist");

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FeedError::InvalidResponse(format!("HTTP {}", status)));
        }

        let content = response.text().await?;
        let domains = parse_domain_list(&content);

        if domains.is_empty() {
            return Err(FeedError::InvalidResponse(
                "blocklist contained no domains".to_string(),
            ));
        }

        Ok(domains)
    }

    fn name(&self) -> &str {
        "remote-list"
    }
}

/// Parse one domain per line, skipping blanks and `#` comments.
pub fn parse_domain_list(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_domain)
        .filter(|domain| domain.contains('.'))
        .collect()
}
