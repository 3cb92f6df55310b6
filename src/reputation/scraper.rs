//! Domain lists scraped from temporary-mail provider pages.
//!
//! Provider pages list their mail domains in dropdowns or sample addresses.
//! Domains are pulled out of the raw HTML with two patterns: the part after
//! an `@`, and text nodes that consist of nothing but a domain.

use super::ancestor_suffixes;
use super::builtin::{ASSET_SUFFIXES, INFRA_DOMAINS, STATIC_PROVIDER_DOMAINS};
use super::source::{normalize_domain, DomainFeed, FeedError};
use crate::config::{ScrapeTarget, ScraperConfig};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static AT_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)@((?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,24})\b")
        .expect("at-domain pattern is valid")
});

static TEXT_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)>\s*@?((?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,24})\s*<")
        .expect("text-domain pattern is valid")
});

/// Whether a candidate is infrastructure noise rather than a mail domain.
fn is_excluded(domain: &str) -> bool {
    let tld = domain.rsplit('.').next().unwrap_or_default();
    if ASSET_SUFFIXES.contains(&tld) {
        return true;
    }

    INFRA_DOMAINS.contains(&domain)
        || ancestor_suffixes(domain).any(|suffix| INFRA_DOMAINS.contains(&suffix))
}

/// Extract candidate provider domains from a page.
pub fn extract_domains(html: &str) -> HashSet<String> {
    AT_DOMAIN
        .captures_iter(html)
        .chain(TEXT_DOMAIN.captures_iter(html))
        .filter_map(|cap| cap.get(1))
        .map(|m| normalize_domain(m.as_str()))
        .filter(|domain| domain.len() <= 253 && !is_excluded(domain))
        .collect()
}

/// The static provider list as a set.
pub fn static_provider_domains() -> HashSet<String> {
    STATIC_PROVIDER_DOMAINS.iter().map(|d| d.to_string()).collect()
}

/// Feed scraping every configured provider page.
pub struct ScraperFeed {
    providers: Vec<ScrapeTarget>,
    min_domains: usize,
    client: Client,
}

impl ScraperFeed {
    pub fn new(config: &ScraperConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("zentinel-email-reputation/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            providers: config.providers.clone(),
            min_domains: config.min_domains,
            client,
        })
    }

    async fn scrape(&self, target: &ScrapeTarget) -> Result<HashSet<String>, FeedError> {
        let response = self.client.get(&target.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(FeedError::InvalidResponse(format!("HTTP {}", status)));
        }

        let html = response.text().await?;
        Ok(extract_domains(&html))
    }

    /// Merge per-provider results, falling back to the static list when the
    /// union is too small to trust.
    fn settle(&self, found: HashSet<String>) -> HashSet<String> {
        if found.len() < self.min_domains {
            warn!(
                found = found.len(),
                min_domains = self.min_domains,
                "Too few scraped domains, using static provider list"
            );
            return static_provider_domains();
        }
        found
    }
}

#[async_trait]
impl DomainFeed for ScraperFeed {
    async fn fetch(&self) -> Result<HashSet<String>, FeedError> {
        let mut found = HashSet::new();

        for target in &self.providers {
            match self.scrape(target).await {
                Ok(domains) => {
                    debug!(provider = %target.name, domains = domains.len(), "Scraped provider");
                    found.extend(domains);
                }
                Err(e) => {
                    warn!(provider = %target.name, error = %e, "Failed to scrape provider");
                }
            }
        }

        info!(providers = self.providers.len(), domains = found.len(), "Provider scrape complete");
        Ok(self.settle(found))
    }

    fn name(&self) -> &str {
        "provider-scraper"
    }
}
