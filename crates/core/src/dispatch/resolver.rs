//! Tracker page URL -> addable torrent URL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::{Client, Url};
use tracing::debug;

use super::DispatchError;

/// Turns a tracker's page URL into something the download client can add.
#[async_trait]
pub trait TorrentUrlResolver: Send + Sync {
    /// Tracker name this resolver handles.
    fn tracker(&self) -> &str;

    async fn resolve(&self, page_url: &str) -> Result<String, DispatchError>;
}

/// Already a direct link, nothing to resolve.
fn is_direct(url: &str) -> bool {
    url.starts_with("magnet:") || url.ends_with(".torrent")
}

async fn fetch_page(client: &Client, page_url: &str) -> Result<String, DispatchError> {
    let response = client
        .get(page_url)
        .send()
        .await
        .map_err(|e| DispatchError::resolution(page_url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::resolution(page_url, format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| DispatchError::resolution(page_url, e.to_string()))
}

fn build_client(timeout: Duration) -> Result<Client, DispatchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DispatchError::resolution("", e.to_string()))
}

/// Nyaa: the view page links `/download/<id>.torrent`.
pub struct NyaaResolver {
    client: Client,
}

impl NyaaResolver {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

/// Find the torrent download link in a Nyaa view page.
pub fn parse_nyaa_page(page_url: &str, html: &str) -> Result<String, DispatchError> {
    let re = Regex::new(r#"href="(/download/\d+\.torrent)""#)
        .map_err(|e| DispatchError::resolution(page_url, e.to_string()))?;

    let href = re
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| DispatchError::resolution(page_url, "no download link on page"))?;

    let base = Url::parse(page_url).map_err(|e| DispatchError::resolution(page_url, e.to_string()))?;
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| DispatchError::resolution(page_url, e.to_string()))
}

#[async_trait]
impl TorrentUrlResolver for NyaaResolver {
    fn tracker(&self) -> &str {
        "Nyaa"
    }

    async fn resolve(&self, page_url: &str) -> Result<String, DispatchError> {
        if is_direct(page_url) {
            return Ok(page_url.to_string());
        }
        debug!("Resolving Nyaa page {}", page_url);
        let html = fetch_page(&self.client, page_url).await?;
        parse_nyaa_page(page_url, &html)
    }
}

/// AnimeTosho: the view page links a `.torrent` on its storage host.
pub struct AnimeToshoResolver {
    client: Client,
}

impl AnimeToshoResolver {
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

/// Find the first absolute `.torrent` link in an AnimeTosho view page.
pub fn parse_animetosho_page(page_url: &str, html: &str) -> Result<String, DispatchError> {
    let re = Regex::new(r#"href="(https?://[^"]+\.torrent)""#)
        .map_err(|e| DispatchError::resolution(page_url, e.to_string()))?;

    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .ok_or_else(|| DispatchError::resolution(page_url, "no torrent link on page"))
}

#[async_trait]
impl TorrentUrlResolver for AnimeToshoResolver {
    fn tracker(&self) -> &str {
        "AnimeTosho"
    }

    async fn resolve(&self, page_url: &str) -> Result<String, DispatchError> {
        if is_direct(page_url) {
            return Ok(page_url.to_string());
        }
        debug!("Resolving AnimeTosho page {}", page_url);
        let html = fetch_page(&self.client, page_url).await?;
        parse_animetosho_page(page_url, &html)
    }
}

/// Resolvers keyed by lowercase tracker name.
#[derive(Clone, Default)]
pub struct TrackerResolvers {
    resolvers: HashMap<String, Arc<dyn TorrentUrlResolver>>,
}

impl TrackerResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nyaa and AnimeTosho.
    pub fn with_defaults(timeout: Duration) -> Result<Self, DispatchError> {
        let mut resolvers = Self::new();
        resolvers.register(Arc::new(NyaaResolver::new(timeout)?));
        resolvers.register(Arc::new(AnimeToshoResolver::new(timeout)?));
        Ok(resolvers)
    }

    pub fn register(&mut self, resolver: Arc<dyn TorrentUrlResolver>) {
        self.resolvers
            .insert(resolver.tracker().to_lowercase(), resolver);
    }

    pub fn get(&self, tracker: &str) -> Option<Arc<dyn TorrentUrlResolver>> {
        self.resolvers.get(&tracker.trim().to_lowercase()).cloned()
    }

    pub fn supports(&self, tracker: &str) -> bool {
        self.get(tracker).is_some()
    }
}
