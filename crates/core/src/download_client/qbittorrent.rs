//! qBittorrent WebUI (API v2) client.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{DownloadClient, DownloadClientError};

/// Body qBittorrent sends for a successful login or add.
const ACK: &str = "Ok.";

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Set once logged in; the SID cookie itself lives in the client's jar.
    logged_in: RwLock<bool>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, DownloadClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| DownloadClientError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            logged_in: RwLock::new(false),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and store session cookie.
    pub async fn login(&self) -> Result<(), DownloadClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(DownloadClientError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.trim() == ACK {
            debug!("qBittorrent login successful");
            *self.logged_in.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DownloadClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(DownloadClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn ensure_logged_in(&self) -> Result<(), DownloadClientError> {
        if *self.logged_in.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request, logging in again once on 403.
    async fn send(
        &self,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<String, DownloadClientError> {
        self.ensure_logged_in().await?;

        let mut response = build()
            .send()
            .await
            .map_err(DownloadClientError::from_reqwest)?;

        if response.status().as_u16() == 403 {
            warn!("qBittorrent session expired, logging in again");
            *self.logged_in.write().await = false;
            self.login().await?;

            response = build()
                .send()
                .await
                .map_err(DownloadClientError::from_reqwest)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloadClientError::ApiError(e.to_string()))
    }
}

/// The only field of `/api/v2/torrents/info` we need.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
}

fn parse_hashes(body: &str) -> Result<HashSet<String>, DownloadClientError> {
    let torrents: Vec<QBTorrentInfo> = serde_json::from_str(body)
        .map_err(|e| DownloadClientError::ApiError(format!("Failed to parse response: {}", e)))?;
    Ok(torrents.into_iter().map(|t| t.hash.to_lowercase()).collect())
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_active_hashes(&self) -> Result<HashSet<String>, DownloadClientError> {
        let url = format!("{}/api/v2/torrents/info", self.base_url());
        let body = self.send(|| self.client.get(&url)).await?;
        parse_hashes(&body)
    }

    async fn add_url(&self, url: &str, category: Option<&str>) -> Result<(), DownloadClientError> {
        let endpoint = format!("{}/api/v2/torrents/add", self.base_url());

        let mut params = vec![("urls", url)];
        if let Some(cat) = category {
            params.push(("category", cat));
        }

        let body = self
            .send(|| self.client.post(&endpoint).form(&params))
            .await?;

        if body.trim() == ACK {
            Ok(())
        } else {
            Err(DownloadClientError::Rejected(format!(
                "qBittorrent answered {:?} for {}",
                body.chars().take(100).collect::<String>(),
                url
            )))
        }
    }
}
