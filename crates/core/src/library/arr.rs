//! Shared HTTP plumbing for the *arr v3 APIs.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::LibraryConfig;

use super::LibraryError;

/// Minimal authenticated client for Sonarr / Radarr.
pub(crate) struct ArrClient {
    client: Client,
    base_url: String,
    api_key: String,
    service: &'static str,
}

impl ArrClient {
    pub(crate) fn new(config: &LibraryConfig, service: &'static str) -> Result<Self, LibraryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            service,
        })
    }

    /// GET `/api/v3/{endpoint}` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, LibraryError> {
        let url = format!("{}/api/v3/{}", self.base_url, endpoint);

        debug!("{} GET {} {:?}", self.service, endpoint, query);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            return Err(LibraryError::Unauthorized(self.service.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            LibraryError::ParseError(format!(
                "Failed to parse {} {} response: {}",
                self.service, endpoint, e
            ))
        })
    }
}

/// Treat 0 and empty strings as "no id", the way the *arr APIs report them.
pub(crate) fn non_zero(id: Option<i64>) -> Option<i64> {
    id.filter(|&i| i > 0)
}

pub(crate) fn non_empty(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
