//! releases.moe (SeaDex) client.
//!
//! The index is a PocketBase instance; entries are fetched with their
//! torrents expanded in a single request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ReleaseIndexConfig;

use super::types::{tracker_is_public, ReleaseCandidate, ReleaseIndexEntry, ReleaseIndexError};
use super::ReleaseIndex;

pub struct ReleasesMoeClient {
    client: Client,
    base_url: String,
}

impl ReleasesMoeClient {
    pub fn new(config: &ReleaseIndexConfig) -> Result<Self, ReleaseIndexError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    items: Vec<EntryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    #[serde(rename = "alID")]
    al_id: i64,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    incomplete: bool,
    #[serde(default)]
    expand: Option<EntryExpand>,
}

#[derive(Debug, Deserialize)]
struct EntryExpand {
    #[serde(default)]
    trs: Vec<TorrentRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentRecord {
    #[serde(default)]
    release_group: String,
    tracker: String,
    url: String,
    #[serde(default)]
    info_hash: String,
    #[serde(default)]
    is_best: bool,
    #[serde(default)]
    dual_audio: bool,
}

impl From<TorrentRecord> for ReleaseCandidate {
    fn from(t: TorrentRecord) -> Self {
        ReleaseCandidate {
            is_public: tracker_is_public(&t.tracker),
            release_group: t.release_group,
            tracker: t.tracker,
            url: t.url,
            infohash: t.info_hash.to_lowercase(),
            is_best: t.is_best,
            is_dual_audio: t.dual_audio,
        }
    }
}

/// Records query for one AniList id, torrents expanded.
fn entry_query_url(base_url: &str, tracking_id: i64) -> String {
    format!(
        "{}/api/collections/entries/records?filter={}&expand=trs",
        base_url,
        urlencoding::encode(&format!("(alID={})", tracking_id))
    )
}

fn into_entry(base_url: &str, record: EntryRecord) -> ReleaseIndexEntry {
    let torrents = record
        .expand
        .map(|e| e.trs.into_iter().map(ReleaseCandidate::from).collect())
        .unwrap_or_default();

    ReleaseIndexEntry {
        tracking_id: record.al_id,
        url: format!("{}/{}/", base_url, record.al_id),
        notes: record.notes.filter(|n| !n.trim().is_empty()),
        incomplete: record.incomplete,
        torrents,
    }
}

#[async_trait]
impl ReleaseIndex for ReleasesMoeClient {
    async fn get_entry(
        &self,
        tracking_id: i64,
    ) -> Result<Option<ReleaseIndexEntry>, ReleaseIndexError> {
        let url = entry_query_url(&self.base_url, tracking_id);

        debug!("releases.moe get entry: al_id={}", tracking_id);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == 404 {
            return Ok(None);
        }
        if status == 429 {
            return Err(ReleaseIndexError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReleaseIndexError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let list: RecordList = response.json().await.map_err(|e| {
            ReleaseIndexError::ParseError(format!("Failed to parse entry response: {}", e))
        })?;

        Ok(list
            .items
            .into_iter()
            .next()
            .map(|record| into_entry(&self.base_url, record)))
    }
}
