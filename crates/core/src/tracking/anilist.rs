//! AniList GraphQL client.
//!
//! AniList allows roughly 90 requests per minute; the sync loop's
//! inter-item delay keeps us under that.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::TrackingConfig;

use super::{MediaInfo, TrackingError, TrackingService};

const MEDIA_QUERY: &str = r#"
query ($id: Int) {
  Media(id: $id) {
    id
    title { english romaji native }
    format
    episodes
    coverImage { large }
    siteUrl
  }
}
"#;

pub struct AniListClient {
    client: Client,
    base_url: String,
}

impl AniListClient {
    pub fn new(config: &TrackingConfig) -> Result<Self, TrackingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<MediaData>,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<AniListMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AniListMedia {
    id: i64,
    #[serde(default)]
    title: AniListTitle,
    format: Option<String>,
    episodes: Option<u32>,
    cover_image: Option<AniListCover>,
    site_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AniListTitle {
    english: Option<String>,
    romaji: Option<String>,
    native: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AniListCover {
    large: Option<String>,
}

impl From<AniListMedia> for MediaInfo {
    fn from(m: AniListMedia) -> Self {
        let title = [m.title.english, m.title.romaji, m.title.native]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string());

        MediaInfo {
            id: m.id,
            title,
            format: m.format,
            episodes: m.episodes,
            thumbnail_url: m.cover_image.and_then(|c| c.large),
            site_url: m.site_url,
        }
    }
}

#[async_trait]
impl TrackingService for AniListClient {
    async fn get_media(&self, id: i64) -> Result<MediaInfo, TrackingError> {
        debug!("AniList get media: id={}", id);

        let response = self
            .client
            .post(&self.base_url)
            .json(&json!({ "query": MEDIA_QUERY, "variables": { "id": id } }))
            .send()
            .await?;

        let status = response.status();
        if status == 404 {
            return Err(TrackingError::NotFound(id));
        }
        if status == 429 {
            return Err(TrackingError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackingError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GraphQlResponse = response.json().await.map_err(|e| {
            TrackingError::ParseError(format!("Failed to parse media response: {}", e))
        })?;

        parsed
            .data
            .and_then(|d| d.media)
            .map(MediaInfo::from)
            .ok_or(TrackingError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MediaInfo {
        let r: GraphQlResponse = serde_json::from_str(json).unwrap();
        r.data.unwrap().media.unwrap().into()
    }

    #[test]
    fn test_media_conversion() {
        let media = parse(
            r#"{"data": {"Media": {
                "id": 154587,
                "title": {"english": "Frieren: Beyond Journey's End", "romaji": "Sousou no Frieren", "native": null},
                "format": "TV",
                "episodes": 28,
                "coverImage": {"large": "https://img.anili.st/cover.jpg"},
                "siteUrl": "https://anilist.co/anime/154587"
            }}}"#,
        );
        assert_eq!(media.title, "Frieren: Beyond Journey's End");
        assert_eq!(media.format.as_deref(), Some("TV"));
        assert_eq!(media.episodes, Some(28));
        assert_eq!(
            media.thumbnail_url.as_deref(),
            Some("https://img.anili.st/cover.jpg")
        );
    }

    #[test]
    fn test_title_fallback() {
        let media = parse(
            r#"{"data": {"Media": {"id": 1, "title": {"english": null, "romaji": "Romaji", "native": "ネイティブ"},
                "format": "OVA", "episodes": null, "coverImage": null, "siteUrl": null}}}"#,
        );
        assert_eq!(media.title, "Romaji");
        assert_eq!(media.episodes, None);

        let media = parse(
            r#"{"data": {"Media": {"id": 2, "title": {}, "format": null, "episodes": 1,
                "coverImage": null, "siteUrl": null}}}"#,
        );
        assert_eq!(media.title, "Unknown Title");
    }

    #[test]
    fn test_missing_media() {
        let r: GraphQlResponse =
            serde_json::from_str(r#"{"data": {"Media": null}, "errors": [{"message": "Not Found."}]}"#)
                .unwrap();
        assert!(r.data.unwrap().media.is_none());
    }
}
