use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::DiscordConfig;

use super::{Notification, Notifier, NotifyError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const EMBED_COLOR: u32 = 0x0c_b8_7f;
const AUTHOR_NAME: &str = "relsync";

/// Posts notifications as a single Discord webhook embed.
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(config: &DiscordConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }
}

/// Webhook body for one notification.
pub fn build_embed_payload(notification: &Notification) -> Value {
    let fields: Vec<Value> = notification
        .fields
        .iter()
        .map(|f| json!({ "name": f.name, "value": f.value }))
        .collect();

    let mut embed = json!({
        "author": { "name": AUTHOR_NAME },
        "title": notification.title,
        "description": notification.subtitle,
        "color": EMBED_COLOR,
        "fields": fields,
    });

    if let Some(url) = &notification.url {
        embed["url"] = json!(url);
    }
    if let Some(thumb) = &notification.thumbnail_url {
        embed["thumbnail"] = json!({ "url": thumb });
    }

    json!({ "embeds": [embed] })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn post(&self, notification: &Notification) -> Result<(), NotifyError> {
        debug!(title = %notification.title, "Posting Discord notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&build_embed_payload(notification))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
