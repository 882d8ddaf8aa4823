//! Outbound notifications for mismatches that led to additions.
//!
//! Delivery failures are reported to the caller, which logs them and moves
//! on. A notification never affects the sync outcome.

mod discord;

pub use discord::{build_embed_payload, DiscordNotifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

/// One notification: a library title and what was sent for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Title as the library knows it.
    pub title: String,
    /// Title as the tracking service knows it.
    pub subtitle: String,
    /// Release index page for the title.
    pub url: Option<String>,
    pub fields: Vec<NotificationField>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
}

impl NotificationField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, notification: &Notification) -> Result<(), NotifyError>;
}
