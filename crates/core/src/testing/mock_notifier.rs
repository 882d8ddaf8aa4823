//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{Notification, Notifier, NotifyError};

/// Records every posted notification.
#[derive(Debug, Default)]
pub struct MockNotifier {
    posted: Arc<RwLock<Vec<Notification>>>,
    /// If set, every post fails with this HTTP status.
    fail_status: Arc<RwLock<Option<u16>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn posted(&self) -> Vec<Notification> {
        self.posted.read().await.clone()
    }

    pub async fn fail_with_status(&self, status: u16) {
        *self.fail_status.write().await = Some(status);
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn post(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Some(status) = *self.fail_status.read().await {
            return Err(NotifyError::HttpStatus(status));
        }
        self.posted.write().await.push(notification.clone());
        Ok(())
    }
}
