//! Connectivity check for every service a sync run talks to.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::download_client::DownloadClient;
use crate::library::{MovieLibrary, SeriesLibrary};
use crate::release_index::ReleaseIndex;
use crate::tracking::{TrackingError, TrackingService};

/// AniList id requested to check the tracking service (Cowboy Bebop).
const CHECK_MEDIA_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub service: &'static str,
    pub configured: bool,
    pub accessible: bool,
    pub error: Option<String>,
}

impl ServiceStatus {
    fn not_configured(service: &'static str) -> Self {
        Self {
            service,
            configured: false,
            accessible: false,
            error: None,
        }
    }

    fn from_result<T, E: Display>(service: &'static str, result: Result<T, E>) -> Self {
        match result {
            Ok(_) => {
                info!(service, "Service is accessible");
                Self {
                    service,
                    configured: true,
                    accessible: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(service, error = %e, "Service is not accessible");
                Self {
                    service,
                    configured: true,
                    accessible: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Services to check. Optional ones are reported as not configured.
pub struct ServiceSet {
    pub tracking: Arc<dyn TrackingService>,
    pub release_index: Arc<dyn ReleaseIndex>,
    pub sonarr: Option<Arc<dyn SeriesLibrary>>,
    pub radarr: Option<Arc<dyn MovieLibrary>>,
    pub download_client: Option<Arc<dyn DownloadClient>>,
}

/// Issue one cheap read against each service, in a fixed order.
pub async fn check_services(services: &ServiceSet) -> Vec<ServiceStatus> {
    let mut statuses = Vec::with_capacity(5);

    debug!("Checking AniList");
    // An unknown id still proves the API answered.
    let tracking = match services.tracking.get_media(CHECK_MEDIA_ID).await {
        Err(TrackingError::NotFound(_)) => Ok(()),
        other => other.map(|_| ()),
    };
    statuses.push(ServiceStatus::from_result("anilist", tracking));

    debug!("Checking releases.moe");
    statuses.push(ServiceStatus::from_result(
        "releases.moe",
        services.release_index.get_entry(CHECK_MEDIA_ID).await,
    ));

    statuses.push(match &services.sonarr {
        Some(sonarr) => ServiceStatus::from_result("sonarr", sonarr.list_all_series().await),
        None => ServiceStatus::not_configured("sonarr"),
    });

    statuses.push(match &services.radarr {
        Some(radarr) => ServiceStatus::from_result("radarr", radarr.list_all_movies().await),
        None => ServiceStatus::not_configured("radarr"),
    });

    statuses.push(match &services.download_client {
        Some(client) => {
            ServiceStatus::from_result("qbittorrent", client.list_active_hashes().await)
        }
        None => ServiceStatus::not_configured("qbittorrent"),
    });

    let accessible = statuses.iter().filter(|s| s.accessible).count();
    let configured = statuses.iter().filter(|s| s.configured).count();
    info!(configured, accessible, "Service status check completed");

    statuses
}
