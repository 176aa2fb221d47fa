//! Permission gate backed by stored settings

use async_trait::async_trait;
use brieflens_core::{OriginAllowList, PermissionGate, SettingsSource};
use std::sync::Arc;
use tracing::warn;

/// Checks `granted_origins` from the current settings on every request,
/// so grants made while running take effect immediately.
///
/// No allow-list in settings grants every origin. Unreadable settings deny.
pub struct SettingsPermissionGate {
    settings: Arc<dyn SettingsSource>,
}

impl SettingsPermissionGate {
    pub fn new(settings: Arc<dyn SettingsSource>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PermissionGate for SettingsPermissionGate {
    async fn has_origin_access(&self, origin: &str) -> bool {
        match self.settings.load().await {
            Ok(settings) => match settings.granted_origins {
                Some(origins) => OriginAllowList::new(origins).has_origin_access(origin).await,
                None => true,
            },
            Err(e) => {
                warn!(origin, error = %e, "Failed to load settings for permission check");
                false
            }
        }
    }
}
