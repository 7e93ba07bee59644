use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Service, ServiceId};

/// The service the view is currently showing.
pub struct Selection {
    current: RwLock<Option<Arc<Service>>>,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    pub async fn current(&self) -> Option<Arc<Service>> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, service: Option<Arc<Service>>) {
        debug!(
            "Selection -> {}",
            service
                .as_ref()
                .map(|s| s.id.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        *self.current.write().await = service;
    }

    /// Drop the selection if it points at `service_id`. Returns whether it did.
    pub async fn clear_if(&self, service_id: ServiceId) -> bool {
        let mut current = self.current.write().await;
        if current.as_ref().is_some_and(|s| s.id == service_id) {
            *current = None;
            true
        } else {
            false
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}
