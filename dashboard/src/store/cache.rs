//! Cache regions for service, port and user details.
//!
//! Each region maps a structural [`CacheKey`] to the last value the backend
//! returned for it. There is no expiry and no eviction: an entry is only
//! replaced by a later successful fetch or dropped by [`CacheStore::clear`].
//! Values are handed out as `Arc`s, so two hits on the same key yield the
//! same allocation.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{PortDetail, Service, ServiceId, UserDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    ServiceDetail,
    PortDetail,
    UserDetail,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::ServiceDetail,
        EntityKind::PortDetail,
        EntityKind::UserDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ServiceDetail => "service-detail",
            EntityKind::PortDetail => "port-detail",
            EntityKind::UserDetail => "user-detail",
        }
    }
}

/// Identity of one cached resource: kind, service, optional tag/email and
/// the time window in days.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub service_id: ServiceId,
    pub sub_identity: Option<String>,
    pub window_days: u32,
}

impl CacheKey {
    pub fn service_detail(service_id: ServiceId, window_days: u32) -> Self {
        Self {
            kind: EntityKind::ServiceDetail,
            service_id,
            sub_identity: None,
            window_days,
        }
    }

    pub fn port_detail(service_id: ServiceId, tag: &str, window_days: u32) -> Self {
        Self {
            kind: EntityKind::PortDetail,
            service_id,
            sub_identity: Some(tag.to_string()),
            window_days,
        }
    }

    pub fn user_detail(service_id: ServiceId, email: &str, window_days: u32) -> Self {
        Self {
            kind: EntityKind::UserDetail,
            service_id,
            sub_identity: Some(email.to_string()),
            window_days,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}d)",
            self.kind.as_str(),
            self.service_id,
            self.sub_identity.as_deref().unwrap_or("_"),
            self.window_days
        )
    }
}

pub struct CacheRegion<T> {
    entries: RwLock<HashMap<CacheKey, Arc<T>>>,
}

impl<T> CacheRegion<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: CacheKey, value: Arc<T>) {
        self.entries.write().await.insert(key, value);
    }

    async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Types that own a region of the [`CacheStore`].
pub trait CacheEntry: Send + Sync + Sized + 'static {
    const KIND: EntityKind;

    fn region(cache: &CacheStore) -> &CacheRegion<Self>;
}

impl CacheEntry for Service {
    const KIND: EntityKind = EntityKind::ServiceDetail;

    fn region(cache: &CacheStore) -> &CacheRegion<Self> {
        &cache.service_details
    }
}

impl CacheEntry for PortDetail {
    const KIND: EntityKind = EntityKind::PortDetail;

    fn region(cache: &CacheStore) -> &CacheRegion<Self> {
        &cache.port_details
    }
}

impl CacheEntry for UserDetail {
    const KIND: EntityKind = EntityKind::UserDetail;

    fn region(cache: &CacheStore) -> &CacheRegion<Self> {
        &cache.user_details
    }
}

pub struct CacheStore {
    service_details: CacheRegion<Service>,
    port_details: CacheRegion<PortDetail>,
    user_details: CacheRegion<UserDetail>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            service_details: CacheRegion::new(),
            port_details: CacheRegion::new(),
            user_details: CacheRegion::new(),
        }
    }

    pub async fn get<T: CacheEntry>(&self, key: &CacheKey) -> Option<Arc<T>> {
        debug_assert_eq!(key.kind, T::KIND);
        T::region(self).get(key).await
    }

    /// Full overwrite of whatever the key held before.
    pub async fn put<T: CacheEntry>(&self, key: CacheKey, value: Arc<T>) {
        debug_assert_eq!(key.kind, T::KIND);
        T::region(self).put(key, value).await;
    }

    pub async fn clear(&self, kind: EntityKind) {
        let dropped = match kind {
            EntityKind::ServiceDetail => self.service_details.clear().await,
            EntityKind::PortDetail => self.port_details.clear().await,
            EntityKind::UserDetail => self.user_details.clear().await,
        };
        debug!("Cleared {} {} entries", dropped, kind.as_str());
    }

    pub async fn clear_all(&self) {
        for kind in EntityKind::ALL {
            self.clear(kind).await;
        }
    }

    pub async fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::ServiceDetail => self.service_details.len().await,
            EntityKind::PortDetail => self.port_details.len().await,
            EntityKind::UserDetail => self.user_details.len().await,
        }
    }

    pub async fn is_empty(&self) -> bool {
        for kind in EntityKind::ALL {
            if self.len(kind).await > 0 {
                return false;
            }
        }
        true
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
