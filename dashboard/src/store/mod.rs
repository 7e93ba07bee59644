//! Services store
//!
//! Client-side state for the traffic dashboard: the service list, the
//! currently selected service, and three detail caches. Two kinds of callers
//! share it:
//!
//! - **navigation**: the view asks for a detail; a cache hit is free, a miss
//!   goes to the backend, and service details become the selection.
//! - **preload**: [`ServicesStore::preload_all_details`] walks every service,
//!   port and client with `silent` fetches that fill the caches without ever
//!   touching the selection.
//!
//! Fetches never return errors. A failed fetch is logged, leaves the cache as
//! it was, and yields `None`, so one broken leaf cannot take down a fan-out.
//! Navigation loads (the list, non-silent service details) also leave a
//! readable message in [`ServicesStore::error`]; preload never writes it.

pub mod cache;
pub mod preload;
pub mod selection;

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::constants::cache::{DEFAULT_WINDOW_DAYS, PRELOAD_CONCURRENCY};
use crate::errors::{DashboardError, GatewayError};
use crate::gateway::{Gateway, GatewayResult, HttpGateway};
use crate::models::{PortDetail, Service, ServiceId, UserDetail};
use crate::session::Session;

pub use cache::{CacheEntry, CacheKey, CacheStore, EntityKind};
pub use preload::PreloadReport;
pub use selection::Selection;

/// Per-call knobs shared by every detail fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub window_days: u32,
    /// Skip the cache lookup and always ask the backend.
    pub force: bool,
    /// Fill the cache without publishing to the selection.
    pub silent: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            force: false,
            silent: false,
        }
    }
}

impl FetchOptions {
    pub fn with_window(mut self, window_days: u32) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn forced(self) -> Self {
        self.with_force(true)
    }

    pub fn silently(mut self) -> Self {
        self.silent = true;
        self
    }
}

pub struct ServicesStore {
    gateway: Arc<dyn Gateway>,
    services: RwLock<Vec<Service>>,
    selection: Selection,
    cache: CacheStore,
    /// List loads in flight; overlapping loads each hold one count.
    loading: AtomicUsize,
    error: RwLock<Option<String>>,
    default_window_days: u32,
    preload_concurrency: usize,
}

impl ServicesStore {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            services: RwLock::new(Vec::new()),
            selection: Selection::new(),
            cache: CacheStore::new(),
            loading: AtomicUsize::new(0),
            error: RwLock::new(None),
            default_window_days: DEFAULT_WINDOW_DAYS,
            preload_concurrency: PRELOAD_CONCURRENCY,
        }
    }

    pub fn from_config(gateway: Arc<dyn Gateway>, config: &Config) -> Self {
        Self {
            default_window_days: config.default_window_days,
            preload_concurrency: config.preload_concurrency.max(1),
            ..Self::new(gateway)
        }
    }

    /// Load the session from `token_path` and build a store talking to the
    /// configured backend.
    pub async fn connect(config: &Config) -> Result<Self, DashboardError> {
        config.validate()?;

        let session = Arc::new(Session::load(&config.token_path).await?);
        if !session.is_authenticated().await {
            warn!(
                "No session token found at {}, the backend will likely answer 401",
                config.token_path
            );
        }

        let gateway = HttpGateway::new(config, session)?;
        Ok(Self::from_config(Arc::new(gateway), config))
    }

    pub fn with_preload_concurrency(mut self, limit: usize) -> Self {
        self.preload_concurrency = limit.max(1);
        self
    }

    /// Options carrying the configured default window.
    pub fn default_options(&self) -> FetchOptions {
        FetchOptions::default().with_window(self.default_window_days)
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn services(&self) -> Vec<Service> {
        self.services.read().await.clone()
    }

    pub async fn selected_service(&self) -> Option<Arc<Service>> {
        self.selection.current().await
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    /// Fetch the service list unless it is already loaded. On failure the
    /// previous list stays in place and a readable message lands in
    /// [`ServicesStore::error`].
    #[instrument(skip(self))]
    pub async fn load_services(&self, force: bool) -> Result<(), GatewayError> {
        if !force && !self.services.read().await.is_empty() {
            return Ok(());
        }

        self.loading.fetch_add(1, Ordering::SeqCst);
        *self.error.write().await = None;

        let result = match self.gateway.list_services().await {
            Ok(services) => {
                info!("Loaded {} services", services.len());
                *self.services.write().await = services;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load service list: {}", e);
                *self.error.write().await = Some(e.user_message());
                Err(e)
            }
        };

        self.loading.fetch_sub(1, Ordering::SeqCst);
        result
    }

    pub async fn select_service(&self, service: Option<Arc<Service>>) {
        self.selection.set(service).await;
    }

    /// Service detail merged onto the list record. Unless `silent`, the
    /// result (cached or fresh) becomes the selection and the outcome is
    /// reflected in [`ServicesStore::error`].
    pub async fn load_service_detail(
        &self,
        service_id: ServiceId,
        options: FetchOptions,
    ) -> Option<Arc<Service>> {
        let key = CacheKey::service_detail(service_id, options.window_days);
        let fetch = async {
            let base = self.merge_base(service_id).await;
            let payload = self
                .gateway
                .service_detail(service_id, options.window_days)
                .await?;
            base.merged_with(&payload)
                .map_err(|e| GatewayError::InvalidResponse {
                    endpoint: format!("/db/services/{}/traffic", service_id),
                    reason: e.to_string(),
                })
        };

        let result = self.fetch_entry(key, options.force, fetch).await;
        if options.silent {
            return result.ok();
        }

        match result {
            Ok(service) => {
                *self.error.write().await = None;
                self.selection.set(Some(Arc::clone(&service))).await;
                Some(service)
            }
            Err(e) => {
                *self.error.write().await = Some(e.user_message());
                None
            }
        }
    }

    pub async fn get_port_detail(
        &self,
        service_id: ServiceId,
        tag: &str,
        options: FetchOptions,
    ) -> Option<Arc<PortDetail>> {
        let key = CacheKey::port_detail(service_id, tag, options.window_days);
        let fetch = self.gateway.port_detail(service_id, tag, options.window_days);
        self.fetch_entry(key, options.force, fetch).await.ok()
    }

    pub async fn get_user_detail(
        &self,
        service_id: ServiceId,
        email: &str,
        options: FetchOptions,
    ) -> Option<Arc<UserDetail>> {
        let key = CacheKey::user_detail(service_id, email, options.window_days);
        let fetch = self.gateway.user_detail(service_id, email, options.window_days);
        self.fetch_entry(key, options.force, fetch).await.ok()
    }

    /// Reload the list, then the selected service's detail for the
    /// configured window, both bypassing the cache.
    pub async fn force_refresh_selected(&self) -> Option<Arc<Service>> {
        // the list error is already recorded for the view
        let _ = self.load_services(true).await;

        let selected = self.selection.current().await?;
        self.load_service_detail(selected.id, self.default_options().forced())
            .await
    }

    /// Remove a service on the backend and from the local list. Cached
    /// details of the service are left behind; nothing reaches them once the
    /// service is gone from the list.
    #[instrument(skip(self))]
    pub async fn delete_service(&self, service_id: ServiceId) -> Result<(), GatewayError> {
        match self.gateway.delete_service(service_id).await {
            Ok(()) => {
                self.services.write().await.retain(|s| s.id != service_id);
                if self.selection.clear_if(service_id).await {
                    debug!("Deleted service {} was selected, selection cleared", service_id);
                }
                info!("Deleted service {}", service_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete service {}: {}", service_id, e);
                Err(e)
            }
        }
    }

    pub async fn rename_service(&self, service_id: ServiceId, custom_name: &str) -> Result<(), GatewayError> {
        self.gateway
            .rename_service(service_id, custom_name)
            .await
            .inspect(|_| info!("Renamed service {} to '{}'", service_id, custom_name))
            .inspect_err(|e| error!("Failed to rename service {}: {}", service_id, e))
    }

    pub async fn rename_inbound(
        &self,
        service_id: ServiceId,
        tag: &str,
        custom_name: &str,
    ) -> Result<(), GatewayError> {
        self.gateway
            .rename_inbound(service_id, tag, custom_name)
            .await
            .inspect(|_| info!("Renamed inbound {}/{} to '{}'", service_id, tag, custom_name))
            .inspect_err(|e| error!("Failed to rename inbound {}/{}: {}", service_id, tag, e))
    }

    pub async fn rename_client(
        &self,
        service_id: ServiceId,
        email: &str,
        custom_name: &str,
    ) -> Result<(), GatewayError> {
        self.gateway
            .rename_client(service_id, email, custom_name)
            .await
            .inspect(|_| info!("Renamed client {}/{} to '{}'", service_id, email, custom_name))
            .inspect_err(|e| error!("Failed to rename client {}/{}: {}", service_id, email, e))
    }

    pub async fn download_port_history(&self, service_id: ServiceId, tag: &str) -> Result<Vec<u8>, GatewayError> {
        self.gateway.download_port_history(service_id, tag).await
    }

    pub async fn download_user_history(&self, service_id: ServiceId, email: &str) -> Result<Vec<u8>, GatewayError> {
        self.gateway.download_user_history(service_id, email).await
    }

    /// Record a detail payload is merged onto: the list entry, else the
    /// current selection if it is the same service, else a bare record.
    async fn merge_base(&self, service_id: ServiceId) -> Service {
        if let Some(listed) = self
            .services
            .read()
            .await
            .iter()
            .find(|s| s.id == service_id)
        {
            return listed.clone();
        }

        match self.selection.current().await {
            Some(selected) if selected.id == service_id => (*selected).clone(),
            _ => Service::bare(service_id),
        }
    }

    /// Cache lookup, then backend on miss or `force`. Only a successful
    /// fetch writes the cache; a failure is logged and handed back.
    async fn fetch_entry<T, F>(&self, key: CacheKey, force: bool, fetch: F) -> GatewayResult<Arc<T>>
    where
        T: CacheEntry,
        F: Future<Output = GatewayResult<T>>,
    {
        if !force {
            if let Some(hit) = self.cache.get::<T>(&key).await {
                debug!("Cache hit {}", key);
                return Ok(hit);
            }
        }

        match fetch.await {
            Ok(value) => {
                let value = Arc::new(value);
                self.cache.put(key.clone(), Arc::clone(&value)).await;
                debug!("Cached {}", key);
                Ok(value)
            }
            Err(e) => {
                warn!("Fetch {} failed: {}", key, e);
                Err(e)
            }
        }
    }
}
