//! Eager background population of every detail cache.
//!
//! A preload is a two-level gather: all service details concurrently, then
//! for each service that loaded, all of its port and client details
//! concurrently. Every leaf fetch holds a permit from one semaphore sized by
//! `preload_concurrency`, so a dashboard with hundreds of clients never
//! floods the backend. A leaf that fails is recorded in the report and the
//! rest of the gather carries on.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::{CacheKey, EntityKind, FetchOptions, ServicesStore};
use crate::models::ServiceId;

#[derive(Debug, Clone, Serialize)]
pub struct PreloadReport {
    pub run_id: Uuid,
    pub forced: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub services_total: usize,
    pub services_loaded: usize,
    pub ports_loaded: usize,
    pub users_loaded: usize,
    /// Keys whose fetch failed during this run.
    pub failed: Vec<CacheKey>,
}

impl PreloadReport {
    pub fn failed_count(&self, kind: EntityKind) -> usize {
        self.failed.iter().filter(|k| k.kind == kind).count()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
struct ServiceOutcome {
    loaded: bool,
    ports_loaded: usize,
    users_loaded: usize,
    failed: Vec<CacheKey>,
}

impl ServicesStore {
    /// Silently fetch every service, port and client detail. With `forced`,
    /// the caches are dropped first and every fetch bypasses them.
    pub async fn preload_all_details(&self, forced: bool) -> PreloadReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Preload {} started (forced: {})", run_id, forced);

        if forced {
            self.cache.clear_all().await;
        }

        if forced || self.services.read().await.is_empty() {
            if let Err(e) = self.load_services(true).await {
                warn!("Preload {} has no fresh service list: {}", run_id, e);
            }
        }

        let services = self.services().await;
        let options = self.default_options().with_force(forced).silently();
        let permits = Semaphore::new(self.preload_concurrency);

        let outcomes = join_all(
            services
                .iter()
                .map(|service| self.preload_service(service.id, options, &permits)),
        )
        .await;

        let mut report = PreloadReport {
            run_id,
            forced,
            started_at,
            finished_at: started_at,
            services_total: services.len(),
            services_loaded: 0,
            ports_loaded: 0,
            users_loaded: 0,
            failed: Vec::new(),
        };
        for outcome in outcomes {
            if outcome.loaded {
                report.services_loaded += 1;
            }
            report.ports_loaded += outcome.ports_loaded;
            report.users_loaded += outcome.users_loaded;
            report.failed.extend(outcome.failed);
        }
        report.finished_at = Utc::now();

        info!(
            "Preload {} finished in {}ms: {}/{} services, {} ports, {} clients, {} failed",
            run_id,
            (report.finished_at - report.started_at).num_milliseconds(),
            report.services_loaded,
            report.services_total,
            report.ports_loaded,
            report.users_loaded,
            report.failed.len()
        );
        report
    }

    /// Drop every cache region, then preload with `forced`.
    pub async fn force_refresh_all_data(&self) -> PreloadReport {
        self.cache.clear_all().await;
        self.preload_all_details(true).await
    }

    /// Fire-and-forget preload on the runtime; the handle can be ignored.
    pub fn spawn_preload(self: &Arc<Self>, forced: bool) -> JoinHandle<PreloadReport> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.preload_all_details(forced).await })
    }

    async fn preload_service(
        &self,
        service_id: ServiceId,
        options: FetchOptions,
        permits: &Semaphore,
    ) -> ServiceOutcome {
        let detail = {
            let _permit = permits.acquire().await.ok();
            self.load_service_detail(service_id, options).await
        };

        let Some(service) = detail else {
            return ServiceOutcome {
                failed: vec![CacheKey::service_detail(service_id, options.window_days)],
                ..Default::default()
            };
        };

        let ports = join_all(service.tags().map(|tag| async move {
            let _permit = permits.acquire().await.ok();
            let loaded = self.get_port_detail(service_id, tag, options).await.is_some();
            (CacheKey::port_detail(service_id, tag, options.window_days), loaded)
        }));
        let users = join_all(service.emails().map(|email| async move {
            let _permit = permits.acquire().await.ok();
            let loaded = self.get_user_detail(service_id, email, options).await.is_some();
            (CacheKey::user_detail(service_id, email, options.window_days), loaded)
        }));
        let (ports, users) = futures::join!(ports, users);

        let mut outcome = ServiceOutcome {
            loaded: true,
            ..Default::default()
        };
        for (key, loaded) in ports {
            if loaded {
                outcome.ports_loaded += 1;
            } else {
                outcome.failed.push(key);
            }
        }
        for (key, loaded) in users {
            if loaded {
                outcome.users_loaded += 1;
            } else {
                outcome.failed.push(key);
            }
        }
        outcome
    }
}
