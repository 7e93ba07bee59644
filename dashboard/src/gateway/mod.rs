//! Remote data gateway
//!
//! Everything the services store needs from the backend goes through the
//! [`Gateway`] trait. [`HttpGateway`] is the production implementation:
//!
//! ```text
//! ServicesStore → Gateway → HTTP (bearer token) → /api/db/...
//!                    ↓
//!                 Session ← cleared on 401
//! ```
//!
//! The gateway owns transport concerns (auth header, timeouts, retrying
//! transient failures, logging out on 401). Callers only ever see a decoded
//! payload or a [`GatewayError`].

pub mod http;

use crate::errors::GatewayError;
use crate::models::{PortDetail, Service, ServiceId, UserDetail};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use http::HttpGateway;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Shallow records of every monitored service.
    async fn list_services(&self) -> GatewayResult<Vec<Service>>;

    /// Detail payload for one service, to be merged onto its list record.
    async fn service_detail(
        &self,
        service_id: ServiceId,
        window_days: u32,
    ) -> GatewayResult<Map<String, Value>>;

    async fn port_detail(
        &self,
        service_id: ServiceId,
        tag: &str,
        window_days: u32,
    ) -> GatewayResult<PortDetail>;

    async fn user_detail(
        &self,
        service_id: ServiceId,
        email: &str,
        window_days: u32,
    ) -> GatewayResult<UserDetail>;

    async fn delete_service(&self, service_id: ServiceId) -> GatewayResult<()>;

    async fn rename_service(&self, service_id: ServiceId, custom_name: &str) -> GatewayResult<()>;

    async fn rename_inbound(
        &self,
        service_id: ServiceId,
        tag: &str,
        custom_name: &str,
    ) -> GatewayResult<()>;

    async fn rename_client(
        &self,
        service_id: ServiceId,
        email: &str,
        custom_name: &str,
    ) -> GatewayResult<()>;

    /// Raw export of a port's full history.
    async fn download_port_history(&self, service_id: ServiceId, tag: &str)
        -> GatewayResult<Vec<u8>>;

    /// Raw export of a client's full history.
    async fn download_user_history(
        &self,
        service_id: ServiceId,
        email: &str,
    ) -> GatewayResult<Vec<u8>>;
}
