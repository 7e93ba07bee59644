pub mod config;
pub mod constants;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use errors::{DashboardError, GatewayError};
pub use gateway::{Gateway, HttpGateway};
pub use models::{PortDetail, Service, ServiceId, UserDetail};
pub use session::Session;
pub use store::{CacheKey, EntityKind, FetchOptions, PreloadReport, ServicesStore};
