use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dashboard::{ConfigManager, ServicesStore};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("dashboard=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting traffic dashboard store");

    let config_dir = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let config_manager = ConfigManager::new(config_dir).await?;
    let config = config_manager.get_current_config();

    let store = Arc::new(ServicesStore::connect(&config).await?);
    info!("Services store initialized");

    if let Err(e) = store.load_services(false).await {
        return Err(anyhow!("Initial service list load failed: {}", e.user_message()));
    }

    if !config.preload_on_start {
        info!("Preload disabled, {} services listed", store.services().await.len());
        return Ok(());
    }

    let report = store.spawn_preload(false).await?;
    if !report.is_complete() {
        warn!("{} detail fetches failed during preload", report.failed.len());
        for key in &report.failed {
            warn!("  missing {}", key);
        }
    }

    // Everything below is served from the cache filled by the preload.
    let options = store.default_options().silently();
    for service in store.services().await {
        match store.load_service_detail(service.id, options).await {
            Some(detail) => info!(
                "{} (#{}): {} ports, {} clients",
                detail.display_name(),
                detail.id,
                detail.inbound_traffics.len(),
                detail.client_traffics.len()
            ),
            None => warn!("{} (#{}): no detail available", service.display_name(), service.id),
        }
    }

    Ok(())
}
