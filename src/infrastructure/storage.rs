use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::services::storage::LocalStorage;

/// Ensures the image directory exists and hands out the file store.
pub async fn setup_storage(config: &Config) -> anyhow::Result<Arc<LocalStorage>> {
    tokio::fs::create_dir_all(&config.image_dir).await?;

    info!("🗂  Image store: {}", config.image_dir);

    Ok(Arc::new(LocalStorage::new(&config.image_dir)))
}
