use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::{self, Storage, backend_for_url};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
}

/// 准备服务器启动的上下文
/// 按 `database.url` 选择存储后端，关系型后端会在连接后执行迁移
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        storage::register::debug_storage_registry();
        debug!("Debug mode: Storage registry is enabled");
    }

    if config.jwt.secret.is_empty() {
        warn!("JWT secret is empty, every authenticated request will be rejected");
    }

    let backend = backend_for_url(&config.database.url);
    warn!("Attempting to create {} storage backend", backend);
    let storage = storage::create_storage(&config.database).await?;
    warn!("Storage backend initialized and migrations completed");

    Ok(StartupContext { storage })
}
