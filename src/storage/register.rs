use crate::config::DatabaseConfig;
use crate::errors::Result;
use crate::storage::Storage;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

pub type BoxedStorageFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn Storage>>> + Send>>;
pub type StorageConstructor = Arc<dyn Fn(DatabaseConfig) -> BoxedStorageFuture + Send + Sync>;

static STORAGE_REGISTRY: Lazy<RwLock<HashMap<String, StorageConstructor>>> = Lazy::new(|| {
    let mut builtin: HashMap<String, StorageConstructor> = HashMap::new();
    builtin.insert(
        super::sea_orm_storage::PLUGIN_NAME.to_string(),
        Arc::new(|config| {
            Box::pin(async move {
                let storage = super::sea_orm_storage::SeaOrmStorage::connect(&config).await?;
                Ok(Arc::new(storage) as Arc<dyn Storage>)
            })
        }),
    );
    builtin.insert(
        super::memory_storage::PLUGIN_NAME.to_string(),
        Arc::new(|_config| {
            Box::pin(async move {
                Ok(Arc::new(super::memory_storage::MemoryStorage::new()) as Arc<dyn Storage>)
            })
        }),
    );
    RwLock::new(builtin)
});

pub fn register_storage_plugin<S: Into<String>>(name: S, constructor: StorageConstructor) {
    let name = name.into();
    let mut registry = STORAGE_REGISTRY
        .write()
        .expect("Storage registry lock poisoned");
    registry.insert(name, constructor);
}

pub fn get_storage_plugin(name: &str) -> Option<StorageConstructor> {
    STORAGE_REGISTRY
        .read()
        .expect("Storage registry lock poisoned")
        .get(name)
        .cloned()
}

pub fn debug_storage_registry() {
    let registry = STORAGE_REGISTRY
        .read()
        .expect("Storage registry lock poisoned");
    tracing::debug!("Registered storage plugins:");
    for key in registry.keys() {
        tracing::debug!(" - {}", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_plugin_registration() {
        assert!(get_storage_plugin("memory-alias").is_none());
        register_storage_plugin(
            "memory-alias",
            Arc::new(|_config| {
                Box::pin(async move {
                    Ok(Arc::new(super::super::memory_storage::MemoryStorage::new())
                        as Arc<dyn Storage>)
                })
            }),
        );

        let constructor = get_storage_plugin("memory-alias").unwrap();
        let storage = constructor(DatabaseConfig::with_url("memory://")).await.unwrap();
        assert!(storage.list_questions(false).await.unwrap().is_empty());
    }
}
