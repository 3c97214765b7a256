//! Record stores for the shopbot assistant

mod file;
mod memory;

pub use file::JsonFileStorage;
pub use memory::InMemoryStorage;
pub use shopbot_core::{ShopStorage, StorageError, StorageResult};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    #[serde(rename = "file")]
    File { path: String },
    #[serde(rename = "memory")]
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: "data".to_string(),
        }
    }
}

pub fn create_storage(config: &StorageConfig) -> Arc<dyn ShopStorage> {
    match config {
        StorageConfig::File { path } => Arc::new(JsonFileStorage::new(path)),
        StorageConfig::Memory => Arc::new(InMemoryStorage::new()),
    }
}
