mod file;
mod memory;
mod store;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use store::{ ConversationStore, SNAPSHOT_KEY };

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::ChatArgs;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Key/value persistence for conversation snapshots, shaped like browser
/// local storage: one string value per key.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn create_snapshot_storage(
    args: &ChatArgs
) -> Result<Arc<dyn SnapshotStorage>, Box<dyn Error + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => {
            info!("Conversation snapshots will be stored in: {}", args.storage_dir);
            Ok(Arc::new(FileStorage::new(&args.storage_dir)))
        }
        "memory" => {
            info!("Conversation snapshots will be kept in memory for this session only");
            Ok(Arc::new(MemoryStorage::new()))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported storage type: {}", args.storage_type)
                    )
                )
            ),
    }
}
