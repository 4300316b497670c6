pub mod todo_repository;
pub mod user_repository;

use thiserror::Error;
use tracing::error;

const HEALTH_KEY: &[u8] = b"__health";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode record: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Clone)]
pub struct Database {
    pub db: sled::Db,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Database { db })
    }

    /// Throwaway store removed when the last handle drops
    #[allow(dead_code)]
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Database { db })
    }

    pub fn tree(&self, name: &str) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(name)?)
    }

    /// Health check write: stamps a marker in the default tree and flushes it.
    ///
    /// Catches a store that can no longer write or sync to disk (full or
    /// read-only volume, I/O errors). It cannot tell whether other processes
    /// can open the directory, and a flush is not a durability guarantee for
    /// records written afterwards.
    pub fn is_reachable(&self) -> bool {
        let stamp = chrono::Utc::now().timestamp_millis().to_be_bytes();
        let written = self
            .db
            .insert(HEALTH_KEY, &stamp[..])
            .and_then(|_| self.db.flush());
        if let Err(e) = &written {
            error!(error = %e, "Store health write failed");
        }
        written.is_ok()
    }
}


pub(crate) fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

pub(crate) fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}
