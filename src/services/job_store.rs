use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::models::codec;
use crate::models::job::JobRecord;

pub const DEFAULT_KEY_PREFIX: &str = "job:";

/// Key-value store of job status records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Write `record` under `id`, replacing whatever was there.
    async fn put(&self, id: &Uuid, record: &JobRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &Uuid) -> Result<JobRecord, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Parse a stored record and make sure it belongs to the key it was read from.
/// Bytes are taken as-is so non-UTF-8 garbage is reported as corruption.
fn decode_record(id: &Uuid, raw: &[u8]) -> Result<JobRecord, StoreError> {
    let record: JobRecord = codec::decode_bytes(raw).map_err(|e| StoreError::CorruptRecord {
        id: *id,
        reason: e.to_string(),
    })?;
    if record.id != *id {
        return Err(StoreError::CorruptRecord {
            id: *id,
            reason: format!("record carries id {}", record.id),
        });
    }
    Ok(record)
}

fn record_key(prefix: &str, id: &Uuid) -> String {
    format!("{}{}", prefix, id)
}

/// Redis-backed status store: one string key per job, no expiry.
///
/// Holds a [`ConnectionManager`] opened once at startup; clones share the
/// same multiplexed connection and reconnect on failure.
pub struct RedisJobStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisJobStore {
    pub fn new(conn: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn put(&self, id: &Uuid, record: &JobRecord) -> Result<(), StoreError> {
        let payload = codec::encode(record).map_err(StoreError::Serialize)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(record_key(&self.key_prefix, id), payload)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<JobRecord, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(record_key(&self.key_prefix, id)).await?;
        let raw = raw.ok_or(StoreError::NotFound(*id))?;
        decode_record(id, &raw)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Process-local store holding the same JSON Redis would, for tests and
/// local runs without Redis.
#[derive(Default)]
pub struct InMemoryJobStore {
    entries: Mutex<HashMap<Uuid, Vec<u8>>>,
    offline: AtomicBool,
}

impl InMemoryJobStore {
    /// Simulate the backend going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a raw payload as-is, bypassing serialization.
    pub fn insert_raw(&self, id: Uuid, raw: impl Into<Vec<u8>>) {
        self.lock().insert(id, raw.into());
    }

    pub fn raw(&self, id: &Uuid) -> Option<Vec<u8>> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn put(&self, id: &Uuid, record: &JobRecord) -> Result<(), StoreError> {
        self.ensure_online()?;
        let payload = codec::encode(record).map_err(StoreError::Serialize)?;
        self.lock().insert(*id, payload.into_bytes());
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<JobRecord, StoreError> {
        self.ensure_online()?;
        let raw = self.raw(id).ok_or(StoreError::NotFound(*id))?;
        decode_record(id, &raw)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_online()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("stored record for job {id} is corrupt: {reason}")]
    CorruptRecord { id: Uuid, reason: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
