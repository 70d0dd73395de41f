use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::models::codec;
use crate::models::job::WorkItem;

pub const DEFAULT_QUEUE_KEY: &str = "jobs:queue";

/// Append-only FIFO shared with the filter workers.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Append a work item to the tail of the queue.
    async fn enqueue(&self, item: &WorkItem) -> Result<(), QueueError>;

    /// Number of items waiting for a worker.
    async fn depth(&self) -> Result<u64, QueueError>;

    async fn health_check(&self) -> Result<(), QueueError>;
}

/// Redis list queue. Producers `RPUSH`, workers pop from the head.
pub struct RedisWorkQueue {
    conn: ConnectionManager,
    queue_key: String,
}

impl RedisWorkQueue {
    pub fn new(conn: ConnectionManager, queue_key: impl Into<String>) -> Self {
        Self {
            conn,
            queue_key: queue_key.into(),
        }
    }
}

#[async_trait]
impl WorkQueue for RedisWorkQueue {
    async fn enqueue(&self, item: &WorkItem) -> Result<(), QueueError> {
        let payload = codec::encode(item)?;
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&self.queue_key, payload).await?;
        Ok(())
    }

    async fn depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.conn.clone();
        let depth: u64 = conn.llen(&self.queue_key).await?;
        Ok(depth)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Process-local queue holding serialized entries exactly as Redis would.
#[derive(Default)]
pub struct InMemoryWorkQueue {
    entries: Mutex<VecDeque<String>>,
    offline: AtomicBool,
}

impl InMemoryWorkQueue {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw entries, head first.
    pub fn entries(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Pop the head entry the way a worker would.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), QueueError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("in-memory queue is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn enqueue(&self, item: &WorkItem) -> Result<(), QueueError> {
        self.ensure_online()?;
        let payload = codec::encode(item)?;
        self.lock().push_back(payload);
        Ok(())
    }

    async fn depth(&self) -> Result<u64, QueueError> {
        self.ensure_online()?;
        Ok(self.len() as u64)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        self.ensure_online()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::Filter;
    use uuid::Uuid;

    fn item(byte: u8) -> WorkItem {
        WorkItem {
            id: Uuid::new_v4(),
            filter: Filter::Grayscale,
            image: vec![byte; 4],
        }
    }

    #[tokio::test]
    async fn test_enqueue_preserves_order() {
        let queue = InMemoryWorkQueue::default();
        let items: Vec<WorkItem> = (0..5).map(item).collect();
        for it in &items {
            queue.enqueue(it).await.unwrap();
        }

        assert_eq!(queue.depth().await.unwrap(), 5);
        for expected in &items {
            let raw = queue.pop().unwrap();
            let decoded: WorkItem = codec::decode(&raw).unwrap();
            assert_eq!(&decoded, expected);
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_offline_queue_rejects_appends() {
        let queue = InMemoryWorkQueue::default();
        queue.set_offline(true);

        let result = queue.enqueue(&item(1)).await;

        assert!(matches!(result, Err(QueueError::Unavailable(_))));
        assert!(queue.is_empty());

        queue.set_offline(false);
        queue.enqueue(&item(1)).await.unwrap();
        assert_eq!(queue.len(), 1);
    }
}
