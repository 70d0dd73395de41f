//! Integration test against a live Redis.
//!
//! Run with: cargo test --test redis_integration_test -- --ignored
//! Set REDIS_URL to override the default (redis://127.0.0.1:6379).

mod fixtures;

use std::sync::Arc;

use fixtures::VALID_PNG;
use filter_intake::models::filter::{Filter, FilterRegistry};
use filter_intake::models::job::{JobRecord, WorkItem};
use filter_intake::services::job_store::{JobStore, RedisJobStore};
use filter_intake::services::jobs::{JobError, JobService};
use filter_intake::services::queue::{RedisWorkQueue, WorkQueue};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

#[tokio::test]
#[ignore] // Requires a running Redis instance
async fn test_submission_lands_in_redis() {
    let client = redis::Client::open(redis_url()).expect("Invalid REDIS_URL");

    // Per-run keys so parallel runs and real workers are not disturbed
    let run = Uuid::new_v4();
    let prefix = format!("test:{run}:job:");
    let queue_key = format!("test:{run}:queue");

    let manager = ConnectionManager::new(client.clone())
        .await
        .expect("Redis not reachable");
    let store = Arc::new(RedisJobStore::new(manager.clone(), prefix.clone()));
    let queue = Arc::new(RedisWorkQueue::new(manager, queue_key.clone()));
    store.health_check().await.expect("Redis not reachable");

    let service = JobService::new(store.clone(), queue.clone(), FilterRegistry::default());

    let id = service
        .submit(Some(VALID_PNG.to_vec()), Some("grayscale"))
        .await
        .expect("Submission failed");

    // 1. Status record under the namespaced key
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect");
    let raw: String = conn
        .get(format!("{prefix}{id}"))
        .await
        .expect("Status record missing");
    let record: JobRecord = serde_json::from_str(&raw).expect("Record is not JSON");
    assert_eq!(record, JobRecord::pending(id, Filter::Grayscale));

    // 2. Exactly one queue entry, decodable by a worker
    assert_eq!(queue.depth().await.unwrap(), 1);
    let entry: String = conn
        .lpop(&queue_key, None)
        .await
        .expect("Queue entry missing");
    let item: WorkItem = serde_json::from_str(&entry).expect("Queue entry is not JSON");
    assert_eq!(item.id, id);
    assert_eq!(item.filter, Filter::Grayscale);
    assert_eq!(item.image, VALID_PNG);

    // 3. Status lookup through the service
    assert_eq!(service.status(&id).await.unwrap(), record);
    assert!(matches!(
        service.status(&Uuid::new_v4()).await,
        Err(JobError::NotFound(_))
    ));

    // Cleanup
    conn.del::<_, ()>(format!("{prefix}{id}"))
        .await
        .expect("Failed to clean up status record");
    conn.del::<_, ()>(&queue_key)
        .await
        .expect("Failed to clean up queue");
}
