use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::filter::FilterRegistry;
use crate::models::job::{JobRecord, WorkItem};
use crate::services::job_store::{JobStore, StoreError};
use crate::services::queue::{QueueError, WorkQueue};
use crate::services::validation::{self, ValidationError};

/// Owns the intake pipeline: validation, identity, status record, queue hand-off.
///
/// This is the only place that writes to both the store and the queue for
/// a submission. The two writes are ordered (record first) but not atomic.
pub struct JobService {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn WorkQueue>,
    filters: FilterRegistry,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn WorkQueue>,
        filters: FilterRegistry,
    ) -> Self {
        Self {
            store,
            queue,
            filters,
        }
    }

    /// Accept an upload and hand it to the workers. Returns the new job ID.
    ///
    /// If the queue append fails after the record was written, the record is
    /// left behind as an orphaned `pending` entry and the caller gets
    /// [`JobError::Enqueue`]; retrying mints a fresh ID.
    pub async fn submit(
        &self,
        image: Option<Vec<u8>>,
        filter: Option<&str>,
    ) -> Result<Uuid, JobError> {
        let start = Instant::now();

        let submission = validation::validate_submission(&self.filters, image, filter)
            .inspect_err(|e| {
                warn!(reason = e.reason(), error = %e, "Rejected job submission");
                metrics::counter!("filter_jobs_rejected_total", "reason" => e.reason())
                    .increment(1);
            })?;

        let id = Uuid::new_v4();
        let record = JobRecord::pending(id, submission.filter);

        if let Err(e) = self.store.put(&id, &record).await {
            error!(job_id = %id, error = %e, "Failed to store job status");
            metrics::counter!("filter_jobs_failed_total", "stage" => "store").increment(1);
            return Err(JobError::Persistence(e));
        }

        let image_bytes = submission.image.len();
        let item = WorkItem {
            id,
            filter: submission.filter,
            image: submission.image,
        };

        if let Err(e) = self.queue.enqueue(&item).await {
            error!(
                job_id = %id,
                error = %e,
                "Failed to enqueue job; status record left pending without a queue entry"
            );
            metrics::counter!("filter_jobs_failed_total", "stage" => "enqueue").increment(1);
            return Err(JobError::Enqueue(e));
        }

        let filter_name: &'static str = submission.filter.into();
        metrics::counter!("filter_jobs_submitted_total", "filter" => filter_name).increment(1);
        metrics::histogram!("filter_job_submission_seconds")
            .record(start.elapsed().as_secs_f64());

        info!(
            job_id = %id,
            filter = %submission.filter,
            image_bytes,
            "Job queued"
        );

        Ok(id)
    }

    /// Current status record for a job. Never invents a record.
    pub async fn status(&self, id: &Uuid) -> Result<JobRecord, JobError> {
        self.store.get(id).await.map_err(|e| match e {
            StoreError::NotFound(id) => JobError::NotFound(id),
            StoreError::CorruptRecord { id, reason } => {
                error!(job_id = %id, %reason, "Stored job status is unreadable");
                JobError::CorruptRecord { id, reason }
            }
            other => JobError::Persistence(other),
        })
    }

    /// Ping both backends.
    pub async fn health(&self) -> Result<(), JobError> {
        self.store
            .health_check()
            .await
            .map_err(JobError::Persistence)?;
        self.queue.health_check().await.map_err(JobError::Enqueue)?;
        Ok(())
    }

    /// Items waiting in the queue.
    pub async fn queue_depth(&self) -> Result<u64, JobError> {
        self.queue.depth().await.map_err(JobError::Enqueue)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist job status: {0}")]
    Persistence(#[source] StoreError),

    #[error("failed to enqueue job: {0}")]
    Enqueue(#[source] QueueError),

    #[error("job {0} does not exist")]
    NotFound(Uuid),

    #[error("stored status for job {id} is unreadable: {reason}")]
    CorruptRecord { id: Uuid, reason: String },
}

impl JobError {
    /// Whether resubmitting the same request unchanged could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Persistence(_) | JobError::Enqueue(_))
    }
}
