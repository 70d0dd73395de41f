use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use super::codec::base64_bytes;
use super::filter::Filter;

/// Lifecycle of a filter job. Intake only ever writes `Pending`; the
/// remaining transitions belong to the workers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

/// Queryable status record, stored under `<prefix><id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    pub id: Uuid,
    pub filter: Filter,
    pub status: JobStatus,
}

impl JobRecord {
    pub fn pending(id: Uuid, filter: Filter) -> Self {
        Self {
            id,
            filter,
            status: JobStatus::Pending,
        }
    }
}

/// Queue payload consumed by the workers. The image only travels here,
/// never in the status record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItem {
    pub id: Uuid,
    pub filter: Filter,
    #[serde(rename = "image_data", with = "base64_bytes")]
    pub image: Vec<u8>,
}

/// Response body for a successful submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobCreatedResponse {
    pub id: Uuid,
}
