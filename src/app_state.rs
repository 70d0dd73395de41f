use std::sync::Arc;

use crate::services::jobs::JobService;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobService>,
}

impl AppState {
    pub fn new(jobs: JobService) -> Self {
        Self {
            jobs: Arc::new(jobs),
        }
    }
}
