pub mod job_store;
pub mod jobs;
pub mod queue;
pub mod validation;
