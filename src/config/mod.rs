use serde::Deserialize;

use crate::models::filter::{FilterRegistry, UnknownFilterName};
use crate::services::job_store::DEFAULT_KEY_PREFIX;
use crate::services::queue::DEFAULT_QUEUE_KEY;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8081").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Redis connection string shared by the status store and the queue
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Redis list the workers consume from
    #[serde(default = "default_queue_key")]
    pub queue_key: String,

    /// Prefix for status record keys; the job ID is appended
    #[serde(default = "default_job_key_prefix")]
    pub job_key_prefix: String,

    /// Maximum accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Comma-separated filters that are known but currently rejected
    #[serde(default = "default_disabled_filters")]
    pub disabled_filters: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_queue_key() -> String {
    DEFAULT_QUEUE_KEY.to_string()
}

fn default_job_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_disabled_filters() -> Vec<String> {
    vec!["sepia".to_string()]
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn filter_registry(&self) -> Result<FilterRegistry, UnknownFilterName> {
        FilterRegistry::with_disabled(self.disabled_filters.as_slice())
    }
}
