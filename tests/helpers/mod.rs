//! Test helper utilities for driving the router over real HTTP

use std::sync::Arc;

use reqwest::multipart;
use serde::Deserialize;

use filter_intake::app_state::AppState;
use filter_intake::models::codec;
use filter_intake::models::filter::FilterRegistry;
use filter_intake::models::job::WorkItem;
use filter_intake::routes;
use filter_intake::services::job_store::InMemoryJobStore;
use filter_intake::services::jobs::JobService;
use filter_intake::services::queue::InMemoryWorkQueue;

/// Error body returned for every non-2xx response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
    pub retryable: bool,
}

/// A running server plus handles on its in-memory backends.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryJobStore>,
    pub queue: Arc<InMemoryWorkQueue>,
}

/// Bind the router on an ephemeral port backed by in-memory doubles.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(FilterRegistry::default(), 10 * 1024 * 1024).await
}

pub async fn spawn_app_with(filters: FilterRegistry, max_upload_bytes: usize) -> TestApp {
    let store = Arc::new(InMemoryJobStore::default());
    let queue = Arc::new(InMemoryWorkQueue::default());
    let state = AppState::new(JobService::new(store.clone(), queue.clone(), filters));
    let app = routes::router(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        store,
        queue,
    }
}

impl TestApp {
    /// POST /jobs with optional `image` and `filter` parts.
    pub async fn submit(&self, image: Option<&[u8]>, filter: Option<&str>) -> reqwest::Response {
        let mut form = multipart::Form::new();
        if let Some(bytes) = image {
            form = form.part(
                "image",
                multipart::Part::bytes(bytes.to_vec())
                    .file_name("upload.png")
                    .mime_str("image/png")
                    .expect("valid mime"),
            );
        }
        if let Some(f) = filter {
            form = form.text("filter", f.to_string());
        }

        self.client
            .post(format!("{}/jobs", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Submit request failed")
    }

    pub async fn status(&self, id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/jobs/{}", self.base_url, id))
            .send()
            .await
            .expect("Status request failed")
    }

    /// Decode every queue entry, head first.
    pub fn queued_items(&self) -> Vec<WorkItem> {
        self.queue
            .entries()
            .iter()
            .map(|raw| codec::decode(raw).expect("queue entry is not a work item"))
            .collect()
    }
}
