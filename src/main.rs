use std::sync::Arc;

use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use redis::aio::ConnectionManager;
use tracing_subscriber::EnvFilter;

use filter_intake::app_state::AppState;
use filter_intake::config::AppConfig;
use filter_intake::routes;
use filter_intake::services::job_store::{JobStore, RedisJobStore};
use filter_intake::services::jobs::JobService;
use filter_intake::services::queue::{RedisWorkQueue, WorkQueue};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");
    let filters = config
        .filter_registry()
        .expect("Invalid DISABLED_FILTERS configuration");

    tracing::info!(
        enabled_filters = ?filters.enabled().collect::<Vec<_>>(),
        "Initializing filter-intake server"
    );

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "filter_jobs_submitted_total",
        "Jobs accepted and handed to the queue"
    );
    metrics::describe_counter!(
        "filter_jobs_rejected_total",
        "Submissions rejected by validation"
    );
    metrics::describe_counter!(
        "filter_jobs_failed_total",
        "Submissions that failed on the status store or the queue"
    );
    metrics::describe_histogram!(
        "filter_job_submission_seconds",
        "Time from validation to queue append for accepted jobs"
    );
    metrics::describe_gauge!(
        "filter_jobs_queue_depth",
        "Items waiting in the work queue at the last health check"
    );

    // Status store and work queue share one Redis deployment
    tracing::info!(redis_url = %config.redis_url, "Connecting to Redis");
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("Invalid Redis connection string");
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .expect("Could not connect to Redis");

    let store = Arc::new(RedisJobStore::new(
        redis_conn.clone(),
        config.job_key_prefix.clone(),
    ));
    let queue = Arc::new(RedisWorkQueue::new(redis_conn, config.queue_key.clone()));

    store
        .health_check()
        .await
        .expect("Could not reach Redis for the status store");
    queue
        .health_check()
        .await
        .expect("Could not reach Redis for the work queue");
    tracing::info!(queue_key = %config.queue_key, "Connected to Redis");

    let state = AppState::new(JobService::new(store, queue, filters));

    let app = routes::router(state, config.max_upload_bytes).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
