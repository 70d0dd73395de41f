use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::job::{JobCreatedResponse, JobRecord};

/// POST /jobs — upload a PNG (`image` part) with a `filter` field.
pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<JobCreatedResponse>), ApiError> {
    let mut multipart = multipart?;

    let mut image: Option<Vec<u8>> = None;
    let mut filter: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let data = field.bytes().await?;
                image = Some(data.to_vec());
            }
            Some("filter") => {
                let text = field.text().await?;
                filter = Some(text);
            }
            _ => {}
        }
    }

    let id = state.jobs.submit(image, filter.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(JobCreatedResponse { id })))
}

/// GET /jobs/{id} — current status record for a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    // Anything that is not a UUID was never issued by us.
    let job_id = Uuid::parse_str(&id).map_err(|_| ApiError::UnknownJobId(id))?;
    let record = state.jobs.status(&job_id).await?;
    Ok(Json(record))
}
