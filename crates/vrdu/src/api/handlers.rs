//! API request handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use crate::VrduError;
use crate::fields::parse_field_list;
use crate::geometry::Document;
use crate::jobs::{Job, JobId};

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse, InfoResponse, ProcessResponse},
};

const INPUT_FORMATS: &[&str] = &["tesseract_tsv", "json"];

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    text: String,
}

impl Upload {
    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("application/json"))
            || self
                .file_name
                .as_deref()
                .is_some_and(|name| name.to_ascii_lowercase().ends_with(".json"))
    }

    fn into_document(self) -> crate::Result<Document> {
        let document = if self.is_json() {
            Document::from_json(&self.text)?
        } else {
            Document::from_tsv(&self.text)?
        };

        Ok(match self.file_name {
            Some(name) => document.with_name(name),
            None => document,
        })
    }
}

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::validation(VrduError::validation(e.to_string()))
}

/// Submit endpoint handler.
///
/// POST /process
///
/// Accepts multipart form data with:
/// - `file`: Tesseract TSV output, or JSON `{"pages": [[word, ...], ...]}`
///   (detected from the part's content type or a `.json` file name)
/// - `fields`: comma-separated field names
/// - `table_fields` (optional): comma-separated names to reconstruct as tables
///
/// Returns `202 Accepted` with the job id as soon as the job is queued.
/// A missing file, an unreadable document or a bad field list is a `400`.
pub async fn process_handler(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProcessResponse>), ApiError> {
    let mut upload = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let text = field.text().await.map_err(multipart_error)?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    text,
                });
            }
            "fields" => {
                let list = field.text().await.map_err(multipart_error)?;
                fields.extend(parse_field_list(&list));
            }
            "table_fields" => {
                let list = field.text().await.map_err(multipart_error)?;
                if !list.trim().is_empty() {
                    fields.extend(parse_field_list(&list).into_iter().map(|request| request.as_table()));
                }
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::validation(VrduError::validation("No file provided")))?;
    let document = upload.into_document()?;

    let job_id = state.orchestrator.submit(document, fields)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ProcessResponse {
            job_id,
            poll_url: format!("/results/{}", job_id),
        }),
    ))
}

/// Job status endpoint handler.
///
/// GET /results/{job_id}
///
/// Ids that are malformed or unknown are both a `404`.
pub async fn results_handler(State(state): State<ApiState>, Path(job_id): Path<String>) -> Result<Json<Job>, ApiError> {
    job_id
        .parse::<JobId>()
        .ok()
        .and_then(|id| state.orchestrator.get_status(&id))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job {} not found", job_id)))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Server info endpoint handler.
///
/// GET /info
pub async fn info_handler(State(state): State<ApiState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        input_formats: INPUT_FORMATS.iter().map(|format| format.to_string()).collect(),
        aggregation: state.orchestrator.config().jobs.aggregation,
        jobs: state.orchestrator.job_count(),
    })
}
