//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::jobs::{JobId, JobOrchestrator};
use crate::types::AggregationPolicy;

/// API server size limit configuration.
///
/// Defaults to 100 MB for both limits, enough for TSV output of long scanned
/// documents.
///
/// # Configuration via Environment Variables
///
/// ```bash
/// export VRDU_MAX_REQUEST_BODY_BYTES=104857600     # 100 MB
/// export VRDU_MAX_MULTIPART_FIELD_BYTES=52428800   # 50 MB per uploaded file
/// ```
///
/// # Examples
///
/// ```
/// use vrdu::api::ApiSizeLimits;
///
/// let limits = ApiSizeLimits::default();
/// assert_eq!(limits.max_request_body_bytes, 100 * 1024 * 1024);
///
/// let small = ApiSizeLimits::from_mb(5, 5);
/// assert_eq!(small.max_multipart_field_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiSizeLimits {
    /// Maximum size of the entire request body in bytes.
    pub max_request_body_bytes: usize,

    /// Maximum size of a single multipart field in bytes.
    pub max_multipart_field_bytes: usize,
}

impl Default for ApiSizeLimits {
    fn default() -> Self {
        Self::from_mb(100, 100)
    }
}

impl ApiSizeLimits {
    pub fn new(max_request_body_bytes: usize, max_multipart_field_bytes: usize) -> Self {
        Self {
            max_request_body_bytes,
            max_multipart_field_bytes,
        }
    }

    pub fn from_mb(max_request_body_mb: usize, max_multipart_field_mb: usize) -> Self {
        Self {
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            max_multipart_field_bytes: max_multipart_field_mb * 1024 * 1024,
        }
    }
}

/// Response to `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub job_id: JobId,
    /// Relative URL to poll for the job's status.
    pub poll_url: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server information response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub version: String,
    /// Accepted `file` formats for `POST /process`
    pub input_formats: Vec<String>,
    /// Multi-page aggregation policy in effect
    pub aggregation: AggregationPolicy,
    /// Jobs known to this server since startup
    pub jobs: usize,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type name
    pub error_type: String,
    pub message: String,
    /// Stack trace (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    pub status_code: u16,
}

/// API server state.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Queue and store for all jobs submitted through this router
    pub orchestrator: Arc<JobOrchestrator>,
}
