//! REST API server for asynchronous field extraction.
//!
//! Documents are submitted as jobs and polled for results; extraction never
//! runs on the request path.
//!
//! # Endpoints
//!
//! - `POST /process` - Submit a document and a field list (multipart form data)
//! - `GET /results/{job_id}` - Job status, and the result once completed
//! - `GET /health` - Health check endpoint
//! - `GET /info` - Server information
//!
//! # Examples
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use vrdu::{JobOrchestrator, VrduConfig, api::create_router};
//!
//! #[tokio::main]
//! async fn main() -> vrdu::Result<()> {
//!     let orchestrator = Arc::new(JobOrchestrator::start(VrduConfig::default())?);
//!     let app = Router::new().nest("/vrdu", create_router(orchestrator));
//!     Ok(())
//! }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Submit Tesseract TSV output
//! curl -F "file=@invoice.tsv" -F "fields=Invoice Number,Date,Total" \
//!      -F "table_fields=Items" http://localhost:8000/process
//!
//! # Poll for the result
//! curl http://localhost:8000/results/4f9c1e2a-8d0b-4c55-9a63-2f1b0d7e6a11
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{
    create_router, create_router_with_limits, serve, serve_default, serve_with_config, serve_with_config_and_limits,
};
pub use types::{ApiSizeLimits, ApiState, ErrorResponse, HealthResponse, InfoResponse, ProcessResponse};
