//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::jobs::JobOrchestrator;
use crate::{Result, VrduConfig, VrduError};

use super::{
    handlers::{health_handler, info_handler, process_handler, results_handler},
    types::{ApiSizeLimits, ApiState},
};

const REQUEST_BODY_ENV: &str = "VRDU_MAX_REQUEST_BODY_BYTES";
const MULTIPART_FIELD_ENV: &str = "VRDU_MAX_MULTIPART_FIELD_BYTES";
const CORS_ORIGINS_ENV: &str = "VRDU_CORS_ORIGINS";

/// Parse size limits from environment variables.
///
/// - `VRDU_MAX_REQUEST_BODY_BYTES`: maximum total request body size
/// - `VRDU_MAX_MULTIPART_FIELD_BYTES`: maximum single multipart field size,
///   defaults to the request body limit when unset
///
/// Missing, zero or unparsable values fall back to 100 MB.
fn parse_size_limits_from_env() -> ApiSizeLimits {
    if let Ok(value) = std::env::var(REQUEST_BODY_ENV) {
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => {
                let multipart_bytes = std::env::var(MULTIPART_FIELD_ENV)
                    .ok()
                    .and_then(|v| v.parse::<usize>().ok())
                    .filter(|&v| v > 0)
                    .unwrap_or(bytes);

                tracing::info!(
                    "Upload size limits configured from environment: request_body={} bytes ({:.1} MB), multipart_field={} bytes ({:.1} MB)",
                    bytes,
                    bytes as f64 / (1024.0 * 1024.0),
                    multipart_bytes,
                    multipart_bytes as f64 / (1024.0 * 1024.0)
                );

                return ApiSizeLimits::new(bytes, multipart_bytes);
            }
            Ok(_) => tracing::warn!("Invalid {} value (must be > 0)", REQUEST_BODY_ENV),
            Err(_) => tracing::warn!("Failed to parse {}='{}', must be a valid usize", REQUEST_BODY_ENV, value),
        }
    }

    let limits = ApiSizeLimits::default();
    tracing::info!(
        "Upload size limit: 100 MB (default, {} bytes) - Configure with {}",
        limits.max_request_body_bytes,
        REQUEST_BODY_ENV
    );
    limits
}

fn cors_layer_from_env() -> CorsLayer {
    let permissive = || CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let Ok(origins_str) = std::env::var(CORS_ORIGINS_ENV) else {
        tracing::warn!(
            "CORS configured to allow all origins (default). Set {} to a comma-separated list of origins for production",
            CORS_ORIGINS_ENV
        );
        return permissive();
    };

    let origins: Vec<_> = origins_str
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("{} set but empty/invalid - falling back to permissive CORS", CORS_ORIGINS_ENV);
        return permissive();
    }

    tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router around a running orchestrator.
///
/// Public so the router can be nested inside another application.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vrdu::{JobOrchestrator, VrduConfig, api::create_router};
///
/// # #[tokio::main]
/// # async fn main() -> vrdu::Result<()> {
/// let orchestrator = Arc::new(JobOrchestrator::start(VrduConfig::default())?);
/// let router = create_router(orchestrator);
/// # Ok(())
/// # }
/// ```
pub fn create_router(orchestrator: Arc<JobOrchestrator>) -> Router {
    create_router_with_limits(orchestrator, ApiSizeLimits::default())
}

/// Create the API router with custom size limits.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use vrdu::{JobOrchestrator, VrduConfig, api::{ApiSizeLimits, create_router_with_limits}};
///
/// # #[tokio::main]
/// # async fn main() -> vrdu::Result<()> {
/// let orchestrator = Arc::new(JobOrchestrator::start(VrduConfig::default())?);
/// let router = create_router_with_limits(orchestrator, ApiSizeLimits::from_mb(10, 10));
/// # Ok(())
/// # }
/// ```
pub fn create_router_with_limits(orchestrator: Arc<JobOrchestrator>, limits: ApiSizeLimits) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/process", post(process_handler))
        .route("/results/{job_id}", get(results_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .layer(DefaultBodyLimit::max(limits.max_multipart_field_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_request_body_bytes))
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server with config file discovery.
///
/// Searches for `vrdu.toml` in the current and parent directories and falls
/// back to defaults. Size limits come from the environment.
///
/// # Environment Variables
///
/// ```bash
/// export VRDU_CORS_ORIGINS="https://app.example.com"
/// export VRDU_MAX_REQUEST_BODY_BYTES=104857600
/// export VRDU_MAX_MULTIPART_FIELD_BYTES=104857600
/// ```
pub async fn serve(host: impl AsRef<str>, port: u16) -> Result<()> {
    let config = match VrduConfig::discover()? {
        Some(config) => {
            tracing::info!("Loaded configuration from discovered file");
            config
        }
        None => {
            tracing::info!("No config file found, using default configuration");
            VrduConfig::default()
        }
    };

    let limits = parse_size_limits_from_env();

    serve_with_config_and_limits(host, port, config, limits).await
}

/// Start the API server with explicit config and default size limits.
pub async fn serve_with_config(host: impl AsRef<str>, port: u16, config: VrduConfig) -> Result<()> {
    serve_with_config_and_limits(host, port, config, ApiSizeLimits::default()).await
}

/// Start the API server with explicit config and size limits.
///
/// Starts the job orchestrator, binds the listener and serves until the
/// process exits. The worker is shut down if the server stops.
///
/// # Examples
///
/// ```no_run
/// use vrdu::{VrduConfig, api::{ApiSizeLimits, serve_with_config_and_limits}};
///
/// #[tokio::main]
/// async fn main() -> vrdu::Result<()> {
///     let config = VrduConfig::from_toml_file("vrdu.toml")?;
///     serve_with_config_and_limits("127.0.0.1", 8000, config, ApiSizeLimits::from_mb(20, 20)).await
/// }
/// ```
pub async fn serve_with_config_and_limits(
    host: impl AsRef<str>,
    port: u16,
    config: VrduConfig,
    limits: ApiSizeLimits,
) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| VrduError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    let orchestrator = Arc::new(JobOrchestrator::start(config)?);
    let app = create_router_with_limits(Arc::clone(&orchestrator), limits);

    tracing::info!("Starting VRDU API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(VrduError::Io)?;

    let served = axum::serve(listener, app)
        .await
        .map_err(|e| VrduError::Other(e.to_string()));

    orchestrator.shutdown().await;
    served
}

/// Start the API server on `127.0.0.1:8000` with config file discovery.
pub async fn serve_default() -> Result<()> {
    serve("127.0.0.1", 8000).await
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    fn clear_limit_env() {
        unsafe {
            std::env::remove_var(REQUEST_BODY_ENV);
            std::env::remove_var(MULTIPART_FIELD_ENV);
        }
    }

    #[tokio::test]
    async fn test_create_router() {
        let orchestrator = Arc::new(JobOrchestrator::start(VrduConfig::default()).unwrap());
        let _router = create_router(Arc::clone(&orchestrator));
        orchestrator.shutdown().await;
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_size_limits_default_100mb() {
        clear_limit_env();

        let limits = parse_size_limits_from_env();
        assert_eq!(limits.max_request_body_bytes, 100 * 1024 * 1024);
        assert_eq!(limits.max_multipart_field_bytes, 100 * 1024 * 1024);
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_size_limits_from_env_vars() {
        unsafe {
            std::env::set_var(REQUEST_BODY_ENV, "20971520");
            std::env::set_var(MULTIPART_FIELD_ENV, "10485760");
        }

        let limits = parse_size_limits_from_env();
        assert_eq!(limits.max_request_body_bytes, 20 * 1024 * 1024);
        assert_eq!(limits.max_multipart_field_bytes, 10 * 1024 * 1024);

        clear_limit_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_size_limits_multipart_follows_body() {
        clear_limit_env();
        unsafe {
            std::env::set_var(REQUEST_BODY_ENV, "1048576");
        }

        let limits = parse_size_limits_from_env();
        assert_eq!(limits.max_request_body_bytes, 1024 * 1024);
        assert_eq!(limits.max_multipart_field_bytes, 1024 * 1024);

        clear_limit_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_parse_size_limits_invalid_values() {
        clear_limit_env();
        unsafe {
            std::env::set_var(REQUEST_BODY_ENV, "not a number");
        }
        assert_eq!(parse_size_limits_from_env().max_request_body_bytes, 100 * 1024 * 1024);

        unsafe {
            std::env::set_var(REQUEST_BODY_ENV, "0");
        }
        assert_eq!(parse_size_limits_from_env().max_request_body_bytes, 100 * 1024 * 1024);

        clear_limit_env();
    }

    #[tokio::test]
    async fn test_serve_rejects_bad_host() {
        let result = serve_with_config("not-an-ip", 0, VrduConfig::default()).await;
        assert!(matches!(result, Err(VrduError::Validation { .. })));
    }
}
