//! API controllers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::application::errors::ScanError;
use crate::application::orchestrator::ScanOrchestrator;
use crate::application::reporting::{ReportError, ReportFormat, ReportGenerator};
use crate::domain::resources::Subscription;
use crate::domain::scan::{ProviderError, ResourceProvider, ScanResult, ScanStatus, Severity};
use crate::infrastructure::registry::CheckerRegistry;
use crate::infrastructure::report_store::{
    FileReportStore, ReportEntry, ReportStatistics, ReportStoreError,
};
use crate::presentation::models::{
    CleanupResponse, ErrorResponse, HealthResponse, MessageResponse, ScanStartRequest,
    ScanStartResponse,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
    pub provider: Arc<dyn ResourceProvider>,
    pub registry: Arc<CheckerRegistry>,
    pub report_generator: Arc<ReportGenerator>,
    pub report_store: Arc<FileReportStore>,
    pub default_severity_threshold: Severity,
    pub report_retention_days: u32,
}

/// Error wrapper mapping domain errors onto HTTP responses.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            status_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let status = match &err {
            ScanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ScanError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            ScanError::NotFound(_) => StatusCode::NOT_FOUND,
            // The result of a scan that has not completed is not findable yet
            ScanError::NotCompleted { .. } => StatusCode::NOT_FOUND,
            ScanError::Internal(message) => {
                error!(error = %message, "Internal scan error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = match &err {
            ReportError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ReportError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<ReportStoreError> for ApiError {
    fn from(err: ReportStoreError) -> Self {
        let status = match &err {
            ReportStoreError::NotFound(_) => StatusCode::NOT_FOUND,
            ReportStoreError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            ReportStoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        let status = match &err {
            ProviderError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

/// POST /scan/start - Start a new security scan
#[utoipa::path(
    post,
    path = "/scan/start",
    request_body = ScanStartRequest,
    responses(
        (status = 200, description = "Scan started", body = ScanStartResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn start_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanStartRequest>,
) -> Result<Json<ScanStartResponse>, ApiError> {
    let request = request.into_domain(state.default_severity_threshold)?;
    let scan_id = state.orchestrator.start_scan(request).await?;

    Ok(Json(ScanStartResponse {
        scan_id,
        status: "pending".to_string(),
        message: "Scan started successfully".to_string(),
    }))
}

/// GET /scan/{id}/status - Poll scan progress
#[utoipa::path(
    get,
    path = "/scan/{id}/status",
    params(("id" = Uuid, Path, description = "Scan ID")),
    responses(
        (status = 200, description = "Scan status", body = ScanStatus),
        (status = 404, description = "Scan not found", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn get_scan_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScanStatus>, ApiError> {
    Ok(Json(state.orchestrator.get_status(id).await?))
}

/// GET /scan/{id}/result - Retrieve a completed scan result
#[utoipa::path(
    get,
    path = "/scan/{id}/result",
    params(("id" = Uuid, Path, description = "Scan ID")),
    responses(
        (status = 200, description = "Scan result", body = ScanResult),
        (status = 404, description = "Scan unknown or not completed", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn get_scan_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScanResult>, ApiError> {
    Ok(Json(state.orchestrator.get_result(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

/// GET /scan/{id}/report - Render a completed scan into an artifact
#[utoipa::path(
    get,
    path = "/scan/{id}/report",
    params(
        ("id" = Uuid, Path, description = "Scan ID"),
        ("format" = Option<String>, Query, description = "json, html, or summary (default json)")
    ),
    responses(
        (status = 200, description = "Report artifact bytes"),
        (status = 400, description = "Unsupported format", body = ErrorResponse),
        (status = 404, description = "Scan unknown or not completed", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn download_scan_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let format: ReportFormat = query.format.as_deref().unwrap_or("json").parse()?;
    let result = state.orchestrator.get_result(id).await?;
    let artifact = state.report_generator.render(&result, format)?;

    let filename = ReportGenerator::filename(id, format);
    // Persistence is best-effort; the response carries the artifact either way
    if let Err(err) = state.report_store.save(&filename, &artifact).await {
        tracing::warn!(scan_id = %id, error = %err, "Failed to persist rendered report");
    }

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        artifact,
    )
        .into_response())
}

/// GET /scans - List all known scans
#[utoipa::path(
    get,
    path = "/scans",
    responses((status = 200, description = "All known scans", body = [ScanStatus])),
    tag = "scans"
)]
pub async fn list_scans(State(state): State<AppState>) -> Result<Json<Vec<ScanStatus>>, ApiError> {
    Ok(Json(state.orchestrator.list_scans().await?))
}

/// DELETE /scan/{id} - Cancel a running scan or remove a finished one
#[utoipa::path(
    delete,
    path = "/scan/{id}",
    params(("id" = Uuid, Path, description = "Scan ID")),
    responses(
        (status = 200, description = "Scan deleted", body = MessageResponse),
        (status = 404, description = "Scan not found", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn delete_scan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.delete_scan(id).await?;
    Ok(Json(MessageResponse {
        message: "Scan deleted successfully".to_string(),
    }))
}

/// GET /subscriptions - List accessible subscriptions
#[utoipa::path(
    get,
    path = "/subscriptions",
    responses(
        (status = 200, description = "Accessible subscriptions", body = [Subscription]),
        (status = 401, description = "Credentials rejected", body = ErrorResponse)
    ),
    tag = "subscriptions"
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    Ok(Json(state.provider.list_subscriptions().await?))
}

/// GET /reports - List persisted reports with statistics
#[utoipa::path(
    get,
    path = "/reports",
    responses((status = 200, description = "Persisted reports", body = ReportListResponse)),
    tag = "reports"
)]
pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<ReportListResponse>, ApiError> {
    let reports = state.report_store.list().await?;
    let statistics = state.report_store.statistics().await?;
    Ok(Json(ReportListResponse {
        reports,
        statistics,
    }))
}

/// Report listing response
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<ReportEntry>,
    pub statistics: ReportStatistics,
}

/// GET /reports/{filename} - Download a persisted report
#[utoipa::path(
    get,
    path = "/reports/{filename}",
    params(("filename" = String, Path, description = "Report filename")),
    responses(
        (status = 200, description = "Report artifact bytes"),
        (status = 404, description = "Report not found", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn download_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.report_store.open_report(&filename).await?;
    let content_type = if filename.ends_with(".html") {
        "text/html; charset=utf-8"
    } else {
        "application/json"
    };
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days_to_keep: Option<u32>,
}

/// DELETE /reports/cleanup - Remove reports past the retention window
#[utoipa::path(
    delete,
    path = "/reports/cleanup",
    params(("days_to_keep" = Option<u32>, Query, description = "Retention window in days")),
    responses((status = 200, description = "Cleanup summary", body = CleanupResponse)),
    tag = "reports"
)]
pub async fn cleanup_reports(
    State(state): State<AppState>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let days = query.days_to_keep.unwrap_or(state.report_retention_days);
    let deleted_count = state.report_store.cleanup_older_than(days).await?;
    Ok(Json(CleanupResponse {
        message: format!("Cleaned up {} old reports", deleted_count),
        deleted_count,
    }))
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = HealthResponse)),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /resource-types - Supported resource types
#[utoipa::path(
    get,
    path = "/resource-types",
    responses((status = 200, description = "Supported resource types", body = [String])),
    tag = "system"
)]
pub async fn resource_types(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .registry
            .registered_kinds()
            .iter()
            .map(|kind| kind.as_str().to_string())
            .collect(),
    )
}

/// GET /severity-levels - Known severity levels
#[utoipa::path(
    get,
    path = "/severity-levels",
    responses((status = 200, description = "Severity levels", body = [String])),
    tag = "system"
)]
pub async fn severity_levels() -> Json<Vec<String>> {
    Json(
        Severity::ALL
            .iter()
            .map(|severity| severity.as_str().to_string())
            .collect(),
    )
}
