//! Route definitions and router assembly

use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::presentation::controllers::{
    cleanup_reports, delete_scan, download_report, download_scan_report, get_scan_result,
    get_scan_status, health_check, list_reports, list_scans, list_subscriptions, resource_types,
    severity_levels, start_scan, AppState,
};
use crate::presentation::models::*;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::start_scan,
        crate::presentation::controllers::get_scan_status,
        crate::presentation::controllers::get_scan_result,
        crate::presentation::controllers::download_scan_report,
        crate::presentation::controllers::list_scans,
        crate::presentation::controllers::delete_scan,
        crate::presentation::controllers::list_subscriptions,
        crate::presentation::controllers::list_reports,
        crate::presentation::controllers::download_report,
        crate::presentation::controllers::cleanup_reports,
        crate::presentation::controllers::health_check,
        crate::presentation::controllers::resource_types,
        crate::presentation::controllers::severity_levels,
    ),
    components(
        schemas(
            ScanStartRequest,
            ScanStartResponse,
            MessageResponse,
            CleanupResponse,
            HealthResponse,
            ErrorResponse,
            crate::domain::scan::ScanStatus,
            crate::domain::scan::ScanResult,
            crate::domain::scan::Finding,
            crate::domain::scan::Severity,
            crate::domain::scan::ScanState,
            crate::domain::scan::ResourceKind,
            crate::domain::resources::Subscription,
            crate::domain::resources::SubscriptionState,
            crate::infrastructure::report_store::ReportEntry,
            crate::infrastructure::report_store::ReportStatistics,
            crate::presentation::controllers::ReportListResponse,
        )
    ),
    tags(
        (name = "scans", description = "Scan orchestration"),
        (name = "subscriptions", description = "Subscription enumeration"),
        (name = "reports", description = "Persisted report artifacts"),
        (name = "system", description = "Service metadata")
    ),
    info(
        title = "CloudPosture API",
        description = "Azure security posture scanner API for detecting misconfigurations"
    )
)]
pub struct ApiDoc;

/// Build the application router.
pub fn create_router(state: AppState, enable_docs: bool, request_timeout: Duration) -> Router {
    let mut router = Router::new()
        .route("/scan/start", post(start_scan))
        .route("/scan/{id}/status", get(get_scan_status))
        .route("/scan/{id}/result", get(get_scan_result))
        .route("/scan/{id}/report", get(download_scan_report))
        .route("/scan/{id}", delete(delete_scan))
        .route("/scans", get(list_scans))
        .route("/subscriptions", get(list_subscriptions))
        .route("/reports", get(list_reports))
        .route("/reports/cleanup", delete(cleanup_reports))
        .route("/reports/{filename}", get(download_report))
        .route("/health", get(health_check))
        .route("/resource-types", get(resource_types))
        .route("/severity-levels", get(severity_levels));

    if enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}
