//! Application setup and wiring

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::application::orchestrator::{ReportSink, ScanOrchestrator};
use crate::application::reporting::ReportGenerator;
use crate::config::Config;
use crate::infrastructure::azure::ArmResourceClient;
use crate::infrastructure::checkers::{
    ComputeChecker, KeyVaultChecker, NetworkChecker, StorageChecker, WorkspaceChecker,
};
use crate::infrastructure::registry::CheckerRegistry;
use crate::infrastructure::report_store::FileReportStore;
use crate::infrastructure::scan_store::InMemoryScanStore;
use crate::presentation::controllers::AppState;
use crate::presentation::routes::create_router;

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Construct the application router with all dependencies wired.
pub async fn create_app(config: Config) -> Result<AppHandle, Box<dyn std::error::Error>> {
    let provider = Arc::new(ArmResourceClient::new(&config.azure)?);

    let mut registry = CheckerRegistry::new();
    registry.register(Arc::new(StorageChecker));
    registry.register(Arc::new(NetworkChecker));
    registry.register(Arc::new(KeyVaultChecker));
    registry.register(Arc::new(ComputeChecker));
    registry.register(Arc::new(WorkspaceChecker));
    let registry = Arc::new(registry);

    let scan_store = Arc::new(InMemoryScanStore::new());
    let report_generator = Arc::new(ReportGenerator::new());
    let report_store = Arc::new(FileReportStore::open(config.reports.output_dir.clone()).await?);

    let orchestrator = Arc::new(
        ScanOrchestrator::new(
            scan_store,
            provider.clone(),
            registry.clone(),
            config.scanner.max_concurrent_checks,
        )
        .with_report_sink(ReportSink {
            generator: report_generator.clone(),
            store: report_store.clone(),
        }),
    );

    let state = AppState {
        orchestrator,
        provider,
        registry,
        report_generator,
        report_store,
        default_severity_threshold: config.scanner.default_severity_threshold,
        report_retention_days: config.reports.retention_days,
    };

    let router = create_router(
        state,
        config.server.enable_docs,
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    Ok(AppHandle {
        router,
        shutdown_token: CancellationToken::new(),
    })
}
