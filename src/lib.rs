//! CloudPosture - Azure cloud security posture scanner
//!
//! This crate scans Azure subscriptions for common misconfigurations across
//! several resource categories and produces a risk-ranked report.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── domain/           # Pure domain model
//! │   ├── resources     # Subscription and resource configuration snapshots
//! │   └── scan/         # Findings, scan lifecycle, checker traits
//! ├── application/      # Use cases
//! │   ├── orchestrator  # Scan state machine and concurrent fan-out
//! │   ├── risk          # Risk scoring engine
//! │   └── reporting/    # Report rendering (json, html, summary)
//! ├── infrastructure/   # External integrations
//! │   ├── azure/        # ARM REST client (resource fetch capability)
//! │   ├── checkers/     # Per-resource-type rule tables
//! │   ├── scan_store    # Scan state storage
//! │   └── report_store  # Persisted report files
//! ├── presentation/     # HTTP layer (axum controllers, routes, DTOs)
//! └── config/           # Configuration management
//! ```
//!
//! # Usage
//!
//! The scanner is typically started via the main binary:
//!
//! ```bash
//! CLOUDPOSTURE__AZURE__ACCESS_TOKEN=... cargo run
//! ```
//!
//! Environment variables use the `CLOUDPOSTURE__` prefix with double
//! underscore separators:
//!
//! ```bash
//! CLOUDPOSTURE__SERVER__PORT=8000
//! CLOUDPOSTURE__SCANNER__MAX_CONCURRENT_CHECKS=20
//! ```

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use app::{create_app, AppHandle};
pub use config::Config;
pub use logging::init_tracing;
