//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::errors::ScanError;
use crate::domain::scan::{ResourceKind, ScanRequest, Severity};

/// Request model for starting a scan
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ScanStartRequest {
    /// Specific subscription to scan; absent scans all accessible
    /// subscriptions
    #[schema(example = "4cb3f0ae-cf46-4a14-b7a9-7a3dc8e9d1f2")]
    pub subscription_id: Option<String>,

    /// Resource types to scan; absent selects all registered checkers.
    /// Accepts full ARM types or short aliases (`storage`, `network`,
    /// `keyvault`, `compute`, `databricks`).
    pub resource_types: Option<Vec<String>>,

    /// Minimum severity included in the result
    #[schema(example = "low")]
    pub severity_threshold: Option<String>,
}

impl ScanStartRequest {
    /// Validate and convert into the domain request.
    pub fn into_domain(self, default_threshold: Severity) -> Result<ScanRequest, ScanError> {
        let resource_types = match self.resource_types {
            Some(raw) => {
                let mut kinds = Vec::with_capacity(raw.len());
                for value in raw {
                    let kind: ResourceKind = value
                        .parse()
                        .map_err(|e: crate::domain::scan::ParseResourceKindError| {
                            ScanError::InvalidRequest(e.to_string())
                        })?;
                    kinds.push(kind);
                }
                Some(kinds)
            }
            None => None,
        };

        let severity_threshold = match self.severity_threshold {
            Some(raw) => raw
                .parse()
                .map_err(|e: crate::domain::scan::ParseSeverityError| {
                    ScanError::InvalidRequest(e.to_string())
                })?,
            None => default_threshold,
        };

        Ok(ScanRequest {
            subscription_id: self.subscription_id,
            resource_types,
            severity_threshold,
        })
    }
}

/// Response model for scan creation
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanStartResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub scan_id: Uuid,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "Scan started successfully")]
    pub message: String,
}

/// Generic confirmation message
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Response model for report cleanup
#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    pub message: String,
    pub deleted_count: usize,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "1.0.0")]
    pub version: String,
}

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Scan not found: 550e8400-e29b-41d4-a716-446655440000")]
    pub error: String,
    #[schema(example = 404)]
    pub status_code: u16,
}
