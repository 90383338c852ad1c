//! Scan domain value objects

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity of a security finding, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding, no direct security impact
    Info,
    /// Low severity, minimal risk
    Low,
    /// Medium severity, moderate risk
    Medium,
    /// High severity, significant risk
    High,
    /// Critical severity, immediate action required
    Critical,
}

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ParseSeverityError {
                value: s.to_string(),
            }),
        }
    }
}

/// Error returned when a severity string is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("Unknown severity level '{value}' (expected one of: info, low, medium, high, critical)")]
pub struct ParseSeverityError {
    pub value: String,
}

/// Azure resource categories the scanner knows how to inspect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum ResourceKind {
    #[serde(rename = "Microsoft.Storage/storageAccounts")]
    StorageAccount,
    #[serde(rename = "Microsoft.Network/networkSecurityGroups")]
    NetworkSecurityGroup,
    #[serde(rename = "Microsoft.KeyVault/vaults")]
    KeyVault,
    #[serde(rename = "Microsoft.Compute/virtualMachines")]
    VirtualMachine,
    #[serde(rename = "Microsoft.Databricks/workspaces")]
    DatabricksWorkspace,
}

impl ResourceKind {
    /// All known kinds, in registry order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::StorageAccount,
        ResourceKind::NetworkSecurityGroup,
        ResourceKind::KeyVault,
        ResourceKind::VirtualMachine,
        ResourceKind::DatabricksWorkspace,
    ];

    /// The fully-qualified ARM resource type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StorageAccount => "Microsoft.Storage/storageAccounts",
            ResourceKind::NetworkSecurityGroup => "Microsoft.Network/networkSecurityGroups",
            ResourceKind::KeyVault => "Microsoft.KeyVault/vaults",
            ResourceKind::VirtualMachine => "Microsoft.Compute/virtualMachines",
            ResourceKind::DatabricksWorkspace => "Microsoft.Databricks/workspaces",
        }
    }

    /// Short alias accepted on the request surface.
    pub fn alias(&self) -> &'static str {
        match self {
            ResourceKind::StorageAccount => "storage",
            ResourceKind::NetworkSecurityGroup => "network",
            ResourceKind::KeyVault => "keyvault",
            ResourceKind::VirtualMachine => "compute",
            ResourceKind::DatabricksWorkspace => "databricks",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ParseResourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| s == kind.as_str() || s.eq_ignore_ascii_case(kind.alias()))
            .copied()
            .ok_or_else(|| ParseResourceKindError {
                value: s.to_string(),
            })
    }
}

/// Error returned when a resource-type identifier is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("Unknown resource type '{value}'")]
pub struct ParseResourceKindError {
    pub value: String,
}

/// Scan lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    /// Created, no checker dispatched yet
    Pending,
    /// At least one checker invocation has been scheduled
    Running,
    /// All invocations finished and aggregation succeeded
    Completed,
    /// Unrecoverable failure or client-requested cancellation
    Failed,
}

impl ScanState {
    /// Returns the set of valid target states from the current state.
    ///
    /// ```text
    /// Pending ──► Running ──► Completed
    ///   │           │
    ///   └───────────┴──► Failed
    /// ```
    pub fn valid_transitions(&self) -> &[ScanState] {
        match self {
            Self::Pending => &[Self::Running, Self::Failed],
            Self::Running => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `target` is allowed from the current state.
    pub fn can_transition_to(&self, target: ScanState) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Error returned when an invalid scan state transition is attempted.
#[derive(Debug, thiserror::Error)]
#[error("Invalid scan transition from {from} to {to}")]
pub struct ScanTransitionError {
    pub from: ScanState,
    pub to: ScanState,
}

/// Qualitative risk bands derived from the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band thresholds: critical [80,100], high [60,80), medium [40,60),
    /// low [20,40), minimal [0,20).
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => RiskLevel::Critical,
            60..=79 => RiskLevel::High,
            40..=59 => RiskLevel::Medium,
            20..=39 => RiskLevel::Low,
            _ => RiskLevel::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "Minimal",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
