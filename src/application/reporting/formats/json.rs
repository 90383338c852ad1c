//! Structured JSON report rendering

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::reporting::ReportError;
use crate::application::risk::RiskEngine;
use crate::domain::scan::{Finding, ResourceKind, ScanResult, Severity};

#[derive(Serialize)]
struct JsonReport<'a> {
    report_metadata: ReportMetadata<'a>,
    executive_summary: ExecutiveSummary<'a>,
    risk_analysis: RiskAnalysis<'a>,
    findings: Vec<ReportFinding<'a>>,
}

#[derive(Serialize)]
struct ReportMetadata<'a> {
    report_type: &'static str,
    scanner_version: &'static str,
    subscription_id: &'a str,
    subscription_name: Option<&'a str>,
    scan_timestamp: DateTime<Utc>,
    scan_duration_seconds: f64,
}

#[derive(Serialize)]
struct ExecutiveSummary<'a> {
    overall_risk_score: u8,
    risk_level: &'static str,
    total_resources_scanned: usize,
    total_findings: usize,
    findings_by_severity: &'a BTreeMap<Severity, usize>,
    critical_findings_count: usize,
    high_findings_count: usize,
}

#[derive(Serialize)]
struct RiskAnalysis<'a> {
    top_risks: Vec<TopRisk<'a>>,
    recommendations: Vec<String>,
}

#[derive(Serialize)]
struct TopRisk<'a> {
    title: &'a str,
    severity: Severity,
    risk_score: u8,
    resource_name: &'a str,
    resource_type: ResourceKind,
}

#[derive(Serialize)]
struct ReportFinding<'a> {
    id: uuid::Uuid,
    resource: ResourceRef<'a>,
    security_issue: SecurityIssue<'a>,
    metadata: &'a BTreeMap<String, serde_json::Value>,
    detected_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ResourceRef<'a> {
    id: &'a str,
    name: &'a str,
    r#type: ResourceKind,
    group: &'a str,
    location: &'a str,
}

#[derive(Serialize)]
struct SecurityIssue<'a> {
    title: &'a str,
    description: &'a str,
    severity: Severity,
    risk_score: u8,
    recommendation: &'a str,
}

/// Render the full structured report.
pub fn render_report(result: &ScanResult) -> Result<Vec<u8>, ReportError> {
    let engine = RiskEngine::new();
    let prioritized = engine.prioritize(&result.findings);

    let report = JsonReport {
        report_metadata: ReportMetadata {
            report_type: "Security Posture Assessment",
            scanner_version: env!("CARGO_PKG_VERSION"),
            subscription_id: &result.subscription_id,
            subscription_name: result.subscription_name.as_deref(),
            scan_timestamp: result.scan_timestamp,
            scan_duration_seconds: result.scan_duration_seconds,
        },
        executive_summary: ExecutiveSummary {
            overall_risk_score: result.risk_score,
            risk_level: RiskEngine::risk_level(result.risk_score).as_str(),
            total_resources_scanned: result.total_resources_scanned,
            total_findings: result.total_findings,
            findings_by_severity: &result.findings_by_severity,
            critical_findings_count: *result
                .findings_by_severity
                .get(&Severity::Critical)
                .unwrap_or(&0),
            high_findings_count: *result
                .findings_by_severity
                .get(&Severity::High)
                .unwrap_or(&0),
        },
        risk_analysis: RiskAnalysis {
            top_risks: prioritized
                .iter()
                .take(5)
                .map(|f| TopRisk {
                    title: &f.title,
                    severity: f.severity,
                    risk_score: f.risk_score,
                    resource_name: &f.resource_name,
                    resource_type: f.resource_type,
                })
                .collect(),
            recommendations: engine.recommendations(&result.findings),
        },
        findings: prioritized.iter().map(|f| report_finding(f)).collect(),
    };

    let mut bytes = serde_json::to_vec_pretty(&report)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn report_finding(finding: &Finding) -> ReportFinding<'_> {
    ReportFinding {
        id: finding.id,
        resource: ResourceRef {
            id: &finding.resource_id,
            name: &finding.resource_name,
            r#type: finding.resource_type,
            group: &finding.resource_group,
            location: &finding.location,
        },
        security_issue: SecurityIssue {
            title: &finding.title,
            description: &finding.description,
            severity: finding.severity,
            risk_score: finding.risk_score,
            recommendation: &finding.recommendation,
        },
        metadata: &finding.metadata,
        detected_at: finding.detected_at,
    }
}

#[derive(Serialize)]
struct QuickSummary<'a> {
    subscription_id: &'a str,
    scan_timestamp: DateTime<Utc>,
    overall_risk_score: u8,
    risk_level: &'static str,
    total_findings: usize,
    findings_by_severity: &'a BTreeMap<Severity, usize>,
    critical_findings: Vec<CriticalFinding<'a>>,
}

#[derive(Serialize)]
struct CriticalFinding<'a> {
    title: &'a str,
    resource_name: &'a str,
    risk_score: u8,
}

/// Render the compact executive summary.
pub fn render_summary(result: &ScanResult) -> Result<Vec<u8>, ReportError> {
    let summary = QuickSummary {
        subscription_id: &result.subscription_id,
        scan_timestamp: result.scan_timestamp,
        overall_risk_score: result.risk_score,
        risk_level: RiskEngine::risk_level(result.risk_score).as_str(),
        total_findings: result.total_findings,
        findings_by_severity: &result.findings_by_severity,
        critical_findings: result
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .map(|f| CriticalFinding {
                title: &f.title,
                resource_name: &f.resource_name,
                risk_score: f.risk_score,
            })
            .collect(),
    };

    let mut bytes = serde_json::to_vec_pretty(&summary)?;
    bytes.push(b'\n');
    Ok(bytes)
}
