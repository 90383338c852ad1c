//! Risk scoring engine
//!
//! Pure functions from findings to an aggregate score, a severity
//! histogram, and report-oriented summaries. Nothing here touches I/O.

use std::collections::BTreeMap;

use crate::domain::scan::{Finding, ResourceKind, RiskLevel, Severity};

/// Saturation midpoint of the aggregate score curve: a weighted severity
/// sum equal to this value maps to a score of 50.
const SCORE_MIDPOINT: f64 = 250.0;

/// Outcome of scoring a finding set.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    /// Aggregate risk score in [0, 100]
    pub score: u8,
    /// Finding counts per severity, all levels present
    pub histogram: BTreeMap<Severity, usize>,
}

/// Engine for calculating risk scores and aggregating findings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fixed weight each severity contributes to the aggregate score.
    pub fn severity_weight(severity: Severity) -> u32 {
        match severity {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Low => 25,
            Severity::Info => 10,
        }
    }

    /// Score a finding set.
    ///
    /// The aggregate score is a saturating normalization of the weighted
    /// severity sum (`100·w/(w+midpoint)`): zero for the empty set,
    /// monotonically increasing in both finding count and severity, and
    /// clamped to [0, 100].
    pub fn score(&self, findings: &[Finding]) -> RiskAssessment {
        RiskAssessment {
            score: Self::aggregate_score(findings),
            histogram: Self::histogram(findings),
        }
    }

    fn aggregate_score(findings: &[Finding]) -> u8 {
        if findings.is_empty() {
            return 0;
        }
        let weighted_sum: u32 = findings
            .iter()
            .map(|f| Self::severity_weight(f.severity))
            .sum();
        let w = f64::from(weighted_sum);
        let score = (100.0 * w / (w + SCORE_MIDPOINT)).round();
        score.clamp(0.0, 100.0) as u8
    }

    /// Count findings by severity level, including zero-count levels.
    pub fn histogram(findings: &[Finding]) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in findings {
            *counts.entry(finding.severity).or_default() += 1;
        }
        counts
    }

    /// Order findings for presentation: severity descending, then
    /// per-finding risk contribution descending, then resource id ascending.
    pub fn prioritize<'a>(&self, findings: &'a [Finding]) -> Vec<&'a Finding> {
        let mut ordered: Vec<&Finding> = findings.iter().collect();
        ordered.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.risk_score.cmp(&a.risk_score))
                .then(a.resource_id.cmp(&b.resource_id))
        });
        ordered
    }

    /// High-level recommendations derived from finding counts.
    pub fn recommendations(&self, findings: &[Finding]) -> Vec<String> {
        let mut recommendations = Vec::new();
        let counts = Self::histogram(findings);

        let critical = counts[&Severity::Critical];
        if critical > 0 {
            recommendations.push(format!(
                "Address {} critical findings immediately as they pose significant security risks.",
                critical
            ));
        }

        let high = counts[&Severity::High];
        if high > 5 {
            recommendations.push(format!(
                "Prioritize fixing the {} high-severity issues to reduce overall risk exposure.",
                high
            ));
        }

        let mut by_kind: BTreeMap<ResourceKind, usize> = BTreeMap::new();
        for finding in findings {
            *by_kind.entry(finding.resource_type).or_default() += 1;
        }

        if by_kind
            .get(&ResourceKind::StorageAccount)
            .is_some_and(|n| *n > 3)
        {
            recommendations.push(
                "Review storage account configurations as multiple security issues were detected."
                    .to_string(),
            );
        }
        if by_kind
            .get(&ResourceKind::NetworkSecurityGroup)
            .is_some_and(|n| *n > 2)
        {
            recommendations.push(
                "Audit network security group rules to ensure proper network segmentation."
                    .to_string(),
            );
        }
        if by_kind.get(&ResourceKind::KeyVault).is_some_and(|n| *n > 1) {
            recommendations.push(
                "Strengthen Key Vault security configurations including firewall rules and access policies."
                    .to_string(),
            );
        }

        if findings.len() > 20 {
            recommendations.push(
                "Consider implementing automated security monitoring and regular security assessments."
                    .to_string(),
            );
        }

        if recommendations.is_empty() {
            recommendations.push(
                "Continue monitoring security posture and implement security best practices."
                    .to_string(),
            );
        }

        recommendations
    }

    /// Qualitative band for a score.
    pub fn risk_level(score: u8) -> RiskLevel {
        RiskLevel::from_score(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, resource_id: &str, risk: u8) -> Finding {
        Finding::builder(resource_id, "res")
            .severity(severity)
            .risk_score(risk)
            .build()
    }

    #[test]
    fn empty_set_scores_zero() {
        let assessment = RiskEngine::new().score(&[]);
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.histogram.values().sum::<usize>(), 0);
        assert_eq!(assessment.histogram.len(), 5);
    }

    #[test]
    fn score_stays_in_bounds() {
        let engine = RiskEngine::new();
        let many: Vec<Finding> = (0..500)
            .map(|i| finding(Severity::Critical, &format!("r{}", i), 100))
            .collect();
        let assessment = engine.score(&many);
        assert!(assessment.score <= 100);
        assert_eq!(assessment.histogram[&Severity::Critical], 500);
    }

    #[test]
    fn adding_a_finding_never_decreases_the_score() {
        let engine = RiskEngine::new();
        let mut findings = vec![finding(Severity::Critical, "a", 90)];
        let mut previous = engine.score(&findings).score;
        for (i, severity) in [Severity::Info, Severity::Low, Severity::Medium, Severity::High]
            .iter()
            .enumerate()
        {
            findings.push(finding(*severity, &format!("r{}", i), 10));
            let next = engine.score(&findings).score;
            assert!(next >= previous, "score decreased: {} -> {}", previous, next);
            previous = next;
        }
    }

    #[test]
    fn higher_severity_scores_higher() {
        let engine = RiskEngine::new();
        let low = engine.score(&[finding(Severity::Low, "a", 10)]).score;
        let critical = engine.score(&[finding(Severity::Critical, "a", 90)]).score;
        assert!(critical > low);
    }

    #[test]
    fn histogram_sums_to_finding_count() {
        let findings = vec![
            finding(Severity::High, "a", 80),
            finding(Severity::High, "b", 75),
            finding(Severity::Info, "c", 5),
        ];
        let histogram = RiskEngine::histogram(&findings);
        assert_eq!(histogram.values().sum::<usize>(), findings.len());
        assert_eq!(histogram[&Severity::High], 2);
        assert_eq!(histogram[&Severity::Critical], 0);
    }

    #[test]
    fn prioritize_breaks_ties_deterministically() {
        let findings = vec![
            finding(Severity::High, "b", 70),
            finding(Severity::Critical, "c", 50),
            finding(Severity::High, "a", 70),
            finding(Severity::High, "d", 90),
        ];
        let ordered = RiskEngine::new().prioritize(&findings);
        let ids: Vec<&str> = ordered.iter().map(|f| f.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn recommendations_mention_critical_findings() {
        let findings = vec![finding(Severity::Critical, "a", 95)];
        let recommendations = RiskEngine::new().recommendations(&findings);
        assert!(recommendations[0].contains("1 critical findings"));
    }

    #[test]
    fn recommendations_fall_back_to_general_advice() {
        let recommendations = RiskEngine::new().recommendations(&[]);
        assert_eq!(recommendations.len(), 1);
        assert!(recommendations[0].contains("Continue monitoring"));
    }
}
