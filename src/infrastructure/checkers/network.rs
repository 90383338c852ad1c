//! Network security group checker

use async_trait::async_trait;

use crate::domain::resources::{
    RuleAccess, RuleDirection, SecurityGroup, SecurityRule, Subscription,
};
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, Severity,
};

use super::{evaluate, FindingTarget, Metadata, Rule};

/// Ports whose internet exposure is treated as high risk besides SSH/RDP.
const SENSITIVE_PORTS: [u16; 5] = [1433, 3306, 5432, 6379, 27017];

const RULES: &[Rule<SecurityRule>] = &[
    Rule {
        title: "SSH Access from Internet",
        severity: Severity::High,
        base_risk: 80,
        recommendation: "Restrict SSH access to specific IP addresses or use VPN/Bastion",
        matches: |rule| is_unrestricted_source(rule) && port_range_includes(rule, 22),
        describe: |rule| {
            format!(
                "NSG rule '{}' allows SSH access from the internet ({} to port {})",
                rule.name,
                source_of(rule),
                ports_of(rule)
            )
        },
        annotate: rule_metadata,
    },
    Rule {
        title: "RDP Access from Internet",
        severity: Severity::High,
        base_risk: 85,
        recommendation: "Restrict RDP access to specific IP addresses or use VPN/Bastion",
        matches: |rule| {
            is_unrestricted_source(rule)
                && port_range_includes(rule, 3389)
                && !port_range_includes(rule, 22)
        },
        describe: |rule| {
            format!(
                "NSG rule '{}' allows Remote Desktop Protocol (RDP) access from the internet",
                rule.name
            )
        },
        annotate: rule_metadata,
    },
    Rule {
        title: "Database Port Exposed to Internet",
        severity: Severity::High,
        base_risk: 75,
        recommendation: "Restrict database and cache ports to internal networks only",
        matches: |rule| {
            is_unrestricted_source(rule)
                && !port_range_includes(rule, 22)
                && !port_range_includes(rule, 3389)
                && SENSITIVE_PORTS.iter().any(|p| port_range_includes(rule, *p))
        },
        describe: |rule| {
            format!(
                "NSG rule '{}' exposes a database or cache port ({}) to the internet",
                rule.name,
                ports_of(rule)
            )
        },
        annotate: rule_metadata,
    },
    Rule {
        title: "Overly Permissive Inbound Rule",
        severity: Severity::Medium,
        base_risk: 55,
        recommendation:
            "Restrict source address to specific IP ranges or networks instead of allowing broad access",
        matches: |rule| !is_unrestricted_source(rule) && has_broad_source_prefix(rule),
        describe: |rule| {
            format!(
                "NSG rule '{}' allows inbound access from {} to port {}",
                rule.name,
                source_of(rule),
                ports_of(rule)
            )
        },
        annotate: rule_metadata,
    },
];

fn rule_metadata(rule: &SecurityRule) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("rule_name".into(), serde_json::json!(rule.name));
    meta.insert("protocol".into(), serde_json::json!(rule.protocol));
    meta.insert(
        "source_address_prefix".into(),
        serde_json::json!(rule.source_address_prefix),
    );
    meta.insert(
        "destination_port_range".into(),
        serde_json::json!(rule.destination_port_range),
    );
    meta.insert("priority".into(), serde_json::json!(rule.priority));
    meta
}

fn source_of(rule: &SecurityRule) -> &str {
    rule.source_address_prefix.as_deref().unwrap_or("*")
}

fn ports_of(rule: &SecurityRule) -> &str {
    rule.destination_port_range.as_deref().unwrap_or("*")
}

/// Whether the rule accepts traffic from anywhere on the internet.
fn is_unrestricted_source(rule: &SecurityRule) -> bool {
    matches!(
        rule.source_address_prefix.as_deref(),
        Some("*") | Some("0.0.0.0/0") | Some("::/0") | Some("Internet")
    )
}

/// Whether the source prefix is a CIDR block of /16 or broader.
fn has_broad_source_prefix(rule: &SecurityRule) -> bool {
    let Some(prefix) = rule.source_address_prefix.as_deref() else {
        return false;
    };
    let Some((_, bits)) = prefix.split_once('/') else {
        return false;
    };
    bits.parse::<u8>().is_ok_and(|len| len <= 16)
}

/// Whether the destination port range covers `port`.
///
/// Ranges arrive as `*`, a single port, or `start-end`.
fn port_range_includes(rule: &SecurityRule, port: u16) -> bool {
    let Some(range) = rule.destination_port_range.as_deref() else {
        return false;
    };
    if range == "*" {
        return true;
    }
    if let Ok(single) = range.parse::<u16>() {
        return single == port;
    }
    if let Some((start, end)) = range.split_once('-') {
        if let (Ok(start), Ok(end)) = (start.trim().parse::<u16>(), end.trim().parse::<u16>()) {
            return start <= port && port <= end;
        }
    }
    false
}

/// Checker for network security group misconfigurations.
#[derive(Debug)]
pub struct NetworkChecker;

#[async_trait]
impl ResourceChecker for NetworkChecker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::NetworkSecurityGroup
    }

    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError> {
        let groups = provider.list_security_groups(&subscription.id).await?;

        let mut findings = Vec::new();
        for group in &groups {
            let target = FindingTarget {
                resource_id: &group.id,
                resource_name: &group.name,
                kind: ResourceKind::NetworkSecurityGroup,
                subscription_id: &subscription.id,
                location: &group.location,
            };
            for rule in &group.rules {
                if rule.direction != RuleDirection::Inbound || rule.access != RuleAccess::Allow {
                    continue;
                }
                findings.extend(evaluate(RULES, rule, &target));
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::subscription;
    use super::*;
    use crate::domain::resources::{KeyVault, ManagedDisk, StorageAccount, VirtualMachine, Workspace};
    use crate::domain::scan::ProviderError;

    fn inbound_rule(name: &str, source: &str, ports: &str) -> SecurityRule {
        SecurityRule {
            name: name.to_string(),
            direction: RuleDirection::Inbound,
            access: RuleAccess::Allow,
            protocol: "Tcp".to_string(),
            source_address_prefix: Some(source.to_string()),
            source_port_range: Some("*".to_string()),
            destination_address_prefix: Some("*".to_string()),
            destination_port_range: Some(ports.to_string()),
            priority: 100,
        }
    }

    fn group(rules: Vec<SecurityRule>) -> SecurityGroup {
        SecurityGroup {
            id: "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Network/networkSecurityGroups/nsg1"
                .to_string(),
            name: "nsg1".to_string(),
            location: "westeurope".to_string(),
            rules,
        }
    }

    struct SingleGroupProvider(SecurityGroup);

    #[async_trait]
    impl ResourceProvider for SingleGroupProvider {
        async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError> {
            Ok(vec![subscription()])
        }
        async fn get_subscription(&self, _: &str) -> Result<Option<Subscription>, ProviderError> {
            Ok(Some(subscription()))
        }
        async fn list_storage_accounts(&self, _: &str) -> Result<Vec<StorageAccount>, ProviderError> {
            Ok(Vec::new())
        }
        async fn list_security_groups(&self, _: &str) -> Result<Vec<SecurityGroup>, ProviderError> {
            Ok(vec![self.0.clone()])
        }
        async fn list_key_vaults(&self, _: &str) -> Result<Vec<KeyVault>, ProviderError> {
            Ok(Vec::new())
        }
        async fn list_virtual_machines(&self, _: &str) -> Result<Vec<VirtualMachine>, ProviderError> {
            Ok(Vec::new())
        }
        async fn list_disks(&self, _: &str) -> Result<Vec<ManagedDisk>, ProviderError> {
            Ok(Vec::new())
        }
        async fn list_workspaces(&self, _: &str) -> Result<Vec<Workspace>, ProviderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn ssh_from_internet_yields_exactly_one_high_finding() {
        let provider = SingleGroupProvider(group(vec![inbound_rule("allow-ssh", "0.0.0.0/0", "22")]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert!(findings[0].severity >= Severity::High);
        assert_eq!(findings[0].title, "SSH Access from Internet");
    }

    #[tokio::test]
    async fn deny_and_outbound_rules_are_skipped() {
        let mut deny = inbound_rule("deny-all", "0.0.0.0/0", "*");
        deny.access = RuleAccess::Deny;
        let mut outbound = inbound_rule("egress", "0.0.0.0/0", "22");
        outbound.direction = RuleDirection::Outbound;

        let provider = SingleGroupProvider(group(vec![deny, outbound]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn rdp_range_is_detected() {
        let provider =
            SingleGroupProvider(group(vec![inbound_rule("allow-rdp", "*", "3380-3390")]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "RDP Access from Internet");
    }

    #[tokio::test]
    async fn broad_cidr_is_medium_severity() {
        let provider = SingleGroupProvider(group(vec![inbound_rule("allow-corp", "10.0.0.0/8", "443")]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].title, "Overly Permissive Inbound Rule");
    }

    #[tokio::test]
    async fn narrow_cidr_is_clean() {
        let provider =
            SingleGroupProvider(group(vec![inbound_rule("allow-office", "203.0.113.0/24", "443")]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn port_range_parsing() {
        let rule = inbound_rule("r", "*", "1000-2000");
        assert!(port_range_includes(&rule, 1433));
        assert!(!port_range_includes(&rule, 22));

        let wildcard = inbound_rule("r", "*", "*");
        assert!(port_range_includes(&wildcard, 22));
    }

    #[tokio::test]
    async fn database_port_exposure_is_high() {
        let provider = SingleGroupProvider(group(vec![inbound_rule("allow-sql", "Internet", "1433")]));
        let findings = NetworkChecker
            .check(&subscription(), &provider)
            .await
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Database Port Exposed to Internet");
        assert_eq!(findings[0].severity, Severity::High);
    }
}
