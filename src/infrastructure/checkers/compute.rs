//! Compute checker (virtual machines and managed disks)

use async_trait::async_trait;

use crate::domain::resources::{ManagedDisk, Subscription, VirtualMachine};
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, Severity,
};

use super::{evaluate, FindingTarget, Metadata, Rule};

const VM_RULES: &[Rule<VirtualMachine>] = &[
    Rule {
        title: "Virtual Machine with Public IP",
        severity: Severity::Medium,
        base_risk: 60,
        recommendation: "Consider using VPN or Azure Bastion for access instead of public IP",
        matches: |vm| vm.has_public_ip,
        describe: |vm| {
            format!(
                "Virtual machine '{}' has a public IP address assigned",
                vm.name
            )
        },
        annotate: |vm| {
            let mut meta = Metadata::new();
            meta.insert("vm_size".into(), serde_json::json!(vm.vm_size));
            meta.insert("os_type".into(), serde_json::json!(vm.os_type));
            meta
        },
    },
    Rule {
        title: "Unencrypted OS Disk",
        severity: Severity::High,
        base_risk: 70,
        recommendation: "Enable Azure Disk Encryption for the VM's OS disk",
        matches: |vm| !vm.os_disk_encrypted,
        describe: |vm| format!("Virtual machine '{}' OS disk is not encrypted", vm.name),
        annotate: |vm| {
            let mut meta = Metadata::new();
            meta.insert("os_type".into(), serde_json::json!(vm.os_type));
            meta.insert("os_disk_name".into(), serde_json::json!(vm.os_disk_name));
            meta
        },
    },
    Rule {
        title: "Missing Security Extensions",
        severity: Severity::Medium,
        base_risk: 40,
        recommendation:
            "Install security extensions like Azure Monitor, Microsoft Antimalware, or Log Analytics agent",
        matches: |vm| !has_security_extensions(vm),
        describe: |vm| {
            format!(
                "Virtual machine '{}' does not have security monitoring extensions installed",
                vm.name
            )
        },
        annotate: |vm| {
            let mut meta = Metadata::new();
            meta.insert(
                "extensions_count".into(),
                serde_json::json!(vm.extension_ids.len()),
            );
            meta
        },
    },
    Rule {
        title: "No Managed Identity Assigned",
        severity: Severity::Low,
        base_risk: 30,
        recommendation: "Enable managed identity for better security and access management",
        matches: |vm| vm.identity_type.is_none(),
        describe: |vm| {
            format!(
                "Virtual machine '{}' does not have a managed identity assigned",
                vm.name
            )
        },
        annotate: |vm| {
            let mut meta = Metadata::new();
            meta.insert(
                "identity_type".into(),
                serde_json::json!(vm.identity_type.as_deref().unwrap_or("None")),
            );
            meta
        },
    },
];

const DISK_RULES: &[Rule<ManagedDisk>] = &[
    Rule {
        title: "Unencrypted Managed Disk",
        severity: Severity::High,
        base_risk: 65,
        recommendation: "Enable encryption at rest for the managed disk",
        matches: |disk| !disk.encrypted,
        describe: |disk| format!("Managed disk '{}' is not encrypted at rest", disk.name),
        annotate: |disk| {
            let mut meta = Metadata::new();
            meta.insert("disk_size_gb".into(), serde_json::json!(disk.size_gb));
            meta.insert("sku".into(), serde_json::json!(disk.sku));
            meta
        },
    },
    Rule {
        title: "Disk Allows Public Network Access",
        severity: Severity::Medium,
        base_risk: 55,
        recommendation:
            "Restrict network access policy to allow only private endpoints or deny all",
        matches: |disk| disk.network_access_policy.as_deref() == Some("AllowAll"),
        describe: |disk| format!("Managed disk '{}' allows export via public network", disk.name),
        annotate: |disk| {
            let mut meta = Metadata::new();
            meta.insert(
                "network_access_policy".into(),
                serde_json::json!(disk.network_access_policy),
            );
            meta
        },
    },
];

const SECURITY_EXTENSIONS: [&str; 4] = [
    "Microsoft.Azure.Security.Antimalware",
    "Microsoft.Azure.Monitor",
    "Microsoft.OMSAgent",
    "Microsoft.EnterpriseCloud.Monitoring",
];

fn has_security_extensions(vm: &VirtualMachine) -> bool {
    vm.extension_ids
        .iter()
        .any(|id| SECURITY_EXTENSIONS.iter().any(|ext| id.contains(ext)))
}

/// Checker for compute misconfigurations, covering both virtual machines and
/// their managed disks.
#[derive(Debug)]
pub struct ComputeChecker;

#[async_trait]
impl ResourceChecker for ComputeChecker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VirtualMachine
    }

    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError> {
        let mut findings = Vec::new();

        let machines = provider.list_virtual_machines(&subscription.id).await?;
        for vm in &machines {
            let target = FindingTarget {
                resource_id: &vm.id,
                resource_name: &vm.name,
                kind: ResourceKind::VirtualMachine,
                subscription_id: &subscription.id,
                location: &vm.location,
            };
            findings.extend(evaluate(VM_RULES, vm, &target));
        }

        let disks = provider.list_disks(&subscription.id).await?;
        for disk in &disks {
            let target = FindingTarget {
                resource_id: &disk.id,
                resource_name: &disk.name,
                kind: ResourceKind::VirtualMachine,
                subscription_id: &subscription.id,
                location: &disk.location,
            };
            findings.extend(evaluate(DISK_RULES, disk, &target));
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hardened_vm() -> VirtualMachine {
        VirtualMachine {
            id: "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1"
                .to_string(),
            name: "vm1".to_string(),
            location: "westeurope".to_string(),
            vm_size: "Standard_D2s_v3".to_string(),
            os_type: "Linux".to_string(),
            os_disk_name: "vm1-osdisk".to_string(),
            os_disk_encrypted: true,
            has_public_ip: false,
            extension_ids: vec!["/ext/Microsoft.Azure.Monitor/agent".to_string()],
            identity_type: Some("SystemAssigned".to_string()),
        }
    }

    fn vm_target(vm: &VirtualMachine) -> FindingTarget<'_> {
        FindingTarget {
            resource_id: &vm.id,
            resource_name: &vm.name,
            kind: ResourceKind::VirtualMachine,
            subscription_id: "sub-1",
            location: &vm.location,
        }
    }

    #[test]
    fn hardened_vm_is_clean() {
        let vm = hardened_vm();
        assert!(evaluate(VM_RULES, &vm, &vm_target(&vm)).is_empty());
    }

    #[test]
    fn unencrypted_os_disk_is_high() {
        let mut vm = hardened_vm();
        vm.os_disk_encrypted = false;
        let findings = evaluate(VM_RULES, &vm, &vm_target(&vm));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].title, "Unencrypted OS Disk");
    }

    #[test]
    fn unmonitored_public_vm_accumulates_findings() {
        let mut vm = hardened_vm();
        vm.has_public_ip = true;
        vm.extension_ids.clear();
        vm.identity_type = None;
        let findings = evaluate(VM_RULES, &vm, &vm_target(&vm));
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn exported_unencrypted_disk_is_flagged_twice() {
        let disk = ManagedDisk {
            id: "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Compute/disks/d1"
                .to_string(),
            name: "d1".to_string(),
            location: "westeurope".to_string(),
            size_gb: Some(128),
            sku: Some("Premium_LRS".to_string()),
            encrypted: false,
            network_access_policy: Some("AllowAll".to_string()),
        };
        let target = FindingTarget {
            resource_id: &disk.id,
            resource_name: &disk.name,
            kind: ResourceKind::VirtualMachine,
            subscription_id: "sub-1",
            location: &disk.location,
        };
        let findings = evaluate(DISK_RULES, &disk, &target);
        assert_eq!(findings.len(), 2);
    }
}
