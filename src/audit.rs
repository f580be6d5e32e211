//! Allowlist compliance auditing across a whole snapshot.

use crate::firewall::{Firewall, FirewallAllowlist};
use crate::models::{IPPort, UnknownBool};
use crate::snapshot::Snapshot;

/// The outcome of checking one resource's firewall against the allowlist.
#[derive(Debug)]
pub struct AuditFinding {
    pub resource: String,
    pub kind: &'static str,
    pub verdict: UnknownBool,
    pub violations: Vec<IPPort>,
    /// Set when the check itself failed (e.g. a malformed allowlist); the
    /// verdict is `Unknown` in that case, never a silent pass or fail.
    pub error: Option<String>,
}

/// Runs `respects_allowlist` over every firewall in the snapshot and
/// returns one finding per resource, ordered by kind then name.
pub fn audit_snapshot(snapshot: &Snapshot, allowlist: &FirewallAllowlist) -> Vec<AuditFinding> {
    log::info!(
        "#Start audit_snapshot() over {} resources in subscription '{}'",
        snapshot.resource_count(),
        snapshot.subscription_id
    );
    let mut findings: Vec<AuditFinding> = Vec::new();
    for (resource, kind, firewall) in snapshot.firewalls() {
        match firewall.respects_allowlist(allowlist) {
            Ok((verdict, mut violations)) => {
                violations.sort_by(|a, b| a.evidence_order(b));
                log::debug!("{kind} '{resource}' => {verdict}");
                findings.push(AuditFinding {
                    resource,
                    kind,
                    verdict,
                    violations,
                    error: None,
                });
            }
            Err(e) => {
                log::warn!("{kind} '{resource}' could not be checked: {e}");
                findings.push(AuditFinding {
                    resource,
                    kind,
                    verdict: UnknownBool::Unknown,
                    violations: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }
    findings.sort_by(|a, b| a.kind.cmp(b.kind).then_with(|| a.resource.cmp(&b.resource)));
    findings
}

/// How many resources definitely violate the allowlist. Uncertain and
/// not-applicable verdicts are excluded on purpose: they are reported, not
/// counted as failures.
pub fn definite_violation_count(findings: &[AuditFinding]) -> usize {
    findings.iter().filter(|f| f.verdict.is_false()).count()
}
