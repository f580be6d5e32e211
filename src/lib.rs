// cargo watch -x 'fmt' -x 'test'

mod audit;
pub mod firewall;
pub mod models;
pub mod output;
pub mod snapshot;

pub use audit::{audit_snapshot, definite_violation_count, AuditFinding};

use firewall::FirewallAllowlist;
use std::error::Error;

/// Load an allowlist from its JSON file (keys are `"*"` or port strings,
/// values are address lists).
pub fn load_allowlist(path: &str) -> Result<FirewallAllowlist, Box<dyn Error>> {
    log::info!("Reading allowlist file: {path}");
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading allowlist file {path}: {e}"))?;
    let allowlist: FirewallAllowlist =
        serde_json::from_str(&json).map_err(|e| format!("Error parsing allowlist JSON: {e}"))?;
    Ok(allowlist)
}

/// Load a snapshot and an allowlist and check every firewall in the
/// snapshot against it.
pub fn run_audit(
    snapshot_file: Option<&str>,
    allowlist_file: &str,
) -> Result<Vec<AuditFinding>, Box<dyn Error>> {
    let snapshot = snapshot::read_snapshot(snapshot_file)?;
    let allowlist = load_allowlist(allowlist_file)?;
    Ok(audit_snapshot(&snapshot, &allowlist))
}
