//! Snapshot file reading and writing.
//!
//! Snapshots come from the external gather pipeline; this side only loads
//! and re-saves them. Loading goes through `serde_path_to_error` so a
//! malformed file names the exact JSON path that broke.

use super::Snapshot;
use std::error::Error;
use std::path::Path;

/// Read a subscription snapshot, or the dated default file when no path is
/// given.
///
/// # Arguments
/// * `snapshot_file` - Optional path to a specific snapshot. If None, uses
///   `firewall_snapshot_YYYY-MM-DD.json` for today's date.
///
/// # Returns
/// * `Ok(Snapshot)` - The parsed snapshot
/// * `Err` - If the file is missing or fails to parse
pub fn read_snapshot(snapshot_file: Option<&str>) -> Result<Snapshot, Box<dyn Error>> {
    let snapshot_file = match snapshot_file {
        Some(file) => {
            if !Path::new(file).exists() {
                return Err(format!("Snapshot file does not exist: {file}").into());
            }
            log::info!("Using provided snapshot file: {file}");
            file.to_string()
        }
        None => {
            let now = chrono::Utc::now();
            format!("firewall_snapshot_{}.json", now.format("%Y-%m-%d"))
        }
    };

    let json = std::fs::read_to_string(&snapshot_file)
        .map_err(|e| format!("Error reading snapshot file {snapshot_file}: {e}"))?;
    let mut deserializer = serde_json::Deserializer::from_str(&json);
    let snapshot: Snapshot = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| format!("Error parsing snapshot at {path}: {e}", path = e.path()))?;
    log::info!(
        "Read snapshot for subscription '{}' with {} resources",
        snapshot.subscription_id,
        snapshot.resource_count()
    );
    Ok(snapshot)
}

/// Write a snapshot back to disk as pretty printed JSON.
pub fn write_snapshot(snapshot: &Snapshot, snapshot_file: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)
        .map_err(|e| format!("Error serializing snapshot: {e}"))?;
    log::info!("Writing snapshot to file: {snapshot_file}");
    std::fs::write(snapshot_file, json)
        .map_err(|e| format!("Error writing snapshot file {snapshot_file}: {e}"))?;
    Ok(())
}
