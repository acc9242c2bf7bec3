use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Header line of the device manifest
pub const MANIFEST_HEADER: &str = "device_id";

/// Extract device ids from manifest text.
///
/// Lines are trimmed; blank lines and the `device_id` header are dropped
/// wherever they appear. Order is preserved.
pub fn parse_manifest(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != MANIFEST_HEADER)
        .map(str::to_string)
        .collect()
}

/// Read and parse the device manifest at `path`
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device manifest: {:?}", path))?;

    let ids = parse_manifest(&contents);
    for duplicate in duplicates(&ids) {
        warn!(device_id = %duplicate, "Duplicate device id in manifest");
    }
    info!(count = ids.len(), path = ?path, "Loaded devices from manifest");
    Ok(ids)
}

fn duplicates(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| !seen.insert(*id) && reported.insert(*id))
        .collect()
}
