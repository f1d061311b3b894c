//! SLCAN device discovery
//!
//! udev publishes stable symlinks for USB serial devices under
//! `/dev/serial/by-id`. Adapters running SLCAN firmware usually carry `slcan`
//! in their product string, which ends up in the link name.

use std::fs;
use std::path::Path;
use tracing::debug;

/// Directory scanned by [`find_slcan_device`]
pub const SERIAL_BY_ID_DIR: &str = "/dev/serial/by-id";

/// Sort key so that:
///  - ttyACM* devices come first (sorted numerically by suffix)
///  - then ttyUSB* devices (sorted numerically)
///  - then other devices (sorted by name)
fn device_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    if let Some(rest) = basename.strip_prefix("ttyACM") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (0, num, basename.to_string());
    }
    if let Some(rest) = basename.strip_prefix("ttyUSB") {
        let num = rest.parse::<usize>().unwrap_or(usize::MAX);
        return (1, num, basename.to_string());
    }
    (2, 0, basename.to_string())
}

/// Find the first SLCAN adapter in `/dev/serial/by-id`
pub fn find_slcan_device() -> Option<String> {
    find_slcan_device_in(Path::new(SERIAL_BY_ID_DIR))
}

/// Find the first SLCAN adapter among the symlinks in `dir`
///
/// Matching links are resolved to `/dev/<target name>`.
pub fn find_slcan_device_in(dir: &Path) -> Option<String> {
    let entries = fs::read_dir(dir).ok()?;

    let mut candidates: Vec<String> = entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.to_lowercase().contains("slcan"))
                .unwrap_or(false)
        })
        .filter_map(|entry| fs::read_link(entry.path()).ok())
        .filter_map(|target| {
            // Targets are relative, e.g. ../../ttyACM0
            target
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| format!("/dev/{name}"))
        })
        .collect();

    candidates.sort_by_key(|name| device_sort_key(name));
    debug!(?candidates, dir = %dir.display(), "SLCAN device candidates");
    candidates.into_iter().next()
}
