//! Capture Table Writer
//!
//! Ghi attributes đã extract ra CSV để scan step đọc lại.

use std::path::Path;

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::PacketAttributes;

/// Column order of a capture table
pub const CAPTURE_COLUMNS: &[&str] = &[
    "timestamp", "length", "src_ip", "dst_ip", "protocol", "src_port", "dst_port",
];

/// Write extracted packet attributes as a capture table
///
/// Absent attributes are written as empty cells so the reconciler sees them as
/// missing, not as zero.
pub fn write_capture_table(path: &Path, packets: &[PacketAttributes]) -> ScanResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ScanError::output(path, e))?;

    writer
        .write_record(CAPTURE_COLUMNS)
        .map_err(|e| ScanError::output(path, e))?;

    for packet in packets {
        writer.serialize(packet).map_err(|e| ScanError::output(path, e))?;
    }

    writer.flush().map_err(|e| ScanError::output(path, e))?;
    log::info!("Captured packets saved to {} ({} rows)", path.display(), packets.len());
    Ok(packets.len())
}
