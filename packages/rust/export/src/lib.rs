//! CSV export of extracted records.
//!
//! The file is UTF-8 with a byte-order mark, always carries the twelve
//! [`Record::HEADERS`] columns in order, and is written to a sibling temp
//! file first so a failed export never leaves a partial file behind.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use datrack_shared::{DatrackError, Record, Result};

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Data rows, header excluded.
    pub rows: usize,
    pub columns: usize,
}

/// Write `records` to `destination`, replacing any existing file.
#[instrument(skip_all, fields(destination = %destination.display(), records = records.len()))]
pub fn export(records: &[Record], destination: &Path) -> Result<ExportSummary> {
    let bytes = render(records)?;

    let tmp = temp_path(destination);
    if let Err(e) = std::fs::write(&tmp, &bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(DatrackError::io(&tmp, e));
    }

    if let Err(e) = std::fs::rename(&tmp, destination) {
        warn!(tmp = %tmp.display(), error = %e, "rename failed, removing temp file");
        let _ = std::fs::remove_file(&tmp);
        return Err(DatrackError::io(destination, e));
    }

    let summary = ExportSummary {
        path: destination.to_path_buf(),
        rows: records.len(),
        columns: Record::HEADERS.len(),
    };
    info!(rows = summary.rows, columns = summary.columns, "csv written");
    Ok(summary)
}

/// Serialize `records` to CSV bytes (BOM, header row, one row per record).
pub fn render(records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    writer
        .write_record(Record::HEADERS)
        .map_err(|e| DatrackError::Export(e.to_string()))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| DatrackError::Export(format!("{}: {e}", record.da_number)))?;
    }

    writer
        .into_inner()
        .map_err(|e| DatrackError::Export(e.to_string()))
}

/// `dir/.name.tmp` next to `destination`, so the final rename stays on one filesystem.
fn temp_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export.csv".into());
    destination.with_file_name(format!(".{name}.tmp"))
}
