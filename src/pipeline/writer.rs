use crate::constants::OUTPUT_COLUMNS;
use crate::error::{Result, ScraperError};
use crate::types::EnrichedFestivalRecord;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the records as UTF-8 CSV, replacing any existing file.
///
/// Rows go to a sibling `.tmp` file which is renamed into place once fully
/// written, so the output path never holds a partial file.
pub fn write_csv(path: &Path, records: &[EnrichedFestivalRecord]) -> Result<()> {
    let write_error = |message: String| ScraperError::Write {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }

    let tmp_path = temp_path(path).ok_or_else(|| write_error("path has no file name".into()))?;
    debug!("Writing {} rows to {}", records.len(), tmp_path.display());

    if let Err(e) = write_rows(&tmp_path, records) {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_error(e.to_string()));
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_error(format!("failed to move temporary file into place: {e}"))
    })?;
    Ok(())
}

fn temp_path(path: &Path) -> Option<PathBuf> {
    let mut name = path.file_name()?.to_os_string();
    name.push(".tmp");
    Some(path.with_file_name(name))
}

fn write_rows(path: &Path, records: &[EnrichedFestivalRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| ScraperError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))?;
    file.sync_all()?;
    Ok(())
}
