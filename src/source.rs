//! Reading the raw extract and loading/saving the canonical directory.

use crate::error::{AppError, Result};
use crate::models::{HospitalRecord, RawRow};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Header names of the columns the builder reads.
const COL_CODE: &str = "機構代碼";
const COL_NAME: &str = "機構名稱";
const COL_LOCALITY: &str = "縣市區名";
const COL_ADDRESS: &str = "地址";
const COL_PHONE: &str = "電話";
const COL_DEPARTMENTS: &str = "科別";

/// Rows with fewer populated cells are layout noise, not institutions.
const MIN_POPULATED_CELLS: usize = 5;

/// Reads the CSV export of the extract's first sheet.
pub(crate) fn read_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = fs::File::open(path)?;
    let rows = read_raw_rows_from(file)?;
    tracing::info!(target: "normalize_task", "Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub(crate) fn read_raw_rows_from<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            // Spreadsheet exports often lead with a byte-order mark.
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| AppError::MissingColumn(name.to_string()))
    };
    let code = column(COL_CODE)?;
    let name = column(COL_NAME)?;
    let locality = column(COL_LOCALITY)?;
    let address = column(COL_ADDRESS)?;
    let phone = column(COL_PHONE)?;
    let departments = column(COL_DEPARTMENTS)?;

    let mut rows = Vec::new();
    let mut short_rows = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let populated = record.iter().filter(|cell| !cell.is_empty()).count();
        if populated < MIN_POPULATED_CELLS {
            short_rows += 1;
            continue;
        }
        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
        rows.push(RawRow {
            code: cell(code),
            name: cell(name),
            locality: cell(locality),
            address: cell(address),
            phone: cell(phone),
            departments: cell(departments),
        });
    }

    if short_rows > 0 {
        tracing::debug!(target: "normalize_task", "Skipped {} rows with fewer than {} cells", short_rows, MIN_POPULATED_CELLS);
    }
    Ok(rows)
}

/// Loads a directory file. Any read or parse failure is returned to the
/// caller, which treats it as fatal.
pub(crate) fn load_directory(path: &Path) -> Result<Vec<HospitalRecord>> {
    let content = fs::read_to_string(path)?;
    let hospitals: Vec<HospitalRecord> = serde_json::from_str(&content)?;
    tracing::info!("Loaded {} directory entries from {}", hospitals.len(), path.display());
    Ok(hospitals)
}

/// Like [`load_directory`], but a missing file is an empty directory.
pub(crate) fn load_directory_or_empty(path: &Path) -> Result<Vec<HospitalRecord>> {
    if !path.exists() {
        tracing::warn!("Directory file {} not found, starting without prior entries", path.display());
        return Ok(Vec::new());
    }
    load_directory(path)
}

pub(crate) fn save_directory(path: &Path, hospitals: &[HospitalRecord]) -> Result<()> {
    write_json_atomically(path, &hospitals)?;
    tracing::info!("Wrote {} directory entries to {}", hospitals.len(), path.display());
    Ok(())
}

/// Serializes to a sibling temp file, then renames over `path`, so an
/// interrupted write never leaves a truncated document behind.
pub(crate) fn write_json_atomically<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
