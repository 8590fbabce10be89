use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatBorder, Workbook, XlsxError};
use serde::Serialize;

use crate::data::loader::RAW_DATA_SHEET;
use crate::data::model::{CellValue, Table};

/// Where the report workbook lands unless told otherwise.
pub const DEFAULT_REPORT_PATH: &str = "/tmp/merged.xlsx";

/// Where the optional copy of the first upload lands.
pub const DEFAULT_SOURCE_COPY_PATH: &str = "/tmp/merged.xlsm";

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub sheet_name: String,
    /// Emit a leading column with the 0-based row index.
    pub include_index: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: RAW_DATA_SHEET.to_string(),
            include_index: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot build workbook")]
    Xlsx(#[from] XlsxError),

    #[error("{}: write failed", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output")]
    Output(#[from] std::io::Error),

    #[error("cannot write CSV")]
    Csv(#[from] csv::Error),

    #[error("cannot serialise JSON")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Report workbook
// ---------------------------------------------------------------------------

/// Render a table as an in-memory `.xlsx`: bold header row of labels, then
/// one worksheet row per table row. Empty cells are left unwritten.
pub fn render_report_xlsx(table: &Table, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let offset: u16 = if options.include_index { 1 } else { 0 };

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&options.sheet_name)?;

    for column in &table.columns {
        worksheet.write_string_with_format(0, offset + column.id.0 as u16, &column.label, &header)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        if options.include_index {
            worksheet.write_number_with_format(r, 0, i as f64, &header)?;
        }
        for (c, cell) in row.iter().enumerate() {
            let c = offset + c as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Number(v) => {
                    worksheet.write_number(r, c, *v)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write the report workbook to `path`.
///
/// The file is written next to the destination and renamed into place, so
/// a failed export leaves any previous file untouched and no partial output.
pub fn write_report_xlsx(table: &Table, path: &Path, options: &ExportOptions) -> Result<(), ExportError> {
    let bytes = render_report_xlsx(table, options)?;
    write_atomically(path, &bytes)?;
    log::info!("Wrote {} report rows to {}", table.len(), path.display());
    Ok(())
}

/// Write `bytes` to a `.part` file beside `path`, then rename it into place.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let partial = path.with_file_name(format!(".{file_name}.part"));

    if let Err(e) = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(io_err(e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text outputs
// ---------------------------------------------------------------------------

/// Write a table as CSV, header row first.
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.labels())?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pretty-print any serialisable value as JSON, newline-terminated.
pub fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Byte-copy an uploaded workbook to `dest`. Opt-in diagnostic only.
pub fn copy_source(source: &Path, dest: &Path) -> Result<u64, ExportError> {
    let bytes = fs::copy(source, dest).map_err(|source| ExportError::Io {
        path: dest.to_path_buf(),
        source,
    })?;
    log::info!("Copied {} ({bytes} bytes) to {}", source.display(), dest.display());
    Ok(bytes)
}
