use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};

use super::header::{fill_header_rows, flatten_columns};
use super::model::{CellValue, Column, Dataset, Table};

/// Worksheet every upload must carry.
pub const RAW_DATA_SHEET: &str = "Br RAW Data";

/// Workbook extensions accepted as uploads.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsm", "xls", "xlsx"];

/// Text cells treated as missing, matching common spreadsheet NA tokens.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

/// Where the loader looks for things inside each workbook.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub sheet_name: String,
    /// Zero-based worksheet rows forming the multi-row header, top to bottom.
    pub header_rows: Vec<u32>,
    pub sample_column: String,
    pub day_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet_name: RAW_DATA_SHEET.to_string(),
            header_rows: vec![3, 4],
            sample_column: "Sample No".to_string(),
            day_column: "Day".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing was uploaded. Callers treat this as a quiet no-op.
    #[error("no files supplied")]
    NoInput,

    #[error("{}: unsupported file extension (expected one of .xlsm, .xls, .xlsx)", path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("{}: cannot open workbook", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("{}: worksheet '{sheet}' not found (available: {})", path.display(), available.join(", "))]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("{}: cannot read worksheet '{sheet}'", path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("{}: worksheet has no header row {row} (zero-based)", path.display())]
    MissingHeaderRow { path: PathBuf, row: u32 },

    #[error("required column '{column}' not found in merged header")]
    MissingColumn { column: String },

    /// `row` is the 1-based worksheet row, as shown by spreadsheet software.
    #[error("{}, row {row}: sample identifier '{value}' is not of the form '<prefix>-<sample>'", path.display())]
    MalformedSampleId {
        path: PathBuf,
        row: u32,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load every uploaded workbook and normalise them into one [`Dataset`].
///
/// All files are read before anything is merged, so a failure in any of
/// them yields no dataset at all.
pub fn load_uploads<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<Dataset, LoadError> {
    if paths.is_empty() {
        return Err(LoadError::NoInput);
    }
    let sheets = paths
        .iter()
        .map(|p| read_sheet(p.as_ref(), options))
        .collect::<Result<Vec<_>, _>>()?;
    normalize(sheets, options)
}

// ---------------------------------------------------------------------------
// Worksheet reading
// ---------------------------------------------------------------------------

/// One data row as read from a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// Zero-based worksheet row.
    pub sheet_row: u32,
    pub cells: Vec<CellValue>,
}

/// A worksheet after header merge, before cross-file normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub source: PathBuf,
    /// Flattened header label per column.
    pub labels: Vec<String>,
    pub rows: Vec<RawRow>,
}

fn check_extension(path: &Path) -> Result<(), LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(LoadError::UnsupportedExtension {
            path: path.to_path_buf(),
        })
    }
}

/// Read the raw-data worksheet of one workbook.
pub fn read_sheet(path: &Path, options: &LoadOptions) -> Result<RawSheet, LoadError> {
    check_extension(path)?;

    let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| *name == options.sheet_name) {
        return Err(LoadError::MissingSheet {
            path: path.to_path_buf(),
            sheet: options.sheet_name.clone(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(&options.sheet_name)
        .map_err(|source| LoadError::Sheet {
            path: path.to_path_buf(),
            sheet: options.sheet_name.clone(),
            source,
        })?;

    let sheet = sheet_from_range(path, &range, options)?;
    log::info!(
        "Read {} rows × {} columns from {}",
        sheet.rows.len(),
        sheet.labels.len(),
        path.display()
    );
    Ok(sheet)
}

/// Slice the header block and data rows out of a worksheet range.
/// Coordinates are absolute worksheet positions, whatever the range origin.
fn sheet_from_range(path: &Path, range: &Range<Data>, options: &LoadOptions) -> Result<RawSheet, LoadError> {
    let first_header = options.header_rows.iter().copied().min().unwrap_or(0);
    let last_header = options.header_rows.iter().copied().max().unwrap_or(0);

    let (last_row, last_col) = match range.end() {
        Some(end) if !range.is_empty() && end.0 >= last_header => end,
        _ => {
            return Err(LoadError::MissingHeaderRow {
                path: path.to_path_buf(),
                row: last_header,
            })
        }
    };

    let cell = |r: u32, c: u32| range.get_value((r, c)).map(convert_cell).unwrap_or_default();

    // Width: last column holding anything at or below the header block.
    let width = (first_header..=last_row)
        .flat_map(|r| (0..=last_col).map(move |c| (r, c)))
        .filter(|&(r, c)| !cell(r, c).is_empty())
        .map(|(_, c)| c + 1)
        .max()
        .unwrap_or(0);

    let mut header: Vec<Vec<String>> = options
        .header_rows
        .iter()
        .map(|&r| (0..width).map(|c| cell(r, c).to_string()).collect())
        .collect();
    fill_header_rows(&mut header);
    let labels = flatten_columns(&header);

    let rows = (last_header + 1..=last_row)
        .map(|r| RawRow {
            sheet_row: r,
            cells: (0..width).map(|c| cell(r, c)).collect(),
        })
        .collect();

    Ok(RawSheet {
        source: path.to_path_buf(),
        labels,
        rows,
    })
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
        // Dates keep their serial number.
        other => other
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| text_cell(&other.to_string())),
    }
}

fn text_cell(s: &str) -> CellValue {
    if NA_TOKENS.contains(&s) {
        CellValue::Empty
    } else {
        CellValue::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

/// Key aligning columns across files: the label plus how many earlier
/// columns of the same sheet carry the same label.
type ColumnKey = (String, usize);

fn column_keys(labels: &[String]) -> Vec<ColumnKey> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let n = counts.entry(label.as_str()).or_default();
            let key = (label.clone(), *n);
            *n += 1;
            key
        })
        .collect()
}

/// Merge sheets row-wise, drop duplicates, extract sample identifiers and
/// filter incomplete rows.
pub fn normalize(sheets: Vec<RawSheet>, options: &LoadOptions) -> Result<Dataset, LoadError> {
    if sheets.is_empty() {
        return Err(LoadError::NoInput);
    }

    // ---- Column union, first-seen order ----
    let mut union: Vec<ColumnKey> = Vec::new();
    let mut position: HashMap<ColumnKey, usize> = HashMap::new();
    let mappings: Vec<Vec<usize>> = sheets
        .iter()
        .map(|sheet| {
            column_keys(&sheet.labels)
                .into_iter()
                .map(|key| {
                    *position.entry(key.clone()).or_insert_with(|| {
                        union.push(key);
                        union.len() - 1
                    })
                })
                .collect()
        })
        .collect();

    let table = Table::with_labels(union.iter().map(|(label, _)| label.clone()));
    let sample = table
        .column_id(&options.sample_column)
        .ok_or_else(|| LoadError::MissingColumn {
            column: options.sample_column.clone(),
        })?;
    log::debug!("Merged columns: {}", describe_columns(&table.columns));
    let day = table.column_id(&options.day_column);
    if day.is_none() {
        log::warn!("No '{}' column in merged header", options.day_column);
    }

    // ---- Concatenate + drop exact duplicates ----
    let mut seen: HashSet<Vec<CellValue>> = HashSet::new();
    let mut merged: Vec<(usize, u32, Vec<CellValue>)> = Vec::new();
    let mut duplicates = 0usize;

    for (sheet_idx, (sheet, mapping)) in sheets.iter().zip(&mappings).enumerate() {
        for raw in &sheet.rows {
            let mut cells = table.blank_row();
            for (col, value) in raw.cells.iter().enumerate() {
                cells[mapping[col]] = value.clone();
            }
            if seen.insert(cells.clone()) {
                merged.push((sheet_idx, raw.sheet_row, cells));
            } else {
                duplicates += 1;
            }
        }
    }
    log::debug!("Dropped {duplicates} duplicate rows");

    // ---- Sample identifiers + incomplete rows ----
    let mut rows = Vec::with_capacity(merged.len());
    let mut dropped = 0usize;

    for (sheet_idx, sheet_row, mut cells) in merged {
        let id = extract_sample_id(&cells[sample.0]).map_err(|value| LoadError::MalformedSampleId {
            path: sheets[sheet_idx].source.clone(),
            row: sheet_row + 1,
            value,
        })?;
        match id {
            Some(id) => cells[sample.0] = CellValue::Text(id),
            None => {
                dropped += 1;
                continue;
            }
        }
        if cells.iter().all(CellValue::is_empty) {
            dropped += 1;
            continue;
        }
        rows.push(cells);
    }
    log::debug!("Dropped {dropped} rows without a sample identifier");

    let table = Table {
        columns: table.columns,
        rows,
    };
    log::info!(
        "Normalised {} rows × {} columns from {} file(s)",
        table.len(),
        table.columns.len(),
        sheets.len()
    );

    Ok(Dataset {
        table,
        sample,
        day,
        day_label: options.day_column.clone(),
    })
}

/// `"Batch7-42"` → `Some("42")`; blank → `None`; no `-` → `Err(raw value)`.
pub fn extract_sample_id(cell: &CellValue) -> Result<Option<String>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Text(s) => match s.split_once('-') {
            Some((_, rest)) if rest.is_empty() => Ok(None),
            Some((_, rest)) => Ok(Some(rest.to_string())),
            None => Err(s.clone()),
        },
        other => Err(other.to_string()),
    }
}

/// Labels of the merged table, for diagnostics.
pub fn describe_columns(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| format!("{}:{:?}", c.id.0, c.label))
        .collect::<Vec<_>>()
        .join(", ")
}
