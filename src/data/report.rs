use std::collections::HashMap;

use super::model::{CellValue, Dataset, Table};

/// Day-column sentinel marking a sample header row.
pub const SAMPLE_HEADER_MARKER: &str = "x";

/// Blank rows separating consecutive sample blocks.
pub const SEPARATOR_ROWS: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no dataset loaded: nothing to export")]
    EmptyDataset,

    #[error("required column '{0}' not found in dataset")]
    MissingColumn(String),
}

/// Regroup the dataset into per-sample report blocks.
///
/// For each sample, in first-seen order: a header row (sample id in the
/// sample column, [`SAMPLE_HEADER_MARKER`] in the day column), then its data
/// rows with the identifier rewritten to `D{day}-{sample}`. Consecutive
/// blocks are separated by [`SEPARATOR_ROWS`] blank rows; there is no
/// separator after the last block.
pub fn build_report(dataset: &Dataset) -> Result<Table, ReportError> {
    if dataset.is_empty() {
        return Err(ReportError::EmptyDataset);
    }
    let day = dataset
        .day
        .ok_or_else(|| ReportError::MissingColumn(dataset.day_label.clone()))?;
    let sample = dataset.sample;
    let source = &dataset.table;

    // Row indices per sample, groups in first-seen order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for i in 0..source.len() {
        let id = dataset.sample_of(i);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            groups.push((id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(i);
    }

    let mut report = Table {
        columns: source.columns.clone(),
        rows: Vec::with_capacity(source.len() + (SEPARATOR_ROWS + 1) * groups.len()),
    };

    for (block, (id, members)) in groups.iter().enumerate() {
        if block > 0 {
            for _ in 0..SEPARATOR_ROWS {
                report.rows.push(report.blank_row());
            }
        }

        let mut header = report.blank_row();
        header[sample.0] = CellValue::Text(id.clone());
        header[day.0] = CellValue::text(SAMPLE_HEADER_MARKER);
        report.rows.push(header);

        for &i in members {
            let mut row = source.rows[i].clone();
            let label = format!("D{}-{}", row[day.0], id);
            row[sample.0] = CellValue::Text(label);
            report.rows.push(row);
        }
    }

    log::info!(
        "Built report: {} rows for {} samples",
        report.len(),
        groups.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnId;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn num(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn dataset(rows: Vec<Vec<CellValue>>) -> Dataset {
        let mut table = Table::with_labels(["Sample No", "Day", "Gluc. [g/L]"]);
        table.rows = rows;
        Dataset {
            table,
            sample: ColumnId(0),
            day: Some(ColumnId(1)),
            day_label: "Day".to_string(),
        }
    }

    fn blank() -> Vec<CellValue> {
        vec![CellValue::Empty; 3]
    }

    #[test]
    fn interleaved_samples_are_grouped_in_first_seen_order() {
        let ds = dataset(vec![
            vec![text("A"), num(0.0), num(5.0)],
            vec![text("B"), num(0.0), num(6.0)],
            vec![text("A"), num(1.0), num(4.5)],
            vec![text("C"), num(0.0), num(7.0)],
        ]);
        let report = build_report(&ds).unwrap();

        let expected = vec![
            vec![text("A"), text("x"), CellValue::Empty],
            vec![text("D0-A"), num(0.0), num(5.0)],
            vec![text("D1-A"), num(1.0), num(4.5)],
            blank(),
            blank(),
            blank(),
            vec![text("B"), text("x"), CellValue::Empty],
            vec![text("D0-B"), num(0.0), num(6.0)],
            blank(),
            blank(),
            blank(),
            vec![text("C"), text("x"), CellValue::Empty],
            vec![text("D0-C"), num(0.0), num(7.0)],
        ];
        assert_eq!(report.rows, expected);
    }

    #[test]
    fn data_row_identifier_encodes_day_and_sample() {
        let ds = dataset(vec![vec![text("42"), num(5.0), num(3.2)]]);
        let report = build_report(&ds).unwrap();
        assert_eq!(report.rows[1], vec![text("D5-42"), num(5.0), num(3.2)]);
    }

    #[test]
    fn single_sample_has_no_separator() {
        let ds = dataset(vec![vec![text("42"), num(0.0), num(1.0)]]);
        assert_eq!(build_report(&ds).unwrap().len(), 2);
    }

    #[test]
    fn report_keeps_dataset_columns() {
        let ds = dataset(vec![vec![text("42"), num(0.0), num(1.0)]]);
        let report = build_report(&ds).unwrap();
        assert_eq!(report.columns, ds.table.columns);
    }

    #[test]
    fn empty_dataset_cannot_be_exported() {
        assert_eq!(build_report(&dataset(Vec::new())), Err(ReportError::EmptyDataset));
    }

    #[test]
    fn missing_day_column_is_reported() {
        let mut ds = dataset(vec![vec![text("42"), num(0.0), num(1.0)]]);
        ds.day = None;
        ds.day_label = "Culture day".to_string();
        assert_eq!(
            build_report(&ds),
            Err(ReportError::MissingColumn("Culture day".to_string()))
        );
    }
}
