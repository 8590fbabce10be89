//! Workbook fixtures for tests: rows are written from the first header row
//! (worksheet row 3) downwards, under a title line like real exports carry.

use std::path::Path;

use rust_xlsxwriter::Workbook;

pub enum FixtureRow {
    Texts(Vec<String>),
    Data {
        sample: String,
        day: f64,
        values: Vec<Option<f64>>,
    },
    Blank,
}

impl FixtureRow {
    pub fn texts(cells: &[&str]) -> Self {
        FixtureRow::Texts(cells.iter().map(|s| s.to_string()).collect())
    }

    pub fn data(sample: &str, day: f64, values: &[Option<f64>]) -> Self {
        FixtureRow::Data {
            sample: sample.to_string(),
            day,
            values: values.to_vec(),
        }
    }

    pub fn blank() -> Self {
        FixtureRow::Blank
    }
}

pub fn write_workbook(path: &Path, sheet: &str, rows: &[FixtureRow]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    worksheet.write_string(0, 0, "Bioreactor run").unwrap();

    for (i, row) in rows.iter().enumerate() {
        let r = 3 + i as u32;
        match row {
            FixtureRow::Texts(cells) => {
                for (c, text) in cells.iter().enumerate() {
                    if !text.is_empty() {
                        worksheet.write_string(r, c as u16, text.as_str()).unwrap();
                    }
                }
            }
            FixtureRow::Data { sample, day, values } => {
                worksheet.write_string(r, 0, sample.as_str()).unwrap();
                worksheet.write_number(r, 1, *day).unwrap();
                for (c, value) in values.iter().enumerate() {
                    if let Some(v) = value {
                        worksheet.write_number(r, 2 + c as u16, *v).unwrap();
                    }
                }
            }
            FixtureRow::Blank => {}
        }
    }

    workbook.save(path).unwrap();
}
