use std::collections::HashMap;

use serde::Serialize;

use super::filter::{visible_rows, SampleSelection};
use super::header::short_label;
use super::model::Dataset;
use crate::color::SampleColors;

/// Measurements charted by default, in panel order.
pub const DEFAULT_MEASUREMENTS: &[&str] = &[
    "pCO2 [mmHg]",
    "Via. [%]",
    "VCD [106 cells/mL]",
    "Cell Diameter [um]",
    "Gln [mg/L]",
    "Glu [mmol/L]",
    "Gluc. [g/L]",
    "Lact. [g/L]",
    "NH4+ [mmol/L]",
    "Osmo. [mOsm/kg]",
    "Titer [mg/L]",
    "Agitation [rpm]",
    "DO [%]",
    "Temp.  [°C]",
    "pH (int.) [-]",
    "pH Difference [-]",
    "pH (ext.) [-]",
    "pO2 [mmHg]",
    "pCO2 % [%]",
    "pO2 % [%]",
    "cIVC (106 vc/mL*day)",
    "Specific Productivity (pg/cell/day)",
    "Culture Duration (Days)",
    "Doubling Time [hr]",
    "Glucose Consumption [g/L]",
    "Daily Base Consumption [mL/L]",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("unknown measurement '{0}'")]
    UnknownMeasurement(String),

    #[error("dataset has no day column")]
    MissingDay,
}

// ---------------------------------------------------------------------------
// Per-day series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Day as displayed on the (ordinal) x axis.
    pub day: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSeries {
    pub sample: String,
    pub color: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSeries {
    pub measurement: String,
    pub title: String,
    pub samples: Vec<SampleSeries>,
}

/// Measurements to chart: the requested labels, or the default catalogue
/// restricted to what the dataset actually has.
pub fn chart_measurements(dataset: &Dataset, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    DEFAULT_MEASUREMENTS
        .iter()
        .filter(|m| {
            let present = dataset.measurement_id(m).is_some();
            if !present {
                log::warn!("Measurement '{m}' not in dataset, skipping");
            }
            present
        })
        .map(|m| m.to_string())
        .collect()
}

/// One measurement over days, split per sample in first-seen order.
///
/// Rows missing the day or the value, or with a non-numeric value, are left
/// out of the series.
pub fn measurement_series(
    dataset: &Dataset,
    measurement: &str,
    selection: Option<&SampleSelection>,
    colors: &SampleColors,
) -> Result<MeasurementSeries, SeriesError> {
    let day = dataset.day.ok_or(SeriesError::MissingDay)?;
    let column = dataset
        .measurement_id(measurement)
        .ok_or_else(|| SeriesError::UnknownMeasurement(measurement.to_string()))?;

    let mut samples: Vec<SampleSeries> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for i in visible_rows(dataset, selection) {
        let day_cell = dataset.table.cell(i, day);
        let Some(value) = dataset.table.cell(i, column).as_f64() else {
            skipped += 1;
            continue;
        };
        if day_cell.is_empty() {
            skipped += 1;
            continue;
        }

        let sample = dataset.sample_of(i);
        let slot = *index.entry(sample.clone()).or_insert_with(|| {
            samples.push(SampleSeries {
                color: colors.color_for(&sample).to_string(),
                sample: sample.clone(),
                points: Vec::new(),
            });
            samples.len() - 1
        });
        samples[slot].points.push(SeriesPoint {
            day: day_cell.to_string(),
            value,
        });
    }
    log::debug!("{measurement}: {skipped} rows without a plottable value");

    Ok(MeasurementSeries {
        measurement: measurement.to_string(),
        title: short_label(measurement).to_string(),
        samples,
    })
}

// ---------------------------------------------------------------------------
// Three-axis scatter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub sample: String,
    pub color: String,
    pub day: f64,
    pub y: f64,
    pub z: f64,
}

/// Points (day, y, z) for every row where all three are numeric.
pub fn scatter3d(
    dataset: &Dataset,
    y: &str,
    z: &str,
    colors: &SampleColors,
) -> Result<Vec<ScatterPoint>, SeriesError> {
    let day = dataset.day.ok_or(SeriesError::MissingDay)?;
    let resolve = |label: &str| {
        dataset
            .measurement_id(label)
            .ok_or_else(|| SeriesError::UnknownMeasurement(label.to_string()))
    };
    let (y_col, z_col) = (resolve(y)?, resolve(z)?);

    let points = (0..dataset.len())
        .filter_map(|i| {
            let t = &dataset.table;
            let sample = dataset.sample_of(i);
            Some(ScatterPoint {
                color: colors.color_for(&sample).to_string(),
                day: t.cell(i, day).as_f64()?,
                y: t.cell(i, y_col).as_f64()?,
                z: t.cell(i, z_col).as_f64()?,
                sample,
            })
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::selection_from;
    use crate::data::model::{CellValue, ColumnId, Table};
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        let mut table = Table::with_labels(["Sample No", "Day", "Via. [%]", "Titer [mg/L]"]);
        let t = CellValue::text;
        let n = CellValue::Number;
        table.rows = vec![
            vec![t("1"), n(0.0), n(99.0), CellValue::Empty],
            vec![t("2"), n(0.0), n(98.0), n(10.0)],
            vec![t("1"), n(1.0), n(97.5), n(12.0)],
            vec![t("2"), n(1.0), t("n.d."), n(14.0)],
        ];
        Dataset {
            table,
            sample: ColumnId(0),
            day: Some(ColumnId(1)),
            day_label: "Day".to_string(),
        }
    }

    fn colors(ds: &Dataset) -> SampleColors {
        SampleColors::new(&ds.samples())
    }

    #[test]
    fn series_groups_points_per_sample() {
        let ds = dataset();
        let series = measurement_series(&ds, "Via. [%]", None, &colors(&ds)).unwrap();
        assert_eq!(series.title, "Via.");
        assert_eq!(series.samples.len(), 2);
        assert_eq!(series.samples[0].sample, "1");
        assert_eq!(
            series.samples[0].points,
            vec![
                SeriesPoint { day: "0".into(), value: 99.0 },
                SeriesPoint { day: "1".into(), value: 97.5 },
            ]
        );
        // non-numeric reading dropped
        assert_eq!(series.samples[1].points.len(), 1);
    }

    #[test]
    fn series_respects_sample_selection() {
        let ds = dataset();
        let sel = selection_from(&["2".to_string()]);
        let series = measurement_series(&ds, "Titer [mg/L]", sel.as_ref(), &colors(&ds)).unwrap();
        assert_eq!(series.samples.len(), 1);
        assert_eq!(series.samples[0].sample, "2");
        assert_eq!(series.samples[0].points.len(), 2);
    }

    #[test]
    fn unknown_or_key_column_is_rejected() {
        let ds = dataset();
        let c = colors(&ds);
        assert_eq!(
            measurement_series(&ds, "DO [%]", None, &c),
            Err(SeriesError::UnknownMeasurement("DO [%]".into()))
        );
        assert_eq!(
            measurement_series(&ds, "Day", None, &c),
            Err(SeriesError::UnknownMeasurement("Day".into()))
        );
    }

    #[test]
    fn default_catalogue_is_limited_to_present_columns() {
        let ds = dataset();
        assert_eq!(chart_measurements(&ds, &[]), vec!["Via. [%]", "Titer [mg/L]"]);
        assert_eq!(chart_measurements(&ds, &["X".to_string()]), vec!["X"]);
    }

    #[test]
    fn scatter_keeps_complete_rows_only() {
        let ds = dataset();
        let points = scatter3d(&ds, "Via. [%]", "Titer [mg/L]", &colors(&ds)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].day, points[0].y, points[0].z), (0.0, 98.0, 10.0));
        assert_eq!(points[1].sample, "1");
    }
}
