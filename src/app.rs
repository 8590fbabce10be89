use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::color::SampleColors;
use crate::data::filter::{init_selection, selection_from};
use crate::data::loader::{load_uploads, LoadError, LoadOptions, RAW_DATA_SHEET};
use crate::data::model::{CellValue, Dataset};
use crate::data::report::build_report;
use crate::data::series::{chart_measurements, measurement_series, scatter3d};
use crate::export::{
    copy_source, write_atomically, write_json, write_report_xlsx, write_table_csv, ExportError,
    ExportOptions, DEFAULT_REPORT_PATH, DEFAULT_SOURCE_COPY_PATH,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "bioreactor-dash",
    version,
    about = "Merge bioreactor raw-data workbooks into per-sample tables, reports and chart data."
)]
pub struct Cli {
    /// Worksheet holding the raw readings in every upload.
    #[arg(long, global = true, default_value = RAW_DATA_SHEET)]
    sheet: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Uploads {
    /// Uploaded workbooks (.xlsm, .xlsx, .xls), merged as one batch.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the merged, normalised table as CSV.
    Show {
        #[command(flatten)]
        uploads: Uploads,

        /// Write to a file instead of stdout.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Build the per-sample report workbook.
    Export {
        #[command(flatten)]
        uploads: Uploads,

        /// Report workbook destination.
        #[arg(short, long, value_name = "PATH", default_value = DEFAULT_REPORT_PATH)]
        output: PathBuf,

        /// Also copy the first upload verbatim (diagnostic).
        #[arg(
            long,
            value_name = "PATH",
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = DEFAULT_SOURCE_COPY_PATH
        )]
        copy_source: Option<PathBuf>,

        /// Leave out the leading row-index column.
        #[arg(long)]
        no_index: bool,
    },

    /// Emit per-sample day series for measurements as JSON.
    Series {
        #[command(flatten)]
        uploads: Uploads,

        /// Measurement label (repeatable). Defaults to the standard catalogue.
        #[arg(short = 'm', long = "measurement", value_name = "LABEL")]
        measurements: Vec<String>,

        /// Restrict to these sample ids (repeatable).
        #[arg(short = 's', long = "sample", value_name = "ID")]
        samples: Vec<String>,

        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Emit (day, y, z) points for a three-axis scatter as JSON.
    Scatter {
        #[command(flatten)]
        uploads: Uploads,

        /// Measurement on the Y axis.
        #[arg(long, value_name = "LABEL")]
        y: String,

        /// Measurement on the Z axis.
        #[arg(long, value_name = "LABEL")]
        z: String,

        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Look up one reading by sample id, day and measurement.
    Value {
        #[command(flatten)]
        uploads: Uploads,

        #[arg(long, value_name = "ID")]
        sample: String,

        #[arg(long)]
        day: String,

        #[arg(short = 'm', long, value_name = "LABEL")]
        measurement: String,
    },

    /// List the measurement columns found in the uploads.
    Measurements {
        #[command(flatten)]
        uploads: Uploads,
    },
}

// ---------------------------------------------------------------------------
// Dispatch: one load pass, one downstream computation
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<()> {
    let load_options = LoadOptions {
        sheet_name: cli.sheet.clone(),
        ..LoadOptions::default()
    };

    match cli.command {
        Command::Show { uploads, output } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            emit(output.as_deref(), |out| write_table_csv(&dataset.table, out))
                .context("writing table")?;
        }

        Command::Export {
            uploads,
            output,
            copy_source: copy_to,
            no_index,
        } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            let report = build_report(&dataset).context("building report")?;
            // --sheet only selects what is read; the report sheet name is fixed.
            let export_options = ExportOptions {
                include_index: !no_index,
                ..ExportOptions::default()
            };
            write_report_xlsx(&report, &output, &export_options)
                .with_context(|| format!("exporting report to {}", output.display()))?;

            if let (Some(dest), Some(first)) = (copy_to, uploads.files.first()) {
                copy_source(first, &dest).context("copying first upload")?;
            }
            println!("{}", output.display());
        }

        Command::Series {
            uploads,
            measurements,
            samples,
            output,
        } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            let colors = SampleColors::new(&dataset.samples());
            let selection = selection_from(&samples).unwrap_or_else(|| init_selection(&dataset));
            let known = dataset.samples();
            for id in &selection {
                if !known.contains(id) {
                    log::warn!("Sample '{id}' not in dataset");
                }
            }

            let series = chart_measurements(&dataset, &measurements)
                .iter()
                .map(|m| measurement_series(&dataset, m, Some(&selection), &colors))
                .collect::<Result<Vec<_>, _>>()
                .context("building series")?;
            emit(output.as_deref(), |out| write_json(&series, out)).context("writing series")?;
        }

        Command::Scatter {
            uploads,
            y,
            z,
            output,
        } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            let colors = SampleColors::new(&dataset.samples());
            let points = scatter3d(&dataset, &y, &z, &colors).context("building scatter")?;
            emit(output.as_deref(), |out| write_json(&points, out)).context("writing scatter")?;
        }

        Command::Value {
            uploads,
            sample,
            day,
            measurement,
        } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            let day = day
                .parse::<f64>()
                .map(CellValue::Number)
                .unwrap_or(CellValue::Text(day));
            match dataset.value(&sample, &day, &measurement) {
                Some(value) => println!("{value}"),
                None => anyhow::bail!("no reading for sample '{sample}', day {day}, '{measurement}'"),
            }
        }

        Command::Measurements { uploads } => {
            let Some(dataset) = load(&uploads.files, &load_options)? else {
                return Ok(());
            };
            for column in dataset.measurements() {
                println!("{}", column.label);
            }
        }
    }

    Ok(())
}

/// Load the uploads; an empty upload list is a quiet no-op.
fn load(files: &[PathBuf], options: &LoadOptions) -> Result<Option<Dataset>> {
    match load_uploads(files, options) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} rows, {} samples, columns {:?}",
                dataset.len(),
                dataset.samples().len(),
                dataset.table.labels().collect::<Vec<_>>()
            );
            Ok(Some(dataset))
        }
        Err(LoadError::NoInput) => {
            log::info!("No files supplied; nothing to do");
            Ok(None)
        }
        Err(e) => Err(e).context("loading uploads"),
    }
}

/// Render into memory, then write to `path` atomically or to stdout.
fn emit<F>(path: Option<&Path>, render: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut Vec<u8>) -> Result<(), ExportError>,
{
    let mut buf = Vec::new();
    render(&mut buf)?;
    match path {
        Some(p) => write_atomically(p, &buf)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&buf)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
