use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use csv::WriterBuilder;
use featbench_core::CombinationRecord;
use log::{info, warn};

use crate::errors::{BenchError, Result};

const PARAMETER_COLUMNS: [&str; 5] = ["Detector", "Descriptor", "Matcher", "DescriptorType", "Selector"];

const METRIC_COLUMNS: [&str; 5] = [
    "numKeypoint",
    "numKeypointsVehicle",
    "numKeypointsMatched",
    "tKeypointDetection",
    "tKeypointDesc",
];

/// Semicolon-separated benchmark table. Every field is followed by `;` and
/// each written block ends with a blank line.
#[derive(Debug, Clone)]
pub struct CsvReport {
    path: PathBuf,
    overwrite: bool,
}

impl CsvReport {
    pub fn new<P: Into<PathBuf>>(path: P, overwrite: bool) -> Self {
        Self {
            path: path.into(),
            overwrite,
        }
    }

    /// Appends (or, with `overwrite`, replaces) a header and one row per record.
    pub fn save(&self, records: &[CombinationRecord]) -> Result<()> {
        if records.is_empty() {
            warn!("No combinations recorded; {} left untouched", self.path.display());
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!self.overwrite)
            .truncate(self.overwrite)
            .open(&self.path)?;
        let mut file = write_report(file, records)?;
        file.flush()?;

        info!(
            "Wrote {} combinations to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Column names for a run over `frames` images.
pub fn header(frames: usize) -> Vec<String> {
    let mut columns: Vec<String> = PARAMETER_COLUMNS.iter().map(|c| c.to_string()).collect();
    for metric in METRIC_COLUMNS {
        columns.extend((0..frames).map(|j| format!("{metric}_{j}")));
    }
    columns
}

/// The five parameter names followed by the five metric sequences. A missing
/// matched count becomes an empty cell.
pub fn row(record: &CombinationRecord) -> Vec<String> {
    let m = &record.metrics;
    let mut fields: Vec<String> = record
        .combination
        .fields()
        .iter()
        .map(|f| f.to_string())
        .collect();
    fields.extend(m.keypoints.iter().map(ToString::to_string));
    fields.extend(m.keypoints_in_roi.iter().map(ToString::to_string));
    fields.extend(
        m.matched
            .iter()
            .map(|v| v.map(|n| n.to_string()).unwrap_or_default()),
    );
    fields.extend(m.detection_seconds.iter().map(ToString::to_string));
    fields.extend(m.description_seconds.iter().map(ToString::to_string));
    fields
}

/// Writes one block (header, rows, blank line) and hands the writer back.
pub fn write_report<W: Write>(writer: W, records: &[CombinationRecord]) -> Result<W> {
    let frames = records
        .iter()
        .map(|r| r.metrics.frames())
        .max()
        .unwrap_or(0);

    let mut table = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    table.write_record(terminated(header(frames)))?;
    for record in records {
        table.write_record(terminated(row(record)))?;
    }

    let mut inner = table.into_inner().map_err(|e| BenchError::Io(e.into_error()))?;
    inner.write_all(b"\n")?;
    Ok(inner)
}

/// Trailing empty field, so the line ends with the delimiter.
fn terminated(mut fields: Vec<String>) -> Vec<String> {
    fields.push(String::new());
    fields
}
