pub mod report;

pub use report::{CsvReport, header, row, write_report};
