//! Saving the final report to disk.
//!
//! The table file carries a short header (generation time) followed by exactly
//! the table printed on stdout; the JSON file holds the same rows with their
//! derived statistics.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::benchmarks::format::{BenchmarkRow, rows_as_json, rows_as_table};

fn create_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

/// Writes the report table to `path`, replacing any previous file.
pub fn write_table_file(path: &Path, rows: &[BenchmarkRow]) -> io::Result<()> {
    let now: DateTime<Local> = Local::now();
    let mut file = create_file(path)?;

    writeln!(file, "apibench results")?;
    writeln!(file, "Generated: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;
    write!(file, "{}", rows_as_table(rows))?;
    file.flush()
}

/// Writes the rows as a JSON document to `path`.
pub fn write_json_file(path: &Path, rows: &[BenchmarkRow]) -> io::Result<()> {
    let json = rows_as_json(rows).map_err(io::Error::other)?;
    let mut file = create_file(path)?;
    writeln!(file, "{json}")?;
    file.flush()
}
