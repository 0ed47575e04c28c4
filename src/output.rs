//! Output formatting and persistence for charts and enriched rows.
//!
//! Supports JSON emission of chart sets, CSV export of persisted-shape rows
//! (optionally gzip-compressed) and the downloadable upload template.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::contribute::ContributionRow;

/// Template CSV offered to contributors. Its header row is the upload schema.
pub const SAMPLE_CSV: &str = include_str!("../assets/SampleData.csv");

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` as pretty-printed JSON to `path`, creating parent
/// directories as needed.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    create_parent(path)?;
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    serde_json::to_writer_pretty(file, value)?;
    debug!(path, "JSON written");
    Ok(())
}

/// Writes rows as CSV with a header line. With `gzip` the file is
/// compressed and `.gz` is appended to `path` if missing.
///
/// Returns the path actually written.
pub fn write_rows(path: &str, rows: &[ContributionRow], gzip: bool) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let csv_bytes = writer.into_inner().context("failed to flush CSV buffer")?;

    let (target, body) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv_bytes)?;
        let target = if path.ends_with(".gz") {
            path.to_string()
        } else {
            format!("{path}.gz")
        };
        (target, encoder.finish()?)
    } else {
        (path.to_string(), csv_bytes)
    };

    create_parent(&target)?;
    std::fs::write(&target, body).with_context(|| format!("failed to write {target}"))?;
    info!(path = %target, rows = rows.len(), gzip, "Rows exported");
    Ok(target)
}

/// Writes the upload template CSV to `path`.
pub fn write_sample(path: &str) -> Result<()> {
    create_parent(path)?;
    std::fs::write(path, SAMPLE_CSV).with_context(|| format!("failed to write {path}"))?;
    info!(path, "Sample CSV written");
    Ok(())
}

fn create_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
