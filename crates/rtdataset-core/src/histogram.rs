//! Cyclictest histogram loader.
//!
//! `cyclictest -h` writes one row per latency bucket: the bucket boundary in
//! µs followed by one sample count per measured CPU, separated by tabs. The
//! trailer comments carry per-core totals and maxima:
//!
//! ```text
//! 000000 000000   000000
//! 000001 000012   000003
//! # Total: 000000012 000000003
//! # Max Latencies: 00001 00001
//! ```
//!
//! Rows are transposed into columns, matching the `latency.cores` layout of
//! the RT dataset document.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::dataset::{GRANULARITY, Latency};
use crate::error::{DatasetError, Result};

const MAX_LATENCIES: &str = "# Max Latencies:";
const TOTAL: &str = "# Total:";

/// A parsed histogram capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistogramCapture {
    /// Column-wise data: boundaries first, then one column per core.
    pub cores: Vec<Vec<u64>>,
    /// Per-core maxima from the `# Max Latencies:` trailer or the maxima file.
    pub maxima: Vec<u64>,
    /// Per-core sample totals from the `# Total:` trailer.
    pub totals: Vec<u64>,
}

impl HistogramCapture {
    /// Largest per-core total, i.e. the number of loops the test ran.
    pub fn max_total(&self) -> Option<u64> {
        self.totals.iter().copied().max()
    }

    pub fn into_latency(self) -> Latency {
        Latency {
            granularity: GRANULARITY.to_string(),
            cores: self.cores,
            maxima: self.maxima,
        }
    }
}

fn parse_values(line_no: usize, text: &str) -> Result<Vec<u64>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<u64>().map_err(|_| DatasetError::InvalidHistogram {
                line: line_no,
                reason: format!("'{tok}' is not a non-negative integer"),
            })
        })
        .collect()
}

/// Parse histogram text.
pub fn parse_histogram(text: &str) -> Result<HistogramCapture> {
    let mut capture = HistogramCapture::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(MAX_LATENCIES) {
            capture.maxima.extend(parse_values(line_no, rest)?);
            continue;
        }
        if let Some(rest) = line.strip_prefix(TOTAL) {
            capture.totals.extend(parse_values(line_no, rest)?);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let values = parse_values(line_no, line)?;
        if capture.cores.is_empty() {
            capture.cores = values.into_iter().map(|v| vec![v]).collect();
            continue;
        }
        if values.len() != capture.cores.len() {
            return Err(DatasetError::InvalidHistogram {
                line: line_no,
                reason: format!(
                    "{} columns, expected {}",
                    values.len(),
                    capture.cores.len()
                ),
            });
        }
        let prev = capture.cores[0].last().copied().unwrap_or_default();
        if values[0] <= prev {
            return Err(DatasetError::InvalidHistogram {
                line: line_no,
                reason: format!("bucket {} does not follow bucket {prev}", values[0]),
            });
        }
        for (column, value) in capture.cores.iter_mut().zip(values) {
            column.push(value);
        }
    }

    Ok(capture)
}

/// Parse a maxima file: one integer per line.
pub fn parse_maxima(text: &str) -> Result<Vec<u64>> {
    let mut maxima = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        maxima.push(
            line.parse()
                .map_err(|_| DatasetError::InvalidHistogram {
                    line: idx + 1,
                    reason: format!("maximum '{line}' is not an integer"),
                })?,
        );
    }
    Ok(maxima)
}

/// Load a histogram capture from disk.
///
/// A missing histogram is fatal. The maxima file is consulted only when the
/// histogram carries no `# Max Latencies:` trailer, and its absence is not an
/// error.
pub fn load_histogram(path: &Path, maxima_path: Option<&Path>) -> Result<HistogramCapture> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DatasetError::HistogramMissing(path.to_path_buf()));
        }
        Err(e) => return Err(DatasetError::io(path, e)),
    };
    let mut capture = parse_histogram(&text)?;
    log::debug!(
        "{}: {} buckets, {} cores",
        path.display(),
        capture.cores.first().map_or(0, Vec::len),
        capture.cores.len().saturating_sub(1)
    );

    if capture.maxima.is_empty()
        && let Some(maxima_path) = maxima_path
    {
        match fs::read_to_string(maxima_path) {
            Ok(text) => capture.maxima.extend(parse_maxima(&text)?),
            Err(e) => log::warn!("{}: {e}, maxima left empty", maxima_path.display()),
        }
    }

    Ok(capture)
}
