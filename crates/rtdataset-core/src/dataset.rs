//! The RT dataset document.
//!
//! One JSON object per capture, the only contract between `mk-rtdataset` and
//! `plot-rtdataset`. Historical documents omit some keys (`maxima`,
//! `patches`, `clock`) and partial documents omit whole sections, so every
//! section is optional on the way in. Consumers ask for the section they need
//! and get [`DatasetError::MissingSection`] if it is absent.
//!
//! # Layout
//!
//! ```text
//! {
//!     "format":     { "name": "RT Dataset", "version": "1.0" },
//!     "timestamps": { "origin": "...", "dataset": "..." },
//!     "system":     { "hostname": "..." },
//!     "processor":  { "family": "...", "vendor": "...", "type": "...", "clock": "..." },
//!     "kernel":     { "version": "...", "patches": [...], "config": [...], "cmdline": "..." },
//!     "condition":  { "load": "idle", "cycles": 100000000, "interval": 200, "cyclictest": "..." },
//!     "latency":    { "granularity": "microseconds", "cores": [[...], ...], "maxima": [...] }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DatasetError, Result};

/// Value stored for metadata that could not be discovered on this host.
pub const PLACEHOLDER: &str = "Not available, to be manually set";

/// The only latency granularity cyclictest histograms use.
pub const GRANULARITY: &str = "microseconds";

/// Document format version written by this crate.
pub const FORMAT_VERSION: &str = "1.0";

/// Cycle count assumed when neither the command line nor the histogram says.
pub const DEFAULT_CYCLES: u64 = 100_000_000;

/// Cyclictest interval (µs) assumed when the command line has no `-i`.
pub const DEFAULT_INTERVAL: u64 = 200;

// ---------------------------------------------------------------------------
// Document kind
// ---------------------------------------------------------------------------

/// Which sections a collected document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    /// Everything: metadata, test condition and latency samples.
    #[default]
    Dataset,
    /// Host metadata only (system, processor, kernel).
    Configuration,
    /// Test capture only (timestamps, condition, latency).
    Cyclictest,
}

impl DocumentKind {
    pub fn format_name(self) -> &'static str {
        match self {
            Self::Dataset => "RT Dataset",
            Self::Configuration => "RT Configuration",
            Self::Cyclictest => "RT Cyclictest",
        }
    }

    pub fn has_metadata(self) -> bool {
        matches!(self, Self::Dataset | Self::Configuration)
    }

    pub fn has_capture(self) -> bool {
        matches!(self, Self::Dataset | Self::Cyclictest)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dataset" => Some(Self::Dataset),
            "configuration" | "conf" => Some(Self::Configuration),
            "cyclictest" | "test" => Some(Self::Cyclictest),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub name: String,
    pub version: String,
}

impl Format {
    pub fn of(kind: DocumentKind) -> Self {
        Self {
            name: kind.format_name().to_string(),
            version: FORMAT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// When the raw latency capture was produced.
    pub origin: String,
    /// When this document was generated.
    pub dataset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    pub family: String,
    pub vendor: String,
    #[serde(rename = "type")]
    pub model: String,
    /// Clock in MHz, as text. Absent when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kernel {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<String>>,
    #[serde(default)]
    pub config: Vec<String>,
    #[serde(default)]
    pub cmdline: String,
}

impl Kernel {
    pub fn is_patched(&self) -> bool {
        self.patches.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub load: String,
    #[serde(default = "default_cycles")]
    pub cycles: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default)]
    pub cyclictest: String,
}

fn default_cycles() -> u64 {
    DEFAULT_CYCLES
}

/// Latency histogram, stored column-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Latency {
    pub granularity: String,
    /// `cores[0]` holds bucket boundaries, `cores[i]` the counts of core `i - 1`.
    pub cores: Vec<Vec<u64>>,
    #[serde(default)]
    pub maxima: Vec<u64>,
}

impl Latency {
    pub fn boundaries(&self) -> &[u64] {
        self.cores.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of CPU cores with sample columns.
    pub fn core_count(&self) -> usize {
        self.cores.len().saturating_sub(1)
    }

    /// Sample counts of the `n`-th core (zero based).
    pub fn counts(&self, n: usize) -> Option<&[u64]> {
        self.cores.get(n + 1).map(Vec::as_slice)
    }

    /// Check the column invariants: aligned lengths, strictly increasing
    /// boundaries, one maximum per core when maxima are present.
    pub fn validate(&self) -> Result<()> {
        let boundaries = self.boundaries();
        if boundaries.is_empty() {
            return Err(DatasetError::InvalidLatency(
                "no bucket boundaries".to_string(),
            ));
        }
        if let Some(w) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DatasetError::InvalidLatency(format!(
                "bucket boundaries not increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        for (i, core) in self.cores.iter().enumerate().skip(1) {
            if core.len() != boundaries.len() {
                return Err(DatasetError::InvalidLatency(format!(
                    "core {} has {} buckets, expected {}",
                    i - 1,
                    core.len(),
                    boundaries.len()
                )));
            }
        }
        if !self.maxima.is_empty() && self.maxima.len() != self.core_count() {
            return Err(DatasetError::InvalidLatency(format!(
                "{} maxima for {} cores",
                self.maxima.len(),
                self.core_count()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
    #[serde(
        rename = "format-conf",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format_conf: Option<Format>,
    #[serde(
        rename = "format-test",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format_test: Option<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Timestamps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<System>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<Processor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<Kernel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<Latency>,
}

impl RtDataset {
    /// Empty document stamped with the format marker of `kind`.
    pub fn new(kind: DocumentKind) -> Self {
        let mut doc = Self::default();
        let format = Some(Format::of(kind));
        match kind {
            DocumentKind::Dataset => doc.format = format,
            DocumentKind::Configuration => doc.format_conf = format,
            DocumentKind::Cyclictest => doc.format_test = format,
        }
        doc
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn system(&self) -> Result<&System> {
        self.system
            .as_ref()
            .ok_or(DatasetError::MissingSection("system"))
    }

    pub fn processor(&self) -> Result<&Processor> {
        self.processor
            .as_ref()
            .ok_or(DatasetError::MissingSection("processor"))
    }

    pub fn kernel(&self) -> Result<&Kernel> {
        self.kernel
            .as_ref()
            .ok_or(DatasetError::MissingSection("kernel"))
    }

    pub fn condition(&self) -> Result<&Condition> {
        self.condition
            .as_ref()
            .ok_or(DatasetError::MissingSection("condition"))
    }

    pub fn latency(&self) -> Result<&Latency> {
        self.latency
            .as_ref()
            .ok_or(DatasetError::MissingSection("latency"))
    }

    /// Validate the latency section if there is one.
    pub fn validate(&self) -> Result<()> {
        match &self.latency {
            Some(latency) => latency.validate(),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read a document as raw JSON, ready to be merged.
pub fn read_value(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_dataset(path: &Path) -> Result<RtDataset> {
    let value = read_value(path)?;
    serde_json::from_value(value).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize with 4-space indentation, the layout of historical datasets.
pub fn to_pretty_json(doc: &RtDataset) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_dataset(path: &Path, doc: &RtDataset) -> Result<()> {
    let json = to_pretty_json(doc)?;
    fs::write(path, json).map_err(|e| DatasetError::io(path, e))
}
