//! # rtdataset-core
//!
//! **Real-time latency datasets, collected, merged and plotted.**
//!
//! `rtdataset-core` turns the histogram output of a `cyclictest` run plus a
//! description of the machine that ran it into a self-contained JSON document,
//! and renders those documents as per-core latency histograms.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rtdataset_core::{CollectorConfig, HostProbe, PlotModel, PlotOptions, collect};
//!
//! // Describe this machine and attach the last cyclictest capture
//! let doc = collect(&CollectorConfig::default(), &HostProbe).unwrap();
//!
//! // Plot it as an interactive SVG
//! let model = PlotModel::from_dataset(&doc, &PlotOptions::default()).unwrap();
//! rtdataset_core::write_plot(&model, "rt.svg".as_ref()).unwrap();
//! ```
//!
//! ## Architecture
//!
//! Probe → Collector → `RtDataset` → JSON → Merge → Plot model → Renderer
//!
//! Three document kinds share one schema:
//! - **Dataset**: metadata, test condition and latency samples.
//! - **Configuration**: metadata only, to be combined with a capture later.
//! - **Cyclictest**: test condition and latency samples only.
//!
//! Partial documents are combined with [`merge()`], a recursive JSON merge in
//! which the later document wins. All host access goes through the
//! [`SystemProbe`] trait so collection can run against a fake machine.

pub mod collector;
pub mod condition;
pub mod dataset;
pub mod error;
pub mod histogram;
pub mod latency;
pub mod merge;
pub mod plot;
pub mod system;

pub use collector::{CollectorConfig, collect};
pub use condition::{build_condition, command_from_wrapper};
pub use dataset::{
    Condition, DocumentKind, Format, Kernel, Latency, Processor, RtDataset, System, Timestamps,
    read_dataset, read_value, to_pretty_json, write_dataset,
};
pub use error::{DatasetError, Result};
pub use histogram::{HistogramCapture, load_histogram, parse_histogram};
pub use latency::{core_labels, core_maxima, cores_of_max, decode_cpu_list, edges, maxlat};
pub use merge::{MergeEvent, MergePolicy, merge, merged};
pub use plot::{OutputFormat, PlotModel, PlotOptions, Series, write_plot};
pub use system::{HostProbe, SystemProbe};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
