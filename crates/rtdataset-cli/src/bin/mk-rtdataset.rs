//! mk-rtdataset: describe this machine and its last cyclictest run as an RT
//! dataset document.
//!
//! ## Usage
//!
//! ```bash
//! mk-rtdataset                       # rt.json, load "idle", command from the wrapper
//! mk-rtdataset rt-cpu.json cpu       # another load scenario
//! mk-rtdataset conf.json --kind configuration
//! ```

#[path = "../common.rs"]
mod common;

use std::path::PathBuf;

use clap::Parser;
use rtdataset_core::{CollectorConfig, DocumentKind, HostProbe, collect, write_dataset};

fn parse_kind(s: &str) -> Result<DocumentKind, String> {
    DocumentKind::parse(s)
        .ok_or_else(|| format!("'{s}' is not one of dataset, configuration, cyclictest"))
}

#[derive(Parser, Debug)]
#[command(name = "mk-rtdataset")]
#[command(about = "Collect a cyclictest latency histogram and system metadata into an RT dataset document")]
#[command(version = rtdataset_core::VERSION)]
struct Cli {
    /// Document to write
    #[arg(default_value = "rt.json")]
    outfile: PathBuf,

    /// Load scenario the test ran under
    #[arg(default_value = "idle")]
    load: String,

    /// Test command line; read from the wrapper script when omitted
    cyclictest: Option<String>,

    /// Document kind: dataset (everything), configuration (metadata only)
    /// or cyclictest (capture only)
    #[arg(long, default_value = "dataset", value_parser = parse_kind)]
    kind: DocumentKind,

    /// Histogram written by `cyclictest -h`
    #[arg(long, value_name = "PATH")]
    histogram: Option<PathBuf>,

    /// Per-core maxima, one per line
    #[arg(long, value_name = "PATH")]
    maxima: Option<PathBuf>,

    /// Script that ran cyclictest
    #[arg(long, value_name = "PATH")]
    wrapper: Option<PathBuf>,

    /// Short processor descriptor
    #[arg(long, value_name = "PATH")]
    shortcpu: Option<PathBuf>,

    /// Command printing the applied kernel patches, one per line
    #[arg(long, value_name = "CMD")]
    patches_command: Option<String>,

    /// Log what was collected
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn collector_config(&self) -> CollectorConfig {
        let defaults = CollectorConfig::default();
        CollectorConfig {
            kind: self.kind,
            histogram_path: self.histogram.clone().unwrap_or(defaults.histogram_path),
            maxima_path: self.maxima.clone().unwrap_or(defaults.maxima_path),
            wrapper_path: self.wrapper.clone().unwrap_or(defaults.wrapper_path),
            shortcpu_path: self.shortcpu.clone().unwrap_or(defaults.shortcpu_path),
            patches_command: self
                .patches_command
                .clone()
                .unwrap_or(defaults.patches_command),
            load: self.load.clone(),
            cyclictest: self.cyclictest.clone(),
            ..defaults
        }
    }
}

fn main() {
    let cli = Cli::parse();
    common::init_logging(cli.verbose);

    let config = cli.collector_config();
    let doc = collect(&config, &HostProbe).unwrap_or_else(|e| common::fail(e));
    if let Err(e) = write_dataset(&cli.outfile, &doc) {
        common::fail(e);
    }
    log::info!(
        "Successfully wrote {} ({})",
        cli.outfile.display(),
        config.kind.format_name()
    );
}
