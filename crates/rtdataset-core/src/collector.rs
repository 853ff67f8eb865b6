//! Assemble an RT dataset document from the host and a histogram capture.

use std::path::{Path, PathBuf};

use crate::condition::{build_condition, command_from_wrapper};
use crate::dataset::{
    DocumentKind, Kernel, PLACEHOLDER, Processor, RtDataset, System, Timestamps,
};
use crate::error::Result;
use crate::histogram::{HistogramCapture, load_histogram};
use crate::system::{SystemProbe, config_lines, iso_seconds, parse_cpuinfo, parse_shortcpu, patch_names};

/// Where the collector looks for its inputs.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub kind: DocumentKind,
    /// Raw `cyclictest -h` output.
    pub histogram_path: PathBuf,
    /// One maximum per line, used when the histogram has no maxima trailer.
    pub maxima_path: PathBuf,
    /// Script that ran cyclictest; scanned for the command line.
    pub wrapper_path: PathBuf,
    /// Vendor-formatted processor descriptor.
    pub shortcpu_path: PathBuf,
    pub cpuinfo_path: PathBuf,
    pub cmdline_path: PathBuf,
    pub kernel_config_gz_path: PathBuf,
    /// Directory holding `config-<release>` files.
    pub boot_dir: PathBuf,
    /// Prints one applied kernel patch per line.
    pub patches_command: String,
    /// Name of the latency test binary inside the wrapper script.
    pub test_binary: String,
    pub load: String,
    /// Command line of the capture; discovered from the wrapper when `None`.
    pub cyclictest: Option<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            kind: DocumentKind::Dataset,
            histogram_path: PathBuf::from("/var/cache/latencyplot/histdata.txt"),
            maxima_path: PathBuf::from("/var/cache/latencyplot/histmax.txt"),
            wrapper_path: PathBuf::from("/usr/local/bin/latencyplot"),
            shortcpu_path: PathBuf::from("/etc/qafarm/shortcpu"),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
            cmdline_path: PathBuf::from("/proc/cmdline"),
            kernel_config_gz_path: PathBuf::from("/proc/config.gz"),
            boot_dir: PathBuf::from("/boot"),
            patches_command: "getpatches".to_string(),
            test_binary: "cyclictest".to_string(),
            load: "idle".to_string(),
            cyclictest: None,
        }
    }
}

fn placeholder() -> String {
    PLACEHOLDER.to_string()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

pub fn detect_system(probe: &dyn SystemProbe) -> System {
    System {
        hostname: probe.hostname().unwrap_or_else(|| {
            log::warn!("hostname not available");
            placeholder()
        }),
    }
}

/// Processor from the short CPU descriptor, else from architecture and
/// `/proc/cpuinfo`.
pub fn detect_processor(probe: &dyn SystemProbe, config: &CollectorConfig) -> Processor {
    if let Some(p) = probe
        .read_text(&config.shortcpu_path)
        .and_then(|text| parse_shortcpu(&text))
    {
        return p;
    }
    log::debug!(
        "{} not usable, deriving processor from machine and cpuinfo",
        config.shortcpu_path.display()
    );

    let info = probe
        .read_text(&config.cpuinfo_path)
        .map(|text| parse_cpuinfo(&text))
        .unwrap_or_default();
    Processor {
        family: probe.machine().unwrap_or_else(placeholder),
        vendor: info.vendor.unwrap_or_else(placeholder),
        model: info.model.unwrap_or_else(placeholder),
        clock: info.clock,
    }
}

fn kernel_config(probe: &dyn SystemProbe, config: &CollectorConfig, release: &str) -> Vec<String> {
    if let Some(text) = probe.read_gzip_text(&config.kernel_config_gz_path) {
        return config_lines(&text);
    }
    let boot_config = config.boot_dir.join(format!("config-{release}"));
    match probe.read_text(&boot_config) {
        Some(text) => config_lines(&text),
        None => {
            log::warn!(
                "neither {} nor {} readable, kernel config left empty",
                config.kernel_config_gz_path.display(),
                boot_config.display()
            );
            Vec::new()
        }
    }
}

pub fn detect_kernel(probe: &dyn SystemProbe, config: &CollectorConfig) -> Kernel {
    let version = probe.kernel_release().unwrap_or_else(placeholder);
    let patches = probe
        .run(&config.patches_command, &[])
        .and_then(|out| patch_names(&out));
    let kernel_config = kernel_config(probe, config, &version);
    let cmdline = probe
        .read_text(&config.cmdline_path)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(placeholder);
    Kernel {
        version,
        patches,
        config: kernel_config,
        cmdline,
    }
}

/// The recorded cyclictest command: explicit override, else the wrapper.
pub fn detect_command(probe: &dyn SystemProbe, config: &CollectorConfig) -> String {
    if let Some(cmd) = &config.cyclictest {
        return cmd.clone();
    }
    match probe.read_text(&config.wrapper_path) {
        Some(script) => command_from_wrapper(&script, &config.test_binary).unwrap_or_else(|| {
            log::warn!(
                "no {} invocation in {}",
                config.test_binary,
                config.wrapper_path.display()
            );
            String::new()
        }),
        None => {
            log::warn!("{} not found", config.wrapper_path.display());
            String::new()
        }
    }
}

fn timestamps(probe: &dyn SystemProbe, histogram: &Path) -> Timestamps {
    let now = probe.now();
    let origin = probe.change_time(histogram).unwrap_or(now);
    Timestamps {
        origin: iso_seconds(&origin),
        dataset: iso_seconds(&now),
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Build the document described by `config.kind`.
///
/// Only the histogram is mandatory, and only for kinds that carry a capture.
pub fn collect(config: &CollectorConfig, probe: &dyn SystemProbe) -> Result<RtDataset> {
    let mut doc = RtDataset::new(config.kind);

    let capture: Option<HistogramCapture> = if config.kind.has_capture() {
        Some(load_histogram(
            &config.histogram_path,
            Some(&config.maxima_path),
        )?)
    } else {
        None
    };

    if let Some(capture) = capture {
        doc.timestamps = Some(timestamps(probe, &config.histogram_path));
        let command = detect_command(probe, config);
        doc.condition = Some(build_condition(
            &config.load,
            &command,
            capture.max_total(),
        ));
        let latency = capture.into_latency();
        if latency.cores.is_empty() {
            log::warn!(
                "{} holds no histogram rows, writing an empty latency section",
                config.histogram_path.display()
            );
        } else {
            latency.validate()?;
        }
        doc.latency = Some(latency);
    }

    if config.kind.has_metadata() {
        doc.system = Some(detect_system(probe));
        doc.processor = Some(detect_processor(probe, config));
        doc.kernel = Some(detect_kernel(probe, config));
    }

    Ok(doc)
}
