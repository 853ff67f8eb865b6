//! Best-effort access to host metadata.
//!
//! Every query may fail on a given host: the file is missing, the command is
//! not installed, `/proc` is not mounted. All of them return `Option` and the
//! collector substitutes placeholders. Nothing here is fatal.
//!
//! The [`SystemProbe`] trait is the seam between the collector and the OS so
//! that document assembly can be exercised with canned data.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use chrono::{DateTime, FixedOffset, Local};
use flate2::read::GzDecoder;

use crate::dataset::Processor;

/// Source of host facts used by the collector.
pub trait SystemProbe {
    fn hostname(&self) -> Option<String>;

    /// Kernel release, as `uname -r` prints it.
    fn kernel_release(&self) -> Option<String>;

    /// Machine hardware name, as `uname -m` prints it.
    fn machine(&self) -> Option<String>;

    /// Run a command and return its stdout if it exits successfully.
    fn run(&self, program: &str, args: &[&str]) -> Option<String>;

    fn read_text(&self, path: &Path) -> Option<String>;

    /// Read a gzip-compressed text file such as `/proc/config.gz`.
    fn read_gzip_text(&self, path: &Path) -> Option<String>;

    /// Inode change time of a file, in local time.
    fn change_time(&self, path: &Path) -> Option<DateTime<FixedOffset>>;

    fn now(&self) -> DateTime<FixedOffset>;
}

// ---------------------------------------------------------------------------
// Real host
// ---------------------------------------------------------------------------

/// Probe backed by the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

fn non_empty(s: &str) -> Option<String> {
    let v = s.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

#[cfg(unix)]
fn c_chars_to_string(chars: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `(release, machine)` from `uname(2)`.
#[cfg(unix)]
fn uname() -> Option<(String, String)> {
    // SAFETY: `utsname` is a plain C struct of char arrays, all-zero is valid.
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    // SAFETY: `uts` is a valid, writable utsname for the duration of the call.
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    Some((
        c_chars_to_string(&uts.release),
        c_chars_to_string(&uts.machine),
    ))
}

#[cfg(not(unix))]
fn uname() -> Option<(String, String)> {
    None
}

impl SystemProbe for HostProbe {
    fn hostname(&self) -> Option<String> {
        let name = hostname::get().ok()?;
        non_empty(&name.to_string_lossy())
    }

    fn kernel_release(&self) -> Option<String> {
        uname().and_then(|(release, _)| non_empty(&release))
    }

    fn machine(&self) -> Option<String> {
        uname().and_then(|(_, machine)| non_empty(&machine))
    }

    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            log::debug!("{program} exited with {}", output.status);
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn read_text(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn read_gzip_text(&self, path: &Path) -> Option<String> {
        let file = File::open(path).ok()?;
        let mut text = String::new();
        GzDecoder::new(file).read_to_string(&mut text).ok()?;
        Some(text)
    }

    #[cfg(unix)]
    fn change_time(&self, path: &Path) -> Option<DateTime<FixedOffset>> {
        use chrono::TimeZone;
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::metadata(path).ok()?;
        Local
            .timestamp_opt(meta.ctime(), 0)
            .single()
            .map(|t| t.fixed_offset())
    }

    #[cfg(not(unix))]
    fn change_time(&self, path: &Path) -> Option<DateTime<FixedOffset>> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified).fixed_offset())
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// ISO-8601 with second precision and numeric offset.
pub fn iso_seconds(t: &DateTime<FixedOffset>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Parse a "short CPU" descriptor: `<family> <vendor> <type...> @<clock> ...`.
///
/// The type is every word after the vendor up to the first word starting
/// with `@`. Returns `None` if family or vendor is missing.
pub fn parse_shortcpu(text: &str) -> Option<Processor> {
    let text = text.trim();
    let mut words = text.split_whitespace();
    let family = words.next()?.to_string();
    let vendor = words.next()?.to_string();
    let model = words
        .take_while(|w| !w.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ");
    let clock = text
        .split_once('@')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(str::to_string);
    Some(Processor {
        family,
        vendor,
        model,
        clock,
    })
}

/// Processor facts found in `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub vendor: Option<String>,
    pub model: Option<String>,
    /// Nominal clock in MHz.
    pub clock: Option<String>,
}

/// Convert a clock such as `3.20GHz` or `800MHz` to integral MHz.
fn clock_mhz(word: &str) -> Option<String> {
    if let Some(ghz) = word.strip_suffix("GHz") {
        let mhz = ghz.parse::<f64>().ok()? * 1000.0;
        return Some(format!("{}", mhz.round() as u64));
    }
    let mhz = word.strip_suffix("MHz").unwrap_or(word);
    mhz.parse::<f64>().ok().map(|v| format!("{}", v.round() as u64))
}

/// Extract vendor, type and clock from `/proc/cpuinfo`.
///
/// ARM boards report a `Hardware : <vendor> <type>` line. x86 reports
/// `model name : Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz`, where the vendor
/// is the first word without its trademark suffix and the type is the third
/// word.
pub fn parse_cpuinfo(text: &str) -> CpuInfo {
    let field = |key: &str| {
        text.lines()
            .filter(|l| l.starts_with(key))
            .find_map(|l| l.split_once(':').map(|(_, v)| v.trim().to_string()))
    };

    if let Some(hw) = field("Hardware") {
        let mut words = hw.split_whitespace();
        return CpuInfo {
            vendor: words.next().map(str::to_string),
            model: words.next().map(str::to_string),
            clock: None,
        };
    }

    let Some(model_name) = field("model name") else {
        return CpuInfo::default();
    };
    let words: Vec<&str> = model_name.split_whitespace().collect();
    let vendor = words
        .first()
        .and_then(|w| w.split('(').next())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let model = words.get(2).map(|w| w.to_string());
    let clock = words
        .iter()
        .position(|w| *w == "@")
        .and_then(|at| words.get(at + 1))
        .and_then(|w| clock_mhz(w));
    CpuInfo {
        vendor,
        model,
        clock,
    }
}

/// Patch names from the patch lister output: last path component of every
/// non-empty line. `None` when there are no patches.
pub fn patch_names(output: &str) -> Option<Vec<String>> {
    let names: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| l.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() { None } else { Some(names) }
}

/// Active options of a kernel config: no comments, no blank lines.
pub fn config_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
