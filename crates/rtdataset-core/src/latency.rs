//! Per-core latency figures and CPU affinity decoding.

use crate::dataset::Latency;
use crate::error::{DatasetError, Result};

/// Stair edges for a histogram: the bucket boundaries plus one synthetic
/// overflow edge one µs past the last bucket.
pub fn edges(boundaries: &[u64]) -> Vec<u64> {
    let mut out = boundaries.to_vec();
    if let Some(&last) = boundaries.iter().max() {
        out.push(last + 1);
    }
    out
}

/// Boundary of the last bucket with samples.
///
/// The topmost boundary is the synthetic overflow edge and is never
/// reported. Returns 0 when the core has no samples.
pub fn maxlat(boundaries: &[u64], counts: &[u64]) -> u64 {
    let Some(&top) = boundaries.iter().max() else {
        return 0;
    };
    boundaries
        .iter()
        .zip(counts)
        .take_while(|&(&b, _)| b != top)
        .filter(|&(_, &c)| c > 0)
        .map(|(&b, _)| b)
        .last()
        .unwrap_or(0)
}

/// Maximum latency of every core, taken from the stored maxima when the
/// document has them and computed from the histogram otherwise.
pub fn core_maxima(latency: &Latency) -> Vec<u64> {
    if !latency.maxima.is_empty() {
        return latency.maxima.clone();
    }
    let stairs = edges(latency.boundaries());
    (0..latency.core_count())
        .map(|n| maxlat(&stairs, latency.counts(n).unwrap_or(&[])))
        .collect()
}

/// Indices of all cores that reach the overall maximum.
pub fn cores_of_max(maxima: &[u64]) -> Vec<usize> {
    let Some(&top) = maxima.iter().max() else {
        return Vec::new();
    };
    maxima
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m == top)
        .map(|(i, _)| i)
        .collect()
}

/// Decode a CPU list such as `0,2-4` into `[0, 2, 3, 4]`.
pub fn decode_cpu_list(list: &str) -> Result<Vec<u32>> {
    let invalid = || DatasetError::InvalidCpuList(list.to_string());
    let mut cpus = Vec::new();
    for element in list.split(',') {
        match element.split_once('-') {
            Some((lo, hi)) => {
                let lo: u32 = lo.trim().parse().map_err(|_| invalid())?;
                let hi: u32 = hi.trim().parse().map_err(|_| invalid())?;
                if hi < lo {
                    return Err(invalid());
                }
                cpus.extend(lo..=hi);
            }
            None => cpus.push(element.trim().parse().map_err(|_| invalid())?),
        }
    }
    Ok(cpus)
}

/// CPU list given to cyclictest with `-aLIST` or `--affinity=LIST`.
///
/// A bare `-a` (all CPUs) yields `None`.
pub fn affinity_from_command(command: &str) -> Option<&str> {
    command.split_whitespace().find_map(|tok| {
        let list = tok
            .strip_prefix("--affinity=")
            .or_else(|| tok.strip_prefix("-a"))?;
        let valid = !list.is_empty()
            && list
                .chars()
                .all(|c| c.is_ascii_digit() || c == ',' || c == '-');
        valid.then_some(list)
    })
}

/// CPU number to show for each of `core_count` cores.
///
/// Follows the affinity list of the recorded command when there is one and
/// falls back to the column position otherwise.
pub fn core_labels(command: &str, core_count: usize) -> Vec<u32> {
    let affinity = match affinity_from_command(command).map(decode_cpu_list) {
        Some(Ok(cpus)) => cpus,
        Some(Err(e)) => {
            log::warn!("{e}, labeling cores by position");
            Vec::new()
        }
        None => Vec::new(),
    };
    (0..core_count)
        .map(|i| affinity.get(i).copied().unwrap_or(i as u32))
        .collect()
}
