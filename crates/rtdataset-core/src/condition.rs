//! Test condition: load scenario and the cyclictest invocation.

use crate::dataset::{Condition, DEFAULT_CYCLES, DEFAULT_INTERVAL};

/// Extract the test command from the wrapper script that ran it.
///
/// The wrapper sets `cycles=N` and later runs something like
/// `/usr/bin/cyclictest -l$cycles -m -Sp99 -i200 -h400 -q >$tmpfile`. The first
/// non-comment line mentioning `binary` is cut at the output redirection,
/// stripped of everything up to the last `/` before `binary`, and gets
/// `$cycles` substituted. A prefix without a directory (`chrt -f 99`) stays.
pub fn command_from_wrapper(script: &str, binary: &str) -> Option<String> {
    let mut cycles = String::new();
    for line in script.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        if let Some((_, value)) = line.split_once("cycles=") {
            cycles = value.trim().to_string();
        }
        let line = line.split('>').next().unwrap_or_default();
        let Some(pos) = line.find(binary) else {
            continue;
        };
        let start = line[..pos].rfind('/').map_or(0, |slash| slash + 1);
        let command = line[start..].replace("$cycles", &cycles);
        return Some(command.trim().to_string());
    }
    None
}

/// Numeric value of a short option written without a space (`-l1000`).
pub fn flag_value(command: &str, flag: &str) -> Option<u64> {
    command
        .split_whitespace()
        .filter_map(|tok| tok.strip_prefix(flag))
        .find_map(|v| v.parse().ok())
}

/// Build the `condition` section.
///
/// Cycles come from `-l`, else from the histogram totals, else the default.
/// The interval comes from `-i`, else the default.
pub fn build_condition(load: &str, command: &str, max_total: Option<u64>) -> Condition {
    let cycles = flag_value(command, "-l")
        .or(max_total)
        .unwrap_or(DEFAULT_CYCLES);
    let interval = flag_value(command, "-i").unwrap_or(DEFAULT_INTERVAL);
    Condition {
        load: load.to_string(),
        cycles,
        interval: Some(interval),
        cyclictest: command.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRAPPER: &str = r#"#!/bin/bash
cycles=100000000
tmpfile=/var/cache/latencyplot/histdata.txt
# cyclictest is run with fixed priority
/usr/bin/cyclictest -l$cycles -m -Sp99 -i200 -h400 -q >$tmpfile
"#;

    #[test]
    fn test_command_from_wrapper() {
        assert_eq!(
            command_from_wrapper(WRAPPER, "cyclictest").as_deref(),
            Some("cyclictest -l100000000 -m -Sp99 -i200 -h400 -q")
        );
    }

    #[test]
    fn test_command_without_directory() {
        let script = "cycles=5000\ncyclictest -l$cycles -q > /tmp/out\n";
        assert_eq!(
            command_from_wrapper(script, "cyclictest").as_deref(),
            Some("cyclictest -l5000 -q")
        );
    }

    #[test]
    fn test_command_keeps_prefix_without_directory() {
        let script = "chrt -f 99 cyclictest -l1000 -q >/tmp/out\n";
        assert_eq!(
            command_from_wrapper(script, "cyclictest").as_deref(),
            Some("chrt -f 99 cyclictest -l1000 -q")
        );
        let script = "sudo /usr/bin/cyclictest -q\n";
        assert_eq!(
            command_from_wrapper(script, "cyclictest").as_deref(),
            Some("cyclictest -q")
        );
    }

    #[test]
    fn test_command_absent() {
        assert_eq!(command_from_wrapper("echo hello\n", "cyclictest"), None);
    }

    #[test]
    fn test_flag_value() {
        let cmd = "cyclictest -l1000000 -m -Sp99 -i200 -h400 -q";
        assert_eq!(flag_value(cmd, "-l"), Some(1_000_000));
        assert_eq!(flag_value(cmd, "-i"), Some(200));
        assert_eq!(flag_value(cmd, "-x"), None);
    }

    #[test]
    fn test_build_condition_from_flags() {
        let c = build_condition("cpu", "cyclictest -l5000 -i100 -q", Some(42));
        assert_eq!(c.load, "cpu");
        assert_eq!(c.cycles, 5000);
        assert_eq!(c.interval, Some(100));
    }

    #[test]
    fn test_build_condition_falls_back() {
        let c = build_condition("idle", "cyclictest -q", Some(42));
        assert_eq!(c.cycles, 42);
        assert_eq!(c.interval, Some(DEFAULT_INTERVAL));

        let c = build_condition("idle", "", None);
        assert_eq!(c.cycles, DEFAULT_CYCLES);
        assert_eq!(c.cyclictest, "");
    }
}
