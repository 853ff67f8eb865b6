use rtdataset_core::OutputFormat;

/// One `suffix: description` line per supported plot file suffix.
pub fn format_lines() -> Vec<String> {
    OutputFormat::SUPPORTED
        .iter()
        .map(|(suffix, description)| format!("{suffix}: {description}"))
        .collect()
}

pub fn run() {
    println!("Supported output formats:");
    for line in format_lines() {
        println!("  {line}");
    }
}
