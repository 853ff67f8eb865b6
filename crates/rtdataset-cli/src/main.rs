//! plot-rtdataset: latency histograms from RT dataset documents.

mod commands;
mod common;
mod tui;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "plot-rtdataset")]
#[command(about = "Plot the per-core latency histogram of an RT dataset document")]
#[command(version = rtdataset_core::VERSION)]
struct Cli {
    /// RT dataset document to plot
    #[arg(default_value = "rt.json")]
    infile: PathBuf,

    /// Plot file; the suffix selects the format (svg is interactive).
    /// Without it the plot is shown in the terminal.
    outfile: Option<PathBuf>,

    /// Second document merged over INFILE, e.g. a cyclictest document on top
    /// of a configuration document
    #[arg(short = 'a', long = "addinput", value_name = "PATH")]
    addinput: Option<PathBuf>,

    /// Print the supported output formats and exit
    #[arg(short = 'f', long)]
    formats: bool,

    /// Show only 1/XRED of the latency range
    #[arg(short = 'r', long, value_parser = commands::parse_xred)]
    xred: Option<u32>,

    /// Log merge events and written files
    #[arg(short, long)]
    verbose: bool,

    /// Fail instead of overwriting when the added document disagrees
    #[arg(long)]
    strict_merge: bool,
}

fn main() {
    let cli = Cli::parse();
    common::init_logging(cli.verbose);

    if cli.formats {
        commands::formats::run();
        return;
    }

    commands::plot::run(commands::plot::PlotCommandConfig {
        infile: &cli.infile,
        outfile: cli.outfile.as_deref(),
        addinput: cli.addinput.as_deref(),
        xred: cli.xred.unwrap_or(1),
        strict_merge: cli.strict_merge,
    });
}
