//! Startup and exit handling shared by `plot-rtdataset` and `mk-rtdataset`.

fn default_level(verbose: bool) -> &'static str {
    if verbose { "info" } else { "warn" }
}

/// `warn` by default, `info` with `-v`; `RUST_LOG` overrides both.
pub fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level(verbose)),
    )
    .format_target(false)
    .init();
}

/// Print a diagnostic to stdout and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    println!("{message}");
    std::process::exit(1);
}
