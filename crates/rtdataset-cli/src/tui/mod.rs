//! Terminal plot viewer, used when no output file is given.

pub mod app;
pub mod ui;
