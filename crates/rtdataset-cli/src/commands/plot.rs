use std::path::Path;

use rtdataset_core::{
    MergePolicy, PlotModel, PlotOptions, Result, RtDataset, merge, read_value, write_plot,
};

use crate::common::fail;

pub struct PlotCommandConfig<'a> {
    pub infile: &'a Path,
    pub outfile: Option<&'a Path>,
    pub addinput: Option<&'a Path>,
    pub xred: u32,
    pub strict_merge: bool,
}

/// Read `infile`, merge `addinput` over it and decode the result.
pub fn load(config: &PlotCommandConfig) -> Result<RtDataset> {
    let mut value = read_value(config.infile)?;
    if let Some(add) = config.addinput {
        let policy = if config.strict_merge {
            MergePolicy::Reject
        } else {
            MergePolicy::Overwrite
        };
        let events = merge(&mut value, &read_value(add)?, policy)?;
        for event in &events {
            log::info!("{event}");
        }
        log::info!(
            "Merged {} into {} ({} changes)",
            add.display(),
            config.infile.display(),
            events.len()
        );
    }
    RtDataset::from_value(value)
}

pub fn run(config: PlotCommandConfig) {
    let doc = load(&config).unwrap_or_else(|e| fail(e));
    let options = PlotOptions {
        xred: config.xred,
        ..Default::default()
    };
    let model = PlotModel::from_dataset(&doc, &options).unwrap_or_else(|e| fail(e));

    match config.outfile {
        Some(path) => match write_plot(&model, path) {
            Ok(format) => log::info!("Successfully wrote {} ({format:?})", path.display()),
            Err(e) => fail(format!("Could not write {}: {e}", path.display())),
        },
        None => {
            let mut app = crate::tui::app::App::new(model);
            if let Err(e) = app.run() {
                fail(format!("TUI error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtdataset_core::DatasetError;
    use std::fs;

    fn write(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, json).unwrap();
        path
    }

    fn config<'a>(infile: &'a Path, addinput: Option<&'a Path>, strict: bool) -> PlotCommandConfig<'a> {
        PlotCommandConfig {
            infile,
            outfile: None,
            addinput,
            xred: 1,
            strict_merge: strict,
        }
    }

    #[test]
    fn test_load_merges_addinput() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "conf.json",
            r#"{"system": {"hostname": "a"}, "condition": {"load": "idle", "cycles": 10, "cyclictest": ""}}"#,
        );
        let b = write(
            dir.path(),
            "test.json",
            r#"{"condition": {"load": "cpu", "cycles": 10, "cyclictest": ""}}"#,
        );
        let doc = load(&config(&a, Some(&b), false)).unwrap();
        assert_eq!(doc.system().unwrap().hostname, "a");
        assert_eq!(doc.condition().unwrap().load, "cpu");
    }

    #[test]
    fn test_load_strict_merge_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.json", r#"{"system": {"hostname": "a"}}"#);
        let b = write(dir.path(), "b.json", r#"{"system": {"hostname": "b"}}"#);
        assert!(matches!(
            load(&config(&a, Some(&b), true)),
            Err(DatasetError::MergeConflict { .. })
        ));
    }

    #[test]
    fn test_load_reports_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load(&config(&missing, None, false)),
            Err(DatasetError::Io { .. })
        ));
        let broken = write(dir.path(), "broken.json", "{ not json");
        assert!(matches!(
            load(&config(&broken, None, false)),
            Err(DatasetError::Json { .. })
        ));
    }
}
