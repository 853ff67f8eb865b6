//! Latency histogram plots.
//!
//! [`PlotModel`] turns a dataset into everything a chart needs (labels,
//! ranges, one stair series per core, legend highlight) without touching a
//! drawing backend. The renderers consume it:
//!
//! - [`render::render_static`]: PNG/JPEG/BMP/SVG files through `plotters`;
//! - [`interactive::render_interactive_svg`]: SVG with click-to-toggle series;
//! - the terminal viewer in the CLI crate.

pub mod interactive;
pub mod render;

use std::ops::Range;
use std::path::Path;

use plotters::style::RGBColor;

use crate::dataset::{Kernel, Processor, RtDataset, System};
use crate::error::{DatasetError, Result};
use crate::latency::{core_labels, core_maxima, cores_of_max, edges};

pub use interactive::{render_interactive_svg, write_interactive_svg};
pub use render::render_static;

/// 16 × 9 inches at 100 dpi.
pub const DEFAULT_WIDTH: u32 = 1600;
pub const DEFAULT_HEIGHT: u32 = 900;

/// Bottom of the log-scale y axis; empty buckets are drawn here.
pub const Y_FLOOR: f64 = 0.8;

pub const LEGEND_COLUMNS: usize = 6;

/// Allowed x-axis reduction factors besides 1.
pub const XRED_CHOICES: [u32; 3] = [2, 4, 8];

macro_rules! hexcolour {
    ($colour:literal) => {
        RGBColor(
            (($colour & 0xFF0000) >> 16) as u8,
            (($colour & 0x00FF00) >> 8) as u8,
            ($colour & 0x0000FF) as u8,
        )
    };
}

/// Series colours, cycled per core.
pub const COLOURS: &[RGBColor] = &[
    hexcolour!(0x1F77B4),
    hexcolour!(0xFF7F0E),
    hexcolour!(0x2CA02C),
    hexcolour!(0xD62728),
    hexcolour!(0x9467BD),
    hexcolour!(0x8C564B),
    hexcolour!(0xE377C2),
    hexcolour!(0x7F7F7F),
    hexcolour!(0xBCBD22),
    hexcolour!(0x17BECF),
];

/// Legend text colour of the cores reaching the overall maximum.
pub const HIGHLIGHT: RGBColor = hexcolour!(0xFF0000);

pub fn colour_hex(c: &RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", c.0, c.1, c.2)
}

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Interactive SVG.
    Svg,
    Png,
    Jpeg,
    Bmp,
}

impl OutputFormat {
    /// `(suffix, description)` for every accepted file name suffix.
    pub const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("bmp", "Windows Bitmap"),
        ("jpeg", "Joint Photographic Experts Group"),
        ("jpg", "Joint Photographic Experts Group"),
        ("png", "Portable Network Graphics"),
        ("svg", "Scalable Vector Graphics, interactive"),
    ];

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Format implied by the file name suffix of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_suffix(&suffix).ok_or(DatasetError::UnsupportedFormat(suffix))
    }
}

// ---------------------------------------------------------------------------
// Options and model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    /// Show only `1 / xred` of the bucket range.
    pub xred: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            xred: 1,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// One core's histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// CPU number the core was pinned to.
    pub cpu: u32,
    pub max_latency: u64,
    pub label: String,
    pub counts: Vec<u64>,
    /// This core reaches the overall maximum latency.
    pub highlighted: bool,
    pub colour: RGBColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotModel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Vertical note at the right edge of the plot.
    pub note: String,
    /// Stair edges: bucket boundaries plus the overflow edge.
    pub edges: Vec<u64>,
    pub series: Vec<Series>,
    /// Displayed x range, reduced by `xred`.
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub width: u32,
    pub height: u32,
}

/// Chart title: host, processor and kernel.
pub fn title(system: &System, processor: &Processor, kernel: &Kernel) -> String {
    let host = system.hostname.split('.').next().unwrap_or_default();
    let clock = processor
        .clock
        .as_deref()
        .filter(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit() || ch == '.'))
        .map(|c| format!(" @{c} MHz"))
        .unwrap_or_default();
    let patched = if kernel.is_patched() { "patched " } else { "" };
    format!(
        "Latency histogram of {host} with {} {}{clock} ({}), {patched}kernel {}",
        processor.vendor, processor.model, processor.family, kernel.version
    )
}

/// Legend label of the core at `position`; the first ten are padded so the
/// latency columns line up.
pub fn legend_label(position: usize, cpu: u32, max_latency: u64) -> String {
    let pad = if position < 10 { "  " } else { "" };
    format!("Core #{cpu}: {pad}{max_latency} µs")
}

/// Displayed x range: from 0 to one past the overflow edge, divided by `xred`.
pub fn x_range(edges: &[u64], xred: u32) -> Range<f64> {
    let top = edges.iter().max().map_or(1, |&m| m + 1) as f64;
    0.0..top / f64::from(xred.max(1))
}

impl PlotModel {
    pub fn from_dataset(doc: &RtDataset, options: &PlotOptions) -> Result<Self> {
        let system = doc.system()?;
        let processor = doc.processor()?;
        let kernel = doc.kernel()?;
        let condition = doc.condition()?;
        let latency = doc.latency()?;
        latency.validate()?;

        let edges = edges(latency.boundaries());
        let maxima = core_maxima(latency);
        let top_cores = cores_of_max(&maxima);
        let cpus = core_labels(&condition.cyclictest, latency.core_count());

        let series = (0..latency.core_count())
            .map(|n| {
                let max_latency = maxima.get(n).copied().unwrap_or_default();
                Series {
                    cpu: cpus[n],
                    max_latency,
                    label: legend_label(n, cpus[n], max_latency),
                    counts: latency.counts(n).unwrap_or(&[]).to_vec(),
                    highlighted: top_cores.contains(&n),
                    colour: COLOURS[n % COLOURS.len()],
                }
            })
            .collect();

        let y_top = (condition.cycles as f64).max(Y_FLOOR * 10.0);
        let origin_date = doc
            .timestamps
            .as_ref()
            .and_then(|t| t.origin.split('T').next())
            .unwrap_or("unknown date");

        Ok(Self {
            title: title(system, processor, kernel),
            x_label: format!("Latency (µs) with \"{}\"", condition.cyclictest),
            y_label: "Number of samples per latency class".to_string(),
            note: format!("Measurement on {origin_date}"),
            x_range: x_range(&edges, options.xred),
            y_range: Y_FLOOR..y_top,
            edges,
            series,
            width: options.width,
            height: options.height,
        })
    }

    /// Stair polyline of series `n` in data coordinates, over the full
    /// bucket range. Empty buckets sit on the axis floor.
    pub fn stair_points(&self, n: usize) -> Vec<(f64, f64)> {
        let Some(series) = self.series.get(n) else {
            return Vec::new();
        };
        let y = |count: u64| (count as f64).max(self.y_range.start);
        let mut points = Vec::with_capacity(series.counts.len() * 2 + 2);
        if let Some(&first) = self.edges.first() {
            points.push((first as f64, self.y_range.start));
        }
        for (i, &count) in series.counts.iter().enumerate() {
            let (Some(&lo), Some(&hi)) = (self.edges.get(i), self.edges.get(i + 1)) else {
                break;
            };
            points.push((lo as f64, y(count)));
            points.push((hi as f64, y(count)));
        }
        if let Some(&(x, _)) = points.last() {
            points.push((x, self.y_range.start));
        }
        points
    }

    /// Indices of the series whose legend text is highlighted.
    pub fn highlighted(&self) -> Vec<usize> {
        self.series
            .iter()
            .enumerate()
            .filter(|(_, s)| s.highlighted)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Cut a stair polyline at `x_max`, ending it on the boundary.
pub fn clip_stairs(points: &[(f64, f64)], x_max: f64) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(points.len());
    for &(x, y) in points {
        if x <= x_max {
            out.push((x, y));
            continue;
        }
        if let Some(&(px, py)) = out.last()
            && px < x_max
        {
            out.push((x_max, py));
        }
        break;
    }
    out
}

// ---------------------------------------------------------------------------
// Legend layout
// ---------------------------------------------------------------------------

/// Approximate advance of one legend character at [`LEGEND_FONT_SIZE`].
const CHAR_WIDTH: i32 = 7;
pub const LEGEND_FONT_SIZE: u32 = 13;
pub const SWATCH_LENGTH: i32 = 28;
const SWATCH_GAP: i32 = 8;
const ROW_HEIGHT: i32 = 20;
const PADDING: i32 = 10;

/// Pixel positions of legend entries: a grid of up to [`LEGEND_COLUMNS`]
/// columns in the upper right corner of the plot area, filled column by
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendLayout {
    pub entries: usize,
    pub columns: usize,
    pub rows: usize,
    pub column_width: i32,
    pub row_height: i32,
    /// Top-left corner of the legend frame.
    pub origin: (i32, i32),
}

impl LegendLayout {
    pub fn new(entries: usize, longest_label: usize, plot_x: &Range<i32>, plot_y: &Range<i32>) -> Self {
        let columns = entries.clamp(1, LEGEND_COLUMNS);
        let rows = entries.div_ceil(columns).max(1);
        let column_width = SWATCH_LENGTH + SWATCH_GAP + longest_label as i32 * CHAR_WIDTH + PADDING * 2;
        let width = column_width * columns as i32 + PADDING;
        let origin = (
            (plot_x.end - width - PADDING).max(plot_x.start),
            plot_y.start + PADDING,
        );
        Self {
            entries,
            columns,
            rows,
            column_width,
            row_height: ROW_HEIGHT,
            origin,
        }
    }

    /// Frame as `(x, y, width, height)`.
    pub fn frame(&self) -> (i32, i32, i32, i32) {
        (
            self.origin.0,
            self.origin.1,
            self.column_width * self.columns as i32 + PADDING,
            self.row_height * self.rows as i32 + PADDING,
        )
    }

    /// Vertical centre line and left edge of entry `i`.
    pub fn entry(&self, i: usize) -> (i32, i32) {
        let col = (i / self.rows) as i32;
        let row = (i % self.rows) as i32;
        (
            self.origin.0 + PADDING + col * self.column_width,
            self.origin.1 + PADDING / 2 + row * self.row_height + self.row_height / 2,
        )
    }

    /// Left edge of the text of entry `i`.
    pub fn text_x(&self, i: usize) -> i32 {
        self.entry(i).0 + SWATCH_LENGTH + SWATCH_GAP
    }
}

fn longest_label(model: &PlotModel) -> usize {
    model
        .series
        .iter()
        .map(|s| s.label.chars().count())
        .max()
        .unwrap_or(0)
}

pub(crate) fn legend_layout(model: &PlotModel, plot_x: &Range<i32>, plot_y: &Range<i32>) -> LegendLayout {
    LegendLayout::new(model.series.len(), longest_label(model), plot_x, plot_y)
}

/// Write the plot to `path`, interactive when the suffix is `svg`.
pub fn write_plot(model: &PlotModel, path: &Path) -> Result<OutputFormat> {
    let format = OutputFormat::from_path(path)?;
    match format {
        OutputFormat::Svg => write_interactive_svg(model, path)?,
        _ => render_static(model, path)?,
    }
    Ok(format)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::{Condition, DocumentKind, GRANULARITY, Latency, Timestamps};

    pub(crate) fn sample_doc() -> RtDataset {
        let mut doc = RtDataset::new(DocumentKind::Dataset);
        doc.timestamps = Some(Timestamps {
            origin: "2023-05-04T10:11:12+02:00".into(),
            dataset: "2023-05-04T11:00:00+02:00".into(),
        });
        doc.system = Some(System {
            hostname: "rack4slot1.osadl.org".into(),
        });
        doc.processor = Some(Processor {
            family: "x86".into(),
            vendor: "Intel".into(),
            model: "Core i7-8700".into(),
            clock: Some("3200".into()),
        });
        doc.kernel = Some(Kernel {
            version: "6.6.0-rt15".into(),
            patches: Some(vec!["0001-rt.patch".into()]),
            config: Vec::new(),
            cmdline: String::new(),
        });
        doc.condition = Some(Condition {
            load: "idle".into(),
            cycles: 1000,
            interval: Some(200),
            cyclictest: "cyclictest -l1000 -m -Sp99 -i200 -a0,2-3 -h400 -q".into(),
        });
        doc.latency = Some(Latency {
            granularity: GRANULARITY.into(),
            cores: vec![
                vec![0, 1, 2, 3, 4, 5, 6, 7],
                vec![0, 5, 9, 1, 0, 0, 0, 0],
                vec![0, 2, 7, 4, 2, 0, 0, 0],
                vec![0, 0, 8, 6, 1, 0, 0, 0],
            ],
            maxima: Vec::new(),
        });
        doc
    }

    #[test]
    fn test_title() {
        let doc = sample_doc();
        assert_eq!(
            title(
                doc.system().unwrap(),
                doc.processor().unwrap(),
                doc.kernel().unwrap()
            ),
            "Latency histogram of rack4slot1 with Intel Core i7-8700 @3200 MHz (x86), patched kernel 6.6.0-rt15"
        );
    }

    #[test]
    fn test_title_skips_placeholder_clock() {
        let doc = sample_doc();
        let mut p = doc.processor().unwrap().clone();
        p.clock = Some(crate::dataset::PLACEHOLDER.into());
        let mut k = doc.kernel().unwrap().clone();
        k.patches = None;
        let t = title(doc.system().unwrap(), &p, &k);
        assert!(!t.contains("MHz"));
        assert!(t.ends_with("(x86), kernel 6.6.0-rt15"));
    }

    #[test]
    fn test_legend_label_padding() {
        assert_eq!(legend_label(0, 3, 17), "Core #3:   17 µs");
        assert_eq!(legend_label(10, 10, 17), "Core #10: 17 µs");
    }

    #[test]
    fn test_model_from_dataset() {
        let model = PlotModel::from_dataset(&sample_doc(), &PlotOptions::default()).unwrap();
        assert_eq!(model.series.len(), 3);
        assert_eq!(model.edges, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let cpus: Vec<u32> = model.series.iter().map(|s| s.cpu).collect();
        assert_eq!(cpus, vec![0, 2, 3]);
        let maxima: Vec<u64> = model.series.iter().map(|s| s.max_latency).collect();
        assert_eq!(maxima, vec![3, 4, 4]);
        assert_eq!(model.highlighted(), vec![1, 2]);
        assert_eq!(model.note, "Measurement on 2023-05-04");
        assert_eq!(model.y_range, Y_FLOOR..1000.0);
        assert!(model.x_label.starts_with("Latency (µs) with \"cyclictest"));
    }

    #[test]
    fn test_model_requires_latency() {
        let mut doc = sample_doc();
        doc.latency = None;
        assert!(matches!(
            PlotModel::from_dataset(&doc, &PlotOptions::default()),
            Err(DatasetError::MissingSection("latency"))
        ));
    }

    #[test]
    fn test_xred_reduces_range_but_keeps_data() {
        let full = PlotModel::from_dataset(&sample_doc(), &PlotOptions::default()).unwrap();
        let options = PlotOptions {
            xred: 4,
            ..Default::default()
        };
        let reduced = PlotModel::from_dataset(&sample_doc(), &options).unwrap();
        assert_eq!(full.x_range.end, 9.0);
        assert_eq!(reduced.x_range.end, full.x_range.end / 4.0);
        for n in 0..full.series.len() {
            assert_eq!(reduced.series[n].counts, full.series[n].counts);
            assert_eq!(reduced.stair_points(n), full.stair_points(n));
        }
    }

    #[test]
    fn test_stair_points() {
        let model = PlotModel::from_dataset(&sample_doc(), &PlotOptions::default()).unwrap();
        let pts = model.stair_points(0);
        assert_eq!(pts.first(), Some(&(0.0, Y_FLOOR)));
        assert_eq!(pts[1], (0.0, Y_FLOOR));
        assert_eq!(pts[3], (1.0, 5.0));
        assert_eq!(pts[4], (2.0, 5.0));
        assert_eq!(pts.last(), Some(&(8.0, Y_FLOOR)));
        assert_eq!(pts.len(), 8 * 2 + 2);
        assert!(model.stair_points(99).is_empty());
    }

    #[test]
    fn test_clip_stairs() {
        let pts = vec![(0.0, 1.0), (0.0, 5.0), (2.0, 5.0), (2.0, 3.0), (4.0, 3.0)];
        assert_eq!(
            clip_stairs(&pts, 3.0),
            vec![(0.0, 1.0), (0.0, 5.0), (2.0, 5.0), (2.0, 3.0), (3.0, 3.0)]
        );
        assert_eq!(clip_stairs(&pts, 10.0), pts);
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("plot.svg")).unwrap(),
            OutputFormat::Svg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.JPG")).unwrap(),
            OutputFormat::Jpeg
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("plot.pdf")),
            Err(DatasetError::UnsupportedFormat(s)) if s == "pdf"
        ));
        assert!(OutputFormat::from_path(Path::new("plot")).is_err());
    }

    #[test]
    fn test_legend_layout_fills_columns_first() {
        let layout = LegendLayout::new(8, 16, &(100..1500), &(50..800));
        assert_eq!(layout.columns, 6);
        assert_eq!(layout.rows, 2);
        let (x0, y0) = layout.entry(0);
        let (x1, y1) = layout.entry(1);
        let (x2, _) = layout.entry(2);
        assert_eq!(x0, x1);
        assert!(y1 > y0);
        assert!(x2 > x0);
        let (fx, fy, fw, _) = layout.frame();
        assert!(fx + fw <= 1500);
        assert!(fy >= 50);
    }

    #[test]
    fn test_colour_hex() {
        assert_eq!(colour_hex(&COLOURS[0]), "#1f77b4");
        assert_eq!(colour_hex(&HIGHLIGHT), "#ff0000");
    }
}
