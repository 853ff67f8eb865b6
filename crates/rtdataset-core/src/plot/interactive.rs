//! Interactive SVG output.
//!
//! The frame (axes, labels, title, note) comes from `plotters` and is nested
//! unchanged. Series and legend entries are written here with stable ids so
//! the embedded script can find them:
//!
//! | element        | id                  | hidden opacity |
//! |----------------|---------------------|----------------|
//! | stair path     | `series-N`          | 0              |
//! | legend text    | `legend-text-N`     | 0.5            |
//! | legend swatch  | `legend-swatch-N`   | 0.3            |
//! | legend entry   | `legend-entry-N`    |                |
//!
//! Click toggles one series, Ctrl+click shows only that series and
//! Shift+click shows all. The plot area is clipped, so every bucket stays in
//! the document even when the visible x range is reduced.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use plotters::prelude::*;

use super::render::{FrameGeometry, draw_frame, plot_err};
use super::{HIGHLIGHT, LEGEND_FONT_SIZE, PlotModel, SWATCH_LENGTH, colour_hex, legend_layout};
use crate::error::{DatasetError, Result};

const STYLE: &str = "\
.series, .legend-text, .legend-swatch { transition: opacity 0.2s; }
.legend-entry { cursor: pointer; }
.legend-text { font-family: sans-serif; font-size: 13px; }
";

const SCRIPT: &str = r#"
(function () {
    var TEXT_DIMMED = 0.5, SWATCH_DIMMED = 0.3;
    function part(kind, i) { return document.getElementById(kind + '-' + i); }
    function count() { return document.querySelectorAll('.series').length; }
    function shown(i) { return part('series', i).style.opacity !== '0'; }
    function show(i, on) {
        part('series', i).style.opacity = on ? 1 : 0;
        part('legend-text', i).style.opacity = on ? 1 : TEXT_DIMMED;
        part('legend-swatch', i).style.opacity = on ? 1 : SWATCH_DIMMED;
    }
    function isolate(i) { for (var j = 0, n = count(); j < n; j++) show(j, j === i); }
    function showAll() { for (var j = 0, n = count(); j < n; j++) show(j, true); }
    var entries = document.querySelectorAll('.legend-entry');
    for (var k = 0; k < entries.length; k++) {
        entries[k].addEventListener('click', function (event) {
            var i = parseInt(this.getAttribute('data-series'), 10);
            if (event.ctrlKey) { isolate(i); }
            else if (event.shiftKey) { showAll(); }
            else { show(i, !shown(i)); }
        });
    }
})();
"#;

pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn path_data(points: &[(i32, i32)]) -> String {
    let mut d = String::with_capacity(points.len() * 10);
    for (i, (x, y)) in points.iter().enumerate() {
        let op = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{op}{x} {y} ");
    }
    d.trim_end().to_string()
}

/// Assemble the interactive document from a rendered `frame` and its
/// geometry.
pub fn compose_interactive_svg(model: &PlotModel, frame: &str, geometry: &FrameGeometry) -> String {
    let (w, h) = (model.width, model.height);
    let (px, py) = (&geometry.plot_x, &geometry.plot_y);
    let frame = frame.trim_start();
    let frame = match frame.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map_or(rest, |(_, body)| body),
        None => frame,
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="rt-latency-plot">"#
    );
    let _ = writeln!(svg, "<title>{}</title>", xml_escape(&model.title));
    let _ = writeln!(svg, "<style>{STYLE}</style>");
    let _ = writeln!(
        svg,
        r#"<defs><clipPath id="plot-area"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
        px.start,
        py.start,
        px.end - px.start,
        py.end - py.start
    );
    svg.push_str(frame.trim());
    svg.push('\n');

    svg.push_str("<g id=\"series\" clip-path=\"url(#plot-area)\">\n");
    for (i, (s, points)) in model.series.iter().zip(&geometry.series).enumerate() {
        let _ = writeln!(
            svg,
            r#"<path id="series-{i}" class="series" d="{}" fill="none" stroke="{}" stroke-width="1"/>"#,
            path_data(points),
            colour_hex(&s.colour)
        );
    }
    svg.push_str("</g>\n");

    let layout = legend_layout(model, px, py);
    let (lx, ly, lw, lh) = layout.frame();
    svg.push_str("<g id=\"legend\">\n");
    let _ = writeln!(
        svg,
        r##"<rect x="{lx}" y="{ly}" width="{lw}" height="{lh}" fill="#ffffff" fill-opacity="0.8" stroke="#dcdcdc"/>"##
    );
    for (i, s) in model.series.iter().enumerate() {
        let (ex, ey) = layout.entry(i);
        let (fill, weight) = if s.highlighted {
            (colour_hex(&HIGHLIGHT), "bold")
        } else {
            ("#000000".to_string(), "normal")
        };
        let _ = writeln!(
            svg,
            r#"<g id="legend-entry-{i}" class="legend-entry" data-series="{i}">"#
        );
        let _ = writeln!(
            svg,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff" fill-opacity="0"/>"##,
            ex,
            ey - layout.row_height / 2,
            layout.column_width,
            layout.row_height
        );
        let _ = writeln!(
            svg,
            r#"<line id="legend-swatch-{i}" class="legend-swatch" x1="{ex}" y1="{ey}" x2="{}" y2="{ey}" stroke="{}" stroke-width="3"/>"#,
            ex + SWATCH_LENGTH,
            colour_hex(&s.colour)
        );
        let _ = writeln!(
            svg,
            r#"<text id="legend-text-{i}" class="legend-text" x="{}" y="{}" fill="{fill}" font-weight="{weight}" xml:space="preserve">{}</text>"#,
            layout.text_x(i),
            ey + LEGEND_FONT_SIZE as i32 / 3,
            xml_escape(&s.label)
        );
        svg.push_str("</g>\n");
    }
    svg.push_str("</g>\n");

    let _ = writeln!(
        svg,
        "<script type=\"text/javascript\"><![CDATA[{SCRIPT}]]></script>"
    );
    svg.push_str("</svg>\n");
    svg
}

/// Render `model` as an interactive SVG document.
pub fn render_interactive_svg(model: &PlotModel) -> Result<String> {
    let mut frame = String::new();
    let geometry = {
        let root = SVGBackend::with_string(&mut frame, (model.width, model.height))
            .into_drawing_area();
        let geometry = draw_frame(&root, model, false)?;
        root.present().map_err(plot_err)?;
        geometry
    };
    Ok(compose_interactive_svg(model, &frame, &geometry))
}

pub fn write_interactive_svg(model: &PlotModel, path: &Path) -> Result<()> {
    let svg = render_interactive_svg(model)?;
    fs::write(path, svg).map_err(|e| DatasetError::io(path, e))?;
    log::debug!(
        "wrote interactive plot with {} series to {}",
        model.series.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::tests::sample_doc;
    use crate::plot::{PlotModel, PlotOptions};

    const FRAME: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg width="1600" height="900" viewBox="0 0 1600 900" xmlns="http://www.w3.org/2000/svg">
<rect x="0" y="0" width="1600" height="900" fill="#FFFFFF"/>
</svg>"##;

    fn geometry(model: &PlotModel) -> FrameGeometry {
        FrameGeometry {
            plot_x: 100..1500,
            plot_y: 60..800,
            series: (0..model.series.len())
                .map(|n| vec![(100, 800), (100 + n as i32, 400), (200, 400), (200, 800)])
                .collect(),
        }
    }

    fn compose(options: PlotOptions) -> String {
        let model = PlotModel::from_dataset(&sample_doc(), &options).unwrap();
        compose_interactive_svg(&model, FRAME, &geometry(&model))
    }

    #[test]
    fn test_every_series_and_legend_entry_has_ids() {
        let svg = compose(PlotOptions::default());
        for i in 0..3 {
            assert!(svg.contains(&format!("id=\"series-{i}\"")));
            assert!(svg.contains(&format!("id=\"legend-text-{i}\"")));
            assert!(svg.contains(&format!("id=\"legend-swatch-{i}\"")));
            assert!(svg.contains(&format!("data-series=\"{i}\"")));
        }
        assert!(!svg.contains("id=\"series-3\""));
    }

    #[test]
    fn test_root_scales_to_container() {
        let svg = compose(PlotOptions::default());
        let root = svg.lines().next().unwrap();
        assert!(root.contains("viewBox=\"0 0 1600 900\""));
        assert!(!root.contains("width="));
        assert!(!root.contains("height="));
        assert!(!svg.contains("<?xml"));
    }

    #[test]
    fn test_script_and_style_embedded() {
        let svg = compose(PlotOptions::default());
        assert!(svg.contains("<script type=\"text/javascript\"><![CDATA["));
        assert!(svg.contains("event.ctrlKey"));
        assert!(svg.contains("event.shiftKey"));
        assert!(svg.contains("transition: opacity"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_highlighted_legend_text() {
        let svg = compose(PlotOptions::default());
        let text = |i: usize| {
            svg.lines()
                .find(|l| l.contains(&format!("id=\"legend-text-{i}\"")))
                .unwrap()
                .to_string()
        };
        assert!(text(0).contains("font-weight=\"normal\""));
        assert!(text(1).contains("fill=\"#ff0000\""));
        assert!(text(2).contains("font-weight=\"bold\""));
        assert!(text(1).contains("Core #2:   4 µs"));
    }

    #[test]
    fn test_reduced_range_keeps_all_points() {
        let full = compose(PlotOptions::default());
        let reduced = compose(PlotOptions {
            xred: 8,
            ..Default::default()
        });
        let paths = |svg: &str| -> Vec<String> {
            svg.lines()
                .filter(|l| l.starts_with("<path id=\"series-"))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(paths(&full), paths(&reduced));
        assert!(reduced.contains("clip-path=\"url(#plot-area)\""));
        assert!(reduced.contains("<clipPath id=\"plot-area\"><rect x=\"100\" y=\"60\" width=\"1400\" height=\"740\"/>"));
    }

    #[test]
    fn test_path_data() {
        assert_eq!(path_data(&[(1, 2), (3, 4)]), "M1 2 L3 4");
        assert_eq!(path_data(&[]), "");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_write_interactive_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let model = PlotModel::from_dataset(&sample_doc(), &PlotOptions::default()).unwrap();
        write_interactive_svg(&model, &path).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Measurement on 2023-05-04"));
        assert!(svg.contains("id=\"series-2\""));
    }
}
