//! Chart drawing through `plotters`.
//!
//! [`draw_frame`] draws everything except the data: background, caption,
//! axes, mesh and the measurement note. Static outputs add stairs and legend
//! on top; the interactive SVG writes its own series elements and uses the
//! returned [`FrameGeometry`] to place them.

use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;

use super::{
    HIGHLIGHT, LEGEND_FONT_SIZE, OutputFormat, PlotModel, SWATCH_LENGTH, clip_stairs,
    legend_layout,
};
use crate::error::{DatasetError, Result};

const GRID: RGBColor = RGBColor(220, 220, 220);
const NOTE: RGBColor = RGBColor(96, 96, 96);

pub(crate) fn plot_err<E: std::fmt::Display>(e: E) -> DatasetError {
    DatasetError::Plot(e.to_string())
}

/// Pixel geometry of a drawn frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry {
    pub plot_x: Range<i32>,
    pub plot_y: Range<i32>,
    /// Every series' full stair polyline in backend pixels.
    pub series: Vec<Vec<(i32, i32)>>,
}

/// Draw the chart frame onto `root`; with `with_series` the stairs and the
/// legend are drawn too.
pub fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    model: &PlotModel,
    with_series: bool,
) -> Result<FrameGeometry> {
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(root)
        .caption(&model.title, ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(
            model.x_range.clone(),
            model.y_range.clone().log_scale(),
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(model.x_label.as_str())
        .y_desc(model.y_label.as_str())
        .light_line_style(GRID)
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.0e}"))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    let (plot_x, plot_y) = chart.plotting_area().get_pixel_range();

    let note_style = ("sans-serif", 12)
        .into_font()
        .transform(FontTransform::Rotate90)
        .color(&NOTE);
    root.draw(&Text::new(
        model.note.clone(),
        (plot_x.end + 6, plot_y.start),
        note_style,
    ))
    .map_err(plot_err)?;

    let series: Vec<Vec<(i32, i32)>> = (0..model.series.len())
        .map(|n| {
            model
                .stair_points(n)
                .iter()
                .map(|p| chart.backend_coord(p))
                .collect()
        })
        .collect();

    if with_series {
        for (n, s) in model.series.iter().enumerate() {
            let visible = clip_stairs(&model.stair_points(n), model.x_range.end);
            chart
                .draw_series(LineSeries::new(visible, s.colour.stroke_width(1)))
                .map_err(plot_err)?;
        }
        draw_legend(root, model, &plot_x, &plot_y)?;
    }

    Ok(FrameGeometry {
        plot_x,
        plot_y,
        series,
    })
}

fn draw_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    model: &PlotModel,
    plot_x: &Range<i32>,
    plot_y: &Range<i32>,
) -> Result<()> {
    let layout = legend_layout(model, plot_x, plot_y);
    let (x, y, w, h) = layout.frame();
    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], WHITE.mix(0.8).filled()))
        .map_err(plot_err)?;
    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], GRID.stroke_width(1)))
        .map_err(plot_err)?;

    for (i, s) in model.series.iter().enumerate() {
        let (ex, ey) = layout.entry(i);
        root.draw(&PathElement::new(
            vec![(ex, ey), (ex + SWATCH_LENGTH, ey)],
            s.colour.stroke_width(3),
        ))
        .map_err(plot_err)?;

        let font = ("sans-serif", LEGEND_FONT_SIZE).into_font();
        let style = if s.highlighted {
            font.style(FontStyle::Bold).color(&HIGHLIGHT)
        } else {
            font.color(&BLACK)
        };
        let text_y = ey - LEGEND_FONT_SIZE as i32 / 2;
        root.draw(&Text::new(s.label.clone(), (layout.text_x(i), text_y), style))
            .map_err(plot_err)?;
    }
    Ok(())
}

/// Render `model` to a static image at `path`; the file name suffix picks
/// the format.
pub fn render_static(model: &PlotModel, path: &Path) -> Result<()> {
    let size = (model.width, model.height);
    match OutputFormat::from_path(path)? {
        OutputFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_frame(&root, model, true)?;
            root.present().map_err(plot_err)?;
        }
        OutputFormat::Png | OutputFormat::Jpeg | OutputFormat::Bmp => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_frame(&root, model, true)?;
            root.present().map_err(plot_err)?;
        }
    }
    log::debug!("rendered {} series to {}", model.series.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::tests::sample_doc;
    use crate::plot::{PlotOptions, PlotModel, write_plot};

    fn model() -> PlotModel {
        PlotModel::from_dataset(&sample_doc(), &PlotOptions::default()).unwrap()
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_frame_geometry() {
        let model = model();
        let mut svg = String::new();
        let geometry = {
            let root = SVGBackend::with_string(&mut svg, (model.width, model.height))
                .into_drawing_area();
            let g = draw_frame(&root, &model, false).unwrap();
            root.present().unwrap();
            g
        };
        assert!(geometry.plot_x.start < geometry.plot_x.end);
        assert!(geometry.plot_x.end <= model.width as i32);
        assert_eq!(geometry.series.len(), model.series.len());
        assert_eq!(geometry.series[0].len(), model.stair_points(0).len());
        assert!(svg.contains("Measurement on 2023-05-04"));
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_render_static_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        render_static(&model(), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Latency histogram of rack4slot1"));
        assert!(svg.contains("Core #2"));
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn test_write_plot_bitmap_formats() {
        let dir = tempfile::tempdir().unwrap();
        let model = model();
        let cases: [(&str, OutputFormat, &[u8]); 4] = [
            ("plot.png", OutputFormat::Png, b"\x89PNG"),
            ("plot.jpg", OutputFormat::Jpeg, b"\xFF\xD8"),
            ("plot.jpeg", OutputFormat::Jpeg, b"\xFF\xD8"),
            ("plot.bmp", OutputFormat::Bmp, b"BM"),
        ];
        for (name, expected, magic) in cases {
            let path = dir.path().join(name);
            assert_eq!(write_plot(&model, &path).unwrap(), expected, "{name}");
            let bytes = std::fs::read(&path).unwrap();
            assert!(bytes.starts_with(magic), "{name} has the wrong signature");
        }
    }

    #[test]
    fn test_render_static_rejects_unknown_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.tiff");
        assert!(matches!(
            render_static(&model(), &path),
            Err(DatasetError::UnsupportedFormat(_))
        ));
        assert!(!path.exists());
    }
}
