use super::{Figure, FigureSize, PlotMode};
use crate::domain::{PostError, PostResult};
use crate::style::Rgb;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::debug;

type DrawResult = Result<(), Box<dyn Error>>;

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

pub fn render_svg(figure: &Figure, path: &Path, size: FigureSize) -> PostResult<()> {
    render_panels(path, size, std::slice::from_ref(figure))
}

/// Renders `figures` stacked top to bottom in one SVG document.
pub fn render_panels(path: &Path, size: FigureSize, figures: &[Figure]) -> PostResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| {
            PostError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!(
                    "failed to create figure directory '{}': {}",
                    parent.display(),
                    source
                ),
            )
        })?;
    }

    let panel_count = figures.len().max(1);
    draw_document(path, size, figures, panel_count).map_err(|source| {
        PostError::io_system(
            "IO.FIGURE_WRITE",
            format!("failed to render figure '{}': {}", path.display(), source),
        )
    })?;
    debug!(path = %path.display(), panels = panel_count, "rendered figure");
    Ok(())
}

fn draw_document(
    path: &Path,
    size: FigureSize,
    figures: &[Figure],
    panel_count: usize,
) -> DrawResult {
    let height = size.height.saturating_mul(panel_count as u32);
    let root = SVGBackend::new(path, (size.width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    if figures.is_empty() {
        draw_panel(&root, &Figure::default())?;
    } else {
        let panels = root.split_evenly((panel_count, 1));
        for (panel, figure) in panels.iter().zip(figures) {
            draw_panel(panel, figure)?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, figure: &Figure) -> DrawResult {
    let ((x_min, x_max), (y_min, y_max)) = figure.resolved_ranges();

    let mut chart = ChartBuilder::on(area)
        .caption(&figure.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .draw()?;

    for &x in &figure.vertical_lines {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, y_min), (x, y_max)],
            BLACK.mix(0.6),
        )))?;
    }
    for &y in &figure.horizontal_lines {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_min, y), (x_max, y)],
            BLACK.mix(0.6),
        )))?;
    }

    let mut has_legend = false;
    for series in &figure.series {
        let color = rgb(series.style.color);
        let labelled = !series.label.is_empty();
        has_legend |= labelled;

        match series.style.mode {
            PlotMode::Line => {
                // Non-finite points break the line instead of being bridged.
                let mut segments: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
                for &(x, y) in &series.points {
                    if x.is_finite() && y.is_finite() {
                        if let Some(segment) = segments.last_mut() {
                            segment.push((x, y));
                        }
                    } else if segments.last().is_some_and(|segment| !segment.is_empty()) {
                        segments.push(Vec::new());
                    }
                }
                let mut first = true;
                for segment in segments.into_iter().filter(|segment| !segment.is_empty()) {
                    let drawn = chart.draw_series(LineSeries::new(segment, color.stroke_width(2)))?;
                    if first && labelled {
                        drawn.label(series.label.as_str()).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                    }
                    first = false;
                }
            }
            PlotMode::Points => {
                let drawn = chart.draw_series(
                    series
                        .finite_points()
                        .map(|point| Circle::new(point, 3, color.filled())),
                )?;
                if labelled {
                    drawn
                        .label(series.label.as_str())
                        .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
                }
            }
        }
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render_panels, render_svg};
    use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
    use crate::style::Rgb;
    use std::fs;
    use tempfile::TempDir;

    fn sample_figure() -> Figure {
        let mut figure = Figure::new("g(r)", "r/R", "g").with_vertical_line(2.0);
        figure.push(Series::new(
            "model",
            vec![(2.0, 2.1), (3.0, 0.9), (f64::NAN, 1.0), (4.0, 1.02)],
            SeriesStyle::line(Rgb::BLUE),
        ));
        figure.push(Series::new(
            "",
            vec![(2.5, 1.3)],
            SeriesStyle::points(Rgb::RED),
        ));
        figure
    }

    #[test]
    fn writes_svg_document() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("figs/ghs.svg");
        render_svg(&sample_figure(), &path, FigureSize::default()).expect("render");

        let svg = fs::read_to_string(&path).expect("svg should exist");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("model"));
    }

    #[test]
    fn panels_and_empty_figures_render() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("panels.svg");
        render_panels(
            &path,
            FigureSize {
                width: 400,
                height: 300,
            },
            &[sample_figure(), Figure::new("empty", "x", "y")],
        )
        .expect("render");
        assert!(path.is_file());
    }
}
