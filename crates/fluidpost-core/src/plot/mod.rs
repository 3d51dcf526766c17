//! Figure descriptions and their SVG rendering.
//!
//! Analyses build [`Figure`] values from plain data; only [`render`] knows
//! about `plotters`. Logarithmic axes are expressed by plotting `log10` of
//! the data with a matching axis label.

mod render;

pub use render::{render_panels, render_svg};

use crate::style::{LineStyle, Rgb, method_color, method_line_style};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::PostResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    Line,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStyle {
    pub color: Rgb,
    pub mode: PlotMode,
}

impl SeriesStyle {
    pub const fn line(color: Rgb) -> Self {
        Self {
            color,
            mode: PlotMode::Line,
        }
    }

    pub const fn points(color: Rgb) -> Self {
        Self {
            color,
            mode: PlotMode::Points,
        }
    }

    /// Dotted methods are drawn as markers; other dash patterns as lines.
    pub fn for_method(method: &str) -> Self {
        let color = method_color(method);
        match method_line_style(method) {
            LineStyle::Dotted => Self::points(color),
            LineStyle::Solid | LineStyle::Dashed | LineStyle::DashDot => Self::line(color),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>, style: SeriesStyle) -> Self {
        Self {
            label: label.into(),
            points,
            style,
        }
    }

    pub fn from_columns(
        label: impl Into<String>,
        x: &[f64],
        y: &[f64],
        style: SeriesStyle,
    ) -> Self {
        Self::new(
            label,
            x.iter().copied().zip(y.iter().copied()).collect(),
            style,
        )
    }

    pub fn finite_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub vertical_lines: Vec<f64>,
    pub horizontal_lines: Vec<f64>,
}

impl Figure {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Self::default()
        }
    }

    pub fn with_x_range(mut self, low: f64, high: f64) -> Self {
        self.x_range = Some((low, high));
        self
    }

    pub fn with_y_range(mut self, low: f64, high: f64) -> Self {
        self.y_range = Some((low, high));
        self
    }

    pub fn with_vertical_line(mut self, x: f64) -> Self {
        self.vertical_lines.push(x);
        self
    }

    pub fn with_horizontal_line(mut self, y: f64) -> Self {
        self.horizontal_lines.push(y);
        self
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|series| series.finite_points().next().is_none())
    }

    /// Axis ranges after applying explicit limits and automatic padding.
    pub fn resolved_ranges(&self) -> ((f64, f64), (f64, f64)) {
        let x = self.x_range.unwrap_or_else(|| {
            automatic_range(
                self.series
                    .iter()
                    .flat_map(|series| series.finite_points().map(|(x, _)| x))
                    .chain(self.vertical_lines.iter().copied()),
            )
        });
        let y = self.y_range.unwrap_or_else(|| {
            automatic_range(
                self.series
                    .iter()
                    .flat_map(|series| series.finite_points().map(|(_, y)| y))
                    .chain(self.horizontal_lines.iter().copied()),
            )
        });
        (x, y)
    }

    pub fn render_svg(&self, path: &Path, size: FigureSize) -> PostResult<()> {
        render_svg(self, path, size)
    }
}

fn automatic_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (low, high) = values
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(value), high.max(value))
        });
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    let span = high - low;
    if span <= f64::EPSILON * low.abs().max(1.0) {
        return (low - 0.5, high + 0.5);
    }
    (low - 0.05 * span, high + 0.05 * span)
}
