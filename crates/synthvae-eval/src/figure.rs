//! Owned raster canvas and the plot panels drawn by the comparators.
//!
//! Panels carry no text; titles and legends live in the report next to the
//! image.

use std::fmt::Display;

use base64::{Engine as _, engine::general_purpose};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::errors::EvalError;
use crate::model::ImageArtifact;
use crate::stats::BoxStats;

pub const REAL_COLOR: RGBColor = BLUE;
pub const SYNTHETIC_COLOR: RGBColor = RED;

const CATEGORY_PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

pub type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub(crate) fn draw_err<E: Display>(err: E) -> EvalError {
    EvalError::Render(err.to_string())
}

/// RGB pixel buffer owned by one comparator for the lifetime of one figure.
#[derive(Debug, Clone)]
pub struct FigureCanvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl FigureCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![255; width as usize * height as usize * 3],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Clear to white and let `paint` draw on the whole canvas.
    pub fn draw<F>(&mut self, paint: F) -> Result<(), EvalError>
    where
        F: FnOnce(&Panel<'_>) -> Result<(), EvalError>,
    {
        let root =
            BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        paint(&root)?;
        root.present().map_err(draw_err)?;
        Ok(())
    }

    /// Encode the buffer as PNG and wrap it as base64 text.
    pub fn finish(self) -> Result<ImageArtifact, EvalError> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().map_err(draw_err)?;
            writer.write_image_data(&self.buffer).map_err(draw_err)?;
        }
        Ok(ImageArtifact {
            width: self.width,
            height: self.height,
            png_base64: general_purpose::STANDARD.encode(&bytes),
        })
    }
}

/// A line or point series in data coordinates.
pub struct Series {
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
}

impl Series {
    pub fn new(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self { points, color }
    }
}

fn padded(bounds: Option<(f64, f64)>) -> (f64, f64) {
    let Some((lo, hi)) = bounds.filter(|(lo, hi)| lo.is_finite() && hi.is_finite()) else {
        return (0.0, 1.0);
    };
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        let pad = (lo.abs() * 1e-3).max(1.0);
        (lo - pad, hi + pad)
    } else {
        (lo - span * 0.05, hi + span * 0.05)
    }
}

fn extend(bounds: Option<(f64, f64)>, value: f64) -> Option<(f64, f64)> {
    if !value.is_finite() {
        return bounds;
    }
    Some(match bounds {
        None => (value, value),
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
    })
}

fn chart<'a, 'b>(area: &'a Panel<'b>, x: (f64, f64), y: (f64, f64)) -> Result<Chart<'a, 'b>, EvalError> {
    let (width, height) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(0, 0), (width as i32 - 1, height as i32 - 1)],
        BLACK.stroke_width(1),
    ))
    .map_err(draw_err)?;
    ChartBuilder::on(area)
        .margin(12)
        .build_cartesian_2d(x.0..x.1, y.0..y.1)
        .map_err(draw_err)
}

/// Overlaid line series.
pub fn line_panel(area: &Panel<'_>, series: &[Series]) -> Result<(), EvalError> {
    let mut xs = None;
    let mut ys = None;
    for (x, y) in series.iter().flat_map(|s| s.points.iter()) {
        xs = extend(xs, *x);
        ys = extend(ys, *y);
    }
    let mut chart = chart(area, padded(xs), padded(ys))?;
    for s in series {
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), s.color.stroke_width(2)))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Overlaid scatter sets.
pub fn scatter_panel(area: &Panel<'_>, series: &[Series]) -> Result<(), EvalError> {
    let mut xs = None;
    let mut ys = None;
    for (x, y) in series.iter().flat_map(|s| s.points.iter()) {
        xs = extend(xs, *x);
        ys = extend(ys, *y);
    }
    let mut chart = chart(area, padded(xs), padded(ys))?;
    for s in series {
        let style = s.color.mix(0.6).filled();
        chart
            .draw_series(s.points.iter().map(|point| Circle::new(*point, 3, style)))
            .map_err(draw_err)?;
    }
    Ok(())
}

/// One bar per value, left to right.
pub fn bar_panel(area: &Panel<'_>, values: &[f64], color: RGBColor) -> Result<(), EvalError> {
    let top = values.iter().copied().fold(0.0_f64, f64::max);
    let top = if top > 0.0 { top * 1.05 } else { 1.0 };
    let mut chart = chart(area, (0.0, values.len().max(1) as f64), (0.0, top))?;
    let style = color.mix(0.7).filled();
    chart
        .draw_series(values.iter().enumerate().map(|(idx, value)| {
            let x = idx as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.9, *value)], style)
        }))
        .map_err(draw_err)?;
    Ok(())
}

/// Shares stacked into a single column, one palette colour per category.
pub fn proportion_panel(area: &Panel<'_>, shares: &[f64]) -> Result<(), EvalError> {
    let mut chart = chart(area, (0.0, 1.0), (0.0, 1.0))?;
    let mut bottom = 0.0;
    let mut segments = Vec::with_capacity(shares.len());
    for (idx, share) in shares.iter().enumerate() {
        let color = CATEGORY_PALETTE[idx % CATEGORY_PALETTE.len()];
        segments.push(Rectangle::new(
            [(0.25, bottom), (0.75, bottom + share)],
            color.filled(),
        ));
        bottom += share;
    }
    chart.draw_series(segments).map_err(draw_err)?;
    Ok(())
}

/// Box plots side by side; `None` leaves an empty slot.
pub fn box_panel(area: &Panel<'_>, boxes: &[(Option<BoxStats>, RGBColor)]) -> Result<(), EvalError> {
    let mut ys = None;
    for stats in boxes.iter().filter_map(|(stats, _)| stats.as_ref()) {
        ys = extend(ys, stats.low());
        ys = extend(ys, stats.high());
    }
    let mut chart = chart(area, (0.0, boxes.len().max(1) as f64), padded(ys))?;

    for (idx, (stats, color)) in boxes.iter().enumerate() {
        let Some(stats) = stats else {
            continue;
        };
        let left = idx as f64 + 0.2;
        let right = idx as f64 + 0.8;
        let centre = idx as f64 + 0.5;

        chart
            .draw_series([
                Rectangle::new([(left, stats.q1), (right, stats.q3)], color.mix(0.4).filled()),
                Rectangle::new([(left, stats.q1), (right, stats.q3)], color.stroke_width(1)),
            ])
            .map_err(draw_err)?;
        chart
            .draw_series([
                PathElement::new(vec![(left, stats.median), (right, stats.median)], BLACK.stroke_width(2)),
                PathElement::new(vec![(centre, stats.q3), (centre, stats.whisker_high)], color.stroke_width(1)),
                PathElement::new(vec![(centre, stats.q1), (centre, stats.whisker_low)], color.stroke_width(1)),
                PathElement::new(
                    vec![(centre - 0.15, stats.whisker_high), (centre + 0.15, stats.whisker_high)],
                    color.stroke_width(1),
                ),
                PathElement::new(
                    vec![(centre - 0.15, stats.whisker_low), (centre + 0.15, stats.whisker_low)],
                    color.stroke_width(1),
                ),
            ])
            .map_err(draw_err)?;
        let outlier_style = color.filled();
        chart
            .draw_series(
                stats
                    .outliers
                    .iter()
                    .map(|value| Circle::new((centre, *value), 3, outlier_style)),
            )
            .map_err(draw_err)?;
    }
    Ok(())
}

/// Overlaid histograms on a shared bin grid.
pub fn histogram_panel(
    area: &Panel<'_>,
    samples: &[(&[f64], RGBColor)],
    bins: usize,
) -> Result<(), EvalError> {
    let mut xs = None;
    for value in samples.iter().flat_map(|(values, _)| values.iter()) {
        xs = extend(xs, *value);
    }
    let (lo, hi) = padded(xs);
    let counts: Vec<Vec<usize>> = samples
        .iter()
        .map(|(values, _)| crate::stats::histogram(values, bins, lo, hi))
        .collect();
    let top = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f64 * 1.05;
    let mut chart = chart(area, (lo, hi), (0.0, top))?;

    let width = (hi - lo) / bins.max(1) as f64;
    for ((_, color), counts) in samples.iter().zip(&counts) {
        let style = color.mix(0.45).filled();
        chart
            .draw_series(counts.iter().enumerate().map(|(idx, count)| {
                let x0 = lo + width * idx as f64;
                Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], style)
            }))
            .map_err(draw_err)?;
    }
    Ok(())
}
