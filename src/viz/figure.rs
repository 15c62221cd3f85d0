//! SVG figure composition
//!
//! Collects skeleton segment and synapse scatter layers in data
//! coordinates, then renders them to an SVG file. The figure is a 2D
//! top-down projection: data x maps to horizontal, data z to vertical,
//! with the vertical axis flipped (z grows downward) to match the source
//! coordinate convention.

use crate::neuprint::models::SkeletonSegment;
use crate::palette::Color;
use anyhow::{anyhow, Result};
use plotters::prelude::*;
use plotters::style::Color as PlottersColor;
use std::path::Path;

const MARGIN: i32 = 20;

struct SegmentLayer {
    segments: Vec<SkeletonSegment>,
    color: Color,
}

struct ScatterLayer {
    /// (x, z, color) per point, in data coordinates.
    points: Vec<(f64, f64, Color)>,
    radius: u32,
}

/// A composable 2D figure: skeleton segments plus colored scatter layers.
pub struct Figure {
    width: u32,
    height: u32,
    segment_layers: Vec<SegmentLayer>,
    scatter_layers: Vec<ScatterLayer>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            segment_layers: Vec::new(),
            scatter_layers: Vec::new(),
        }
    }

    /// Add a layer of skeleton segments drawn in a single color.
    pub fn add_segments(&mut self, segments: Vec<SkeletonSegment>, color: Color) {
        self.segment_layers.push(SegmentLayer { segments, color });
    }

    /// Add a layer of colored points at (x, z) data coordinates.
    pub fn add_scatter(&mut self, points: Vec<(f64, f64, Color)>, radius: u32) {
        self.scatter_layers.push(ScatterLayer { points, radius });
    }

    /// Data-space bounds over every layer: (min_x, max_x, min_z, max_z).
    fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        let mut extend = |x: f64, z: f64| {
            bounds = Some(match bounds {
                None => (x, x, z, z),
                Some((min_x, max_x, min_z, max_z)) => {
                    (min_x.min(x), max_x.max(x), min_z.min(z), max_z.max(z))
                }
            });
        };
        for layer in &self.segment_layers {
            for seg in &layer.segments {
                extend(seg.parent[0], seg.parent[2]);
                extend(seg.child[0], seg.child[2]);
            }
        }
        for layer in &self.scatter_layers {
            for &(x, z, _) in &layer.points {
                extend(x, z);
            }
        }
        bounds
    }

    /// Render the composed figure to an SVG file.
    pub fn render_svg(&self, path: &Path) -> Result<()> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow!("failed to fill figure background: {e}"))?;

        let (min_x, max_x, min_z, max_z) = match self.bounds() {
            Some(b) => b,
            None => {
                // Nothing to draw; still produce the blank figure.
                root.present()
                    .map_err(|e| anyhow!("failed to write figure: {e}"))?;
                return Ok(());
            }
        };

        let span = |lo: f64, hi: f64| if hi > lo { hi - lo } else { 1.0 };
        let span_x = span(min_x, max_x);
        let span_z = span(min_z, max_z);
        let draw_w = (self.width as i32 - 2 * MARGIN).max(1) as f64;
        let draw_h = (self.height as i32 - 2 * MARGIN).max(1) as f64;

        // SVG pixel y already grows downward, which is exactly the flipped
        // vertical axis the projection wants.
        let to_px = |x: f64, z: f64| -> (i32, i32) {
            let px = MARGIN + ((x - min_x) / span_x * draw_w).round() as i32;
            let py = MARGIN + ((z - min_z) / span_z * draw_h).round() as i32;
            (px, py)
        };

        for layer in &self.segment_layers {
            let style = ShapeStyle {
                color: rgb(layer.color).to_rgba(),
                filled: false,
                stroke_width: 1,
            };
            for seg in &layer.segments {
                let from = to_px(seg.parent[0], seg.parent[2]);
                let to = to_px(seg.child[0], seg.child[2]);
                root.draw(&PathElement::new(vec![from, to], style))
                    .map_err(|e| anyhow!("failed to draw segment: {e}"))?;
            }
        }

        for layer in &self.scatter_layers {
            for &(x, z, color) in &layer.points {
                let center = to_px(x, z);
                root.draw(&Circle::new(
                    center,
                    layer.radius as i32,
                    rgb(color).filled(),
                ))
                .map_err(|e| anyhow!("failed to draw point: {e}"))?;
            }
        }

        root.present()
            .map_err(|e| anyhow!("failed to write figure: {e}"))?;
        tracing::debug!(path = %path.display(), "figure rendered");
        Ok(())
    }
}

fn rgb(c: Color) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}
