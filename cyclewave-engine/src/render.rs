//! Waveform scope.
//!
//! Stateless: each call clears the host surface and strokes one polyline
//! through the frame. Hosts provide the surface; a frame of all-`128` bytes
//! draws a flat line through the middle, so the scope never disappears.

/// Straight-alpha RGBA colour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Warm gold hairline.
pub const TRACE_COLOR: Rgba = Rgba { r: 184, g: 134, b: 11, a: 0.55 };

/// Stroke width in CSS pixels; multiplied by the pixel ratio.
pub const TRACE_WIDTH: f32 = 2.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Stroke settings for one polyline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgba,
}

/// A 2D drawing surface sized in device pixels.
pub trait Surface {
    /// `(width, height)` in device pixels.
    fn size(&self) -> (f32, f32);

    /// Device pixels per CSS pixel.
    fn pixel_ratio(&self) -> f32 {
        1.0
    }

    fn clear(&mut self);

    fn stroke_polyline(&mut self, points: &[Point], stroke: Stroke);
}

/// Polyline for `frame` on a `width × height` surface: sample `i` lands at
/// `(i/(n-1) * width, value/255 * height)`. A single sample sits at `x = 0`.
pub fn trace_points(frame: &[u8], width: f32, height: f32) -> Vec<Point> {
    let n = frame.len();
    #[allow(clippy::cast_precision_loss)]
    let span = n.saturating_sub(1).max(1) as f32;
    frame
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 / span * width;
            Point { x, y: f32::from(v) / 255.0 * height }
        })
        .collect()
}

#[derive(Copy, Clone, Debug, Default)]
pub struct VisualizationRenderer;

impl VisualizationRenderer {
    pub fn render<S: Surface + ?Sized>(&self, frame: &[u8], surface: &mut S) {
        surface.clear();
        if frame.is_empty() {
            return;
        }
        let (w, h) = surface.size();
        let stroke = Stroke { width: TRACE_WIDTH * surface.pixel_ratio(), color: TRACE_COLOR };
        surface.stroke_polyline(&trace_points(frame, w, h), stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FLAT_FRAME;

    #[derive(Default)]
    struct Recorder {
        clears: usize,
        lines: Vec<(Vec<Point>, Stroke)>,
        ratio: f32,
    }

    impl Surface for Recorder {
        fn size(&self) -> (f32, f32) {
            (300.0, 80.0)
        }
        fn pixel_ratio(&self) -> f32 {
            self.ratio
        }
        fn clear(&mut self) {
            self.clears += 1;
            self.lines.clear();
        }
        fn stroke_polyline(&mut self, points: &[Point], stroke: Stroke) {
            self.lines.push((points.to_vec(), stroke));
        }
    }

    #[test]
    fn points_span_the_surface() {
        let pts = trace_points(&[0, 255, 128], 100.0, 50.0);
        assert_eq!(pts[0], Point { x: 0.0, y: 0.0 });
        assert_eq!(pts[1], Point { x: 50.0, y: 50.0 });
        assert_eq!(pts[2].x, 100.0);
        assert!((pts[2].y - 128.0 / 255.0 * 50.0).abs() < 1e-4);
    }

    #[test]
    fn single_sample_does_not_divide_by_zero() {
        let pts = trace_points(&[64], 100.0, 50.0);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].x, 0.0);
    }

    #[test]
    fn flat_frame_draws_a_level_line() {
        let mut s = Recorder { ratio: 2.0, ..Recorder::default() };
        VisualizationRenderer.render(&FLAT_FRAME, &mut s);
        assert_eq!(s.clears, 1);
        let (pts, stroke) = &s.lines[0];
        assert_eq!(pts.len(), FLAT_FRAME.len());
        assert!(pts.iter().all(|p| (p.y - pts[0].y).abs() < 1e-6));
        assert_eq!(pts.last().unwrap().x, 300.0);
        assert_eq!(stroke.width, 4.0);
        assert_eq!(stroke.color, TRACE_COLOR);
    }

    #[test]
    fn empty_frame_only_clears() {
        let mut s = Recorder { ratio: 1.0, ..Recorder::default() };
        VisualizationRenderer.render(&[], &mut s);
        assert_eq!(s.clears, 1);
        assert!(s.lines.is_empty());
    }
}
