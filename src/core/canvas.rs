//! A 28x28 drawing grid laid over a virtual pointer surface.
//!
//! Pointer positions are given in surface pixels; each grid cell covers
//! `surface / grid` pixels. A stroke brightens the cell under the pointer and
//! its right neighbour, more strongly the closer the pointer is to the cell
//! centre, which gives a two-cell-wide brush.

#![allow(dead_code)]

use std::str::FromStr;

use crate::core::encoding::encode_image;
use crate::core::error::{ErrorCode, HandwriteError, Result};
use crate::core::matrix::Matrix;

pub const GRID: usize = 28;
pub const SURFACE: i32 = 560;

const BRUSH_STRENGTH: f64 = 180.0;
const PIXEL_MAX: f64 = 255.0;
const SHADES: &[u8] = b" .:-=+*#%@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl FromStr for Point {
    type Err = HandwriteError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || {
            HandwriteError::message(
                ErrorCode::InvalidInput,
                format!("expected a point as X,Y but got {value:?}"),
            )
        };
        let (x, y) = value.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: Matrix,
    width: i32,
    height: i32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(SURFACE, SURFACE)
    }
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            image: Matrix::zeros(GRID, GRID),
            width,
            height,
        }
    }

    pub fn image(&self) -> &Matrix {
        &self.image
    }

    pub fn clear(&mut self) {
        self.image.clear();
    }

    /// Replaces the grid with a sample of the same size.
    pub fn load(&mut self, sample: &Matrix) -> Result<()> {
        if !self.image.same_shape(sample) {
            return Err(HandwriteError::Shape {
                expected_rows: self.image.rows(),
                expected_cols: self.image.cols(),
                rows: sample.rows(),
                cols: sample.cols(),
            });
        }
        self.image.copy_from(sample)
    }

    /// Applies the brush at a pointer position. Returns `false` when the
    /// position is off the grid or on its outer border.
    pub fn stroke(&mut self, point: Point) -> Result<bool> {
        let cols = self.image.cols() as i32;
        let rows = self.image.rows() as i32;
        let sx = (self.width / cols).max(1);
        let sy = (self.height / rows).max(1);
        let mx = point.x.div_euclid(sx);
        let my = point.y.div_euclid(sy);

        if mx < 1 || my < 1 || mx + 1 >= cols || my + 1 >= rows {
            return Ok(false);
        }

        let cx = (mx * sx + (mx + 1) * sx) / 2;
        let cy = (my * sy + (my + 1) * sy) / 2;
        let dx = f64::from(point.x - cx);
        let dy = f64::from(point.y - cy);
        let max = f64::from(sx * sx + sy * sy).sqrt() / 2.0;
        let distance = (dx * dx + dy * dy).sqrt();

        let (row, col) = (my as usize, mx as usize);
        let old = self.image.get(row, col)?;
        let pixel = (old + (1.0 - distance / max) * BRUSH_STRENGTH).min(PIXEL_MAX);
        self.image.set(row, col, pixel)?;
        self.image.set(row, col + 1, pixel)?;
        Ok(true)
    }

    pub fn to_input(&self) -> Result<Matrix> {
        encode_image(&self.image)
    }

    /// One text line per grid row, shaded by brightness.
    pub fn render_ascii(&self) -> String {
        render_ascii(&self.image)
    }
}

pub fn render_ascii(image: &Matrix) -> String {
    let top = (SHADES.len() - 1) as f64;
    let mut out = String::with_capacity(image.len() + image.rows());
    for row in 0..image.rows() {
        if let Ok(values) = image.row(row) {
            for &value in values {
                let level = (value.clamp(0.0, PIXEL_MAX) / PIXEL_MAX * top).round() as usize;
                out.push(SHADES[level] as char);
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_at_cell_centre_adds_full_brush() {
        let mut canvas = Canvas::default();
        // cell (5, 3) spans x 100..120, y 60..80; centre (110, 70)
        assert!(canvas.stroke(Point { x: 110, y: 70 }).unwrap());
        assert_eq!(canvas.image().get(3, 5).unwrap(), 180.0);
        assert_eq!(canvas.image().get(3, 6).unwrap(), 180.0);
        assert_eq!(canvas.image().get(3, 4).unwrap(), 0.0);
    }

    #[test]
    fn repeated_strokes_saturate() {
        let mut canvas = Canvas::default();
        let point = Point { x: 110, y: 70 };
        canvas.stroke(point).unwrap();
        canvas.stroke(point).unwrap();
        assert_eq!(canvas.image().get(3, 5).unwrap(), 255.0);
    }

    #[test]
    fn off_centre_strokes_are_fainter() {
        let mut canvas = Canvas::default();
        canvas.stroke(Point { x: 101, y: 61 }).unwrap();
        let pixel = canvas.image().get(3, 5).unwrap();
        assert!(pixel > 0.0 && pixel < 180.0, "pixel {pixel}");
    }

    #[test]
    fn border_and_outside_strokes_are_ignored() {
        let mut canvas = Canvas::default();
        for point in [
            Point { x: 5, y: 300 },
            Point { x: 300, y: 5 },
            Point { x: 545, y: 300 },
            Point { x: 300, y: 559 },
            Point { x: -30, y: 300 },
            Point { x: 900, y: 300 },
        ] {
            assert!(!canvas.stroke(point).unwrap(), "{point:?}");
        }
        assert_eq!(canvas.image(), &Matrix::zeros(GRID, GRID));
    }

    #[test]
    fn load_requires_grid_shape_and_clear_resets() {
        let mut canvas = Canvas::default();
        assert!(canvas.load(&Matrix::zeros(1, 784)).is_err());

        canvas.load(&Matrix::ones(GRID, GRID)).unwrap();
        assert_eq!(canvas.to_input().unwrap().shape(), (1, 784));
        canvas.clear();
        assert_eq!(canvas.image(), &Matrix::zeros(GRID, GRID));
    }

    #[test]
    fn ascii_rendering_uses_shade_ramp() {
        let mut image = Matrix::from_bytes(&[0, 255, 128, 0]);
        image.reshape(2, 2).unwrap();
        assert_eq!(render_ascii(&image), " @\n+ \n");
    }

    #[test]
    fn points_parse_from_pairs() {
        assert_eq!("12,34".parse::<Point>().unwrap(), Point { x: 12, y: 34 });
        assert_eq!(" 1 , -2".parse::<Point>().unwrap(), Point { x: 1, y: -2 });
        assert!("12".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }
}
