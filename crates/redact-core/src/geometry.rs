//! Canvas-space geometry for redaction marks
//!
//! All values here are in raster pixels of the page currently on screen,
//! with the origin at the top-left corner of the canvas.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Normalize two arbitrary corner points into a canonical rectangle.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (b.x - a.x).abs(),
            h: (b.y - a.y).abs(),
        }
    }

    /// A rectangle may only be committed when every component is finite and
    /// it encloses a non-zero area.
    pub fn is_committable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w > 0.0
            && self.h > 0.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// Pixel extent of the canvas that pointer events are tested against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub width: f64,
    pub height: f64,
}

impl CanvasBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Edges count as inside. Used when a gesture starts.
    pub fn contains(&self, p: Point) -> bool {
        p.is_finite() && p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Edges count as outside. Used when a gesture ends.
    pub fn contains_strict(&self, p: Point) -> bool {
        p.is_finite() && p.x > 0.0 && p.x < self.width && p.y > 0.0 && p.y < self.height
    }
}

/// On-screen placement of the canvas element.
///
/// The canvas may be displayed scaled (CSS size differs from its pixel
/// size), so client coordinates are mapped through the bounding box into
/// canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Viewport {
    pub fn to_canvas(&self, client: Point) -> Option<Point> {
        let span_x = self.right - self.left;
        let span_y = self.bottom - self.top;
        if span_x <= 0.0 || span_y <= 0.0 {
            return None;
        }
        let mapped = Point::new(
            (client.x - self.left) / span_x * self.canvas_width,
            (client.y - self.top) / span_y * self.canvas_height,
        );
        mapped.is_finite().then_some(mapped)
    }
}
