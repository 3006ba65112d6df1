//! Document codec collaborator and redaction clamping

use crate::error::Result;
use crate::raster::Rgb;
use crate::redaction::Coordinates;
use crate::render::PageSize;
use crate::text::TextRun;

/// Rectangle in native page units, already clamped to the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Parses document bytes into an editable handle.
pub trait DocumentCodec: Send + Sync {
    type Handle: DocumentHandle;

    /// Fails with [`crate::RedactError::Load`] on malformed input.
    fn load(&self, bytes: &[u8]) -> Result<Self::Handle>;
}

/// An open, mutable document. Page numbers are 1-based.
pub trait DocumentHandle {
    fn page_count(&self) -> u32;

    fn page_size(&self, page: u32) -> Result<PageSize>;

    /// Paint an opaque filled rectangle on top of the page's existing content.
    fn draw_rectangle(&mut self, page: u32, rect: &NativeRect, color: Rgb) -> Result<()>;

    /// Shown text on the page, with glyph boxes in native page units.
    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>>;

    /// Stroke a straight line on top of the page's existing content.
    fn draw_line(
        &mut self,
        page: u32,
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
        width: f64,
    ) -> Result<()>;

    /// Attach an invisible annotation over `rect` that shows `comment` on hover.
    fn add_comment(&mut self, page: u32, rect: &NativeRect, comment: &str, color: Rgb)
        -> Result<()>;

    fn serialize(&mut self) -> Result<Vec<u8>>;
}

/// Fit a redaction inside the page.
///
/// The origin is clamped into `[0, W] x [0, H]` and the extent is cut to
/// what remains of the page from there. Non-finite components are treated as
/// zero. Returns `None` when nothing of the rectangle is left.
pub fn clamp_to_page(coords: &Coordinates, size: PageSize) -> Option<NativeRect> {
    let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
    let x = finite(coords.x).clamp(0.0, size.width);
    let y = finite(coords.y).clamp(0.0, size.height);
    let width = finite(coords.width).min(size.width - x);
    let height = finite(coords.height).min(size.height - y);

    (width > 0.0 && height > 0.0).then_some(NativeRect {
        x,
        y,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coords(x: f64, y: f64, width: f64, height: f64) -> Coordinates {
        Coordinates {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn test_clamp_oversized_to_page() {
        let rect = clamp_to_page(
            &coords(-10.0, -10.0, 1000.0, 1000.0),
            PageSize::new(200.0, 300.0),
        );
        assert_eq!(
            rect,
            Some(NativeRect {
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 300.0
            })
        );
    }

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let rect = clamp_to_page(&coords(50.0, 50.0, 100.0, 20.0), PageSize::LETTER);
        assert_eq!(
            rect,
            Some(NativeRect {
                x: 50.0,
                y: 50.0,
                width: 100.0,
                height: 20.0
            })
        );
    }

    #[test]
    fn test_clamp_overhanging_right_edge() {
        let rect = clamp_to_page(&coords(150.0, 10.0, 100.0, 20.0), PageSize::new(200.0, 300.0));
        assert_eq!(rect.map(|r| r.width), Some(50.0));
    }

    #[test]
    fn test_clamp_off_page_is_dropped() {
        assert_eq!(
            clamp_to_page(&coords(250.0, 10.0, 100.0, 20.0), PageSize::new(200.0, 300.0)),
            None
        );
        assert_eq!(
            clamp_to_page(&coords(10.0, 10.0, -5.0, 20.0), PageSize::new(200.0, 300.0)),
            None
        );
    }

    #[test]
    fn test_clamp_non_finite() {
        let rect = clamp_to_page(
            &coords(f64::NAN, 10.0, f64::INFINITY, 20.0),
            PageSize::new(200.0, 300.0),
        );
        assert_eq!(rect, None);
    }

    proptest! {
        /// Property: a clamped rectangle never leaves the page
        #[test]
        fn clamped_stays_on_page(
            x in -1e4f64..1e4, y in -1e4f64..1e4,
            w in -1e4f64..1e4, h in -1e4f64..1e4,
            pw in 1.0f64..2000.0, ph in 1.0f64..2000.0,
        ) {
            if let Some(r) = clamp_to_page(&coords(x, y, w, h), PageSize::new(pw, ph)) {
                prop_assert!(r.x >= 0.0 && r.y >= 0.0);
                prop_assert!(r.width > 0.0 && r.height > 0.0);
                prop_assert!(r.x + r.width <= pw + 1e-9);
                prop_assert!(r.y + r.height <= ph + 1e-9);
            }
        }
    }
}
