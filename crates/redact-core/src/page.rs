//! One rendered page and the marks drawn on it

use crate::geometry::{CanvasBounds, Point, Rect};
use crate::history::History;
use crate::raster::{RasterBitmap, Rgb};
use crate::redaction::Coordinates;
use crate::render::PageSize;
use tracing::debug;

/// A rendered page with its baked raster and mark history.
///
/// `raster` is always `clean` with every settled mark and then every
/// committed mark painted on top, in that order.
#[derive(Debug, Clone)]
pub struct Page {
    index: u32,
    native: PageSize,
    clean: RasterBitmap,
    raster: RasterBitmap,
    /// Marks that survived a history reset. Still baked and still exported,
    /// but no longer undoable.
    settled: Vec<Rect>,
    history: History<Rect>,
    fill: Rgb,
}

impl Page {
    pub fn new(index: u32, native: PageSize, clean: RasterBitmap, fill: Rgb) -> Self {
        Self {
            index,
            native,
            raster: clean.clone(),
            clean,
            settled: Vec::new(),
            history: History::new(),
            fill,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn native_size(&self) -> PageSize {
        self.native
    }

    pub fn raster(&self) -> &RasterBitmap {
        &self.raster
    }

    pub fn bounds(&self) -> CanvasBounds {
        CanvasBounds::new(self.raster.width() as f64, self.raster.height() as f64)
    }

    /// Native units per raster pixel
    pub fn scale_factor(&self) -> f64 {
        match self.raster.width() {
            0 => 1.0,
            w => self.native.width / w as f64,
        }
    }

    pub fn history(&self) -> &History<Rect> {
        &self.history
    }

    /// Commit a finished rectangle. Returns false if it was rejected.
    pub fn commit(&mut self, rect: Rect) -> bool {
        if !rect.is_committable() {
            return false;
        }
        self.raster.fill_rect(&rect, self.fill);
        self.history.push(rect);
        debug!(page = self.index, ?rect, marks = self.rectangles().len(), "mark committed");
        true
    }

    pub fn undo(&mut self) -> bool {
        if self.history.undo().is_none() {
            return false;
        }
        self.rebake();
        debug!(page = self.index, "mark undone");
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.history.redo().is_none() {
            return false;
        }
        self.rebake();
        debug!(page = self.index, "mark redone");
        true
    }

    /// Forget undo/redo state. Committed marks stay on the page; undone
    /// ones are gone for good.
    pub fn reset_history(&mut self) {
        self.settled.extend(self.history.take_committed());
    }

    /// Every mark currently on the page, oldest first
    pub fn rectangles(&self) -> Vec<Rect> {
        self.settled
            .iter()
            .chain(self.history.committed())
            .copied()
            .collect()
    }

    /// Marks converted to native units with a bottom-left origin
    pub fn redactions(&self) -> Vec<Coordinates> {
        let s = self.scale_factor();
        let page_height = self.native.height;
        self.rectangles()
            .iter()
            .map(|r| Coordinates {
                x: r.x * s,
                y: page_height - r.bottom() * s,
                width: r.w * s,
                height: r.h * s,
            })
            .collect()
    }

    /// Fixed-size native box whose top-left corner sits under `at`
    pub fn click_redaction(&self, at: Point, width: f64, height: f64) -> Coordinates {
        let s = self.scale_factor();
        Coordinates {
            x: at.x * s,
            y: self.native.height - at.y * s - height,
            width,
            height,
        }
    }

    fn rebake(&mut self) {
        self.raster = self.clean.clone();
        for rect in self.settled.iter().chain(self.history.committed()) {
            self.raster.fill_rect(rect, self.fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn page() -> Page {
        Page::new(
            1,
            PageSize::new(200.0, 100.0),
            RasterBitmap::new(400, 200),
            Rgb::BLACK,
        )
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect { x, y, w, h }
    }

    #[test]
    fn test_commit_paints_raster() {
        let mut p = page();
        assert!(p.commit(rect(10.0, 10.0, 20.0, 20.0)));
        assert_eq!(p.raster().pixel(15, 15), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(p.rectangles().len(), 1);
    }

    #[test]
    fn test_zero_area_commit_rejected() {
        let mut p = page();
        assert!(!p.commit(rect(10.0, 10.0, 0.0, 20.0)));
        assert!(p.rectangles().is_empty());
    }

    #[test]
    fn test_every_committed_mark_changes_the_raster() {
        let mut p = page();
        let clean = p.raster().clone();
        assert!(p.commit(rect(10.1, 10.0, 0.3, 20.0)));
        assert_eq!(p.rectangles().len(), 1);
        assert_ne!(p.raster(), &clean);
        assert_eq!(p.raster().pixel(10, 15), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_undo_restores_clean_pixels() {
        let mut p = page();
        let clean = p.raster().clone();
        p.commit(rect(10.0, 10.0, 20.0, 20.0));
        assert!(p.undo());
        assert_eq!(p.raster(), &clean);
        assert!(!p.undo());
    }

    #[test]
    fn test_undo_keeps_overlapping_earlier_mark() {
        let mut p = page();
        p.commit(rect(10.0, 10.0, 20.0, 20.0));
        p.commit(rect(20.0, 20.0, 20.0, 20.0));
        p.undo();
        assert_eq!(p.raster().pixel(25, 25), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(p.raster().pixel(35, 35), Some(Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_undo_redo_is_bitwise_identical() {
        let mut p = page();
        p.commit(rect(10.0, 10.0, 20.0, 20.0));
        p.commit(rect(50.0, 60.0, 30.0, 5.0));
        let baked = p.raster().clone();
        p.undo();
        p.redo();
        assert_eq!(p.raster(), &baked);
    }

    #[test]
    fn test_reset_history_settles_committed() {
        let mut p = page();
        p.commit(rect(10.0, 10.0, 20.0, 20.0));
        p.commit(rect(50.0, 60.0, 30.0, 5.0));
        p.undo();
        p.reset_history();

        assert!(!p.history().can_undo());
        assert!(!p.history().can_redo());
        assert_eq!(p.rectangles(), vec![rect(10.0, 10.0, 20.0, 20.0)]);
        assert!(!p.undo());
        assert_eq!(p.raster().pixel(15, 15), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_redactions_use_native_units() {
        let mut p = page();
        // raster is twice the native width, so scale is 0.5
        p.commit(rect(100.0, 40.0, 200.0, 20.0));
        assert_eq!(
            p.redactions(),
            vec![Coordinates {
                x: 50.0,
                y: 70.0,
                width: 100.0,
                height: 10.0
            }]
        );
    }

    #[test]
    fn test_click_redaction_hangs_below_point() {
        let p = page();
        assert_eq!(
            p.click_redaction(Point::new(40.0, 20.0), 100.0, 20.0),
            Coordinates {
                x: 20.0,
                y: 70.0,
                width: 100.0,
                height: 20.0
            }
        );
    }

    proptest! {
        /// Property: any number of undos followed by the same number of redos
        /// reproduces the baked raster exactly
        #[test]
        fn undo_redo_restores_raster(
            rects in proptest::collection::vec(
                (0.0f64..380.0, 0.0f64..180.0, 1.0f64..40.0, 1.0f64..40.0), 1..8),
            undo_count in 0usize..8,
        ) {
            let mut p = page();
            for (x, y, w, h) in rects {
                p.commit(rect(x, y, w, h));
            }
            let baked = p.raster().clone();
            let mut undone = 0;
            for _ in 0..undo_count {
                if p.undo() {
                    undone += 1;
                }
            }
            for _ in 0..undone {
                prop_assert!(p.redo());
            }
            prop_assert!(p.raster() == &baked);
        }
    }
}
