//! Page renderer collaborator
//!
//! The engine never rasterizes PDF content itself. Hosts plug in whatever
//! renderer they have (a browser canvas, pdfium, a test double) behind
//! [`PageRenderer`].

use crate::error::Result;
use crate::raster::RasterBitmap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Page dimensions in native document units (PDF points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter, used when a page carries no usable MediaBox
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rasterizes document pages. Page numbers are 1-based.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    fn page_count(&self) -> u32;

    fn page_native_size(&self, page: u32) -> Result<PageSize>;

    /// Render `page` scaled so the bitmap is `target_width` pixels wide.
    /// Failures are reported as [`crate::RedactError::Render`].
    async fn render(&self, page: u32, target_width: u32) -> Result<RasterBitmap>;
}
