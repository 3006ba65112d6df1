//! Vector and flattened export
//!
//! Both exports are all-or-nothing: any failure returns an error and no
//! bytes.

use crate::codec::{clamp_to_page, DocumentCodec, DocumentHandle};
use crate::error::{RedactError, Result};
use crate::pdf::flatten_pages;
use crate::raster::{RasterBitmap, Rgb};
use crate::redaction::Redaction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Opaque rectangles composited into the original document
    Vector,
    /// One full-page image per rendered page
    Flattened,
}

/// A finished export ready to be written out
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// Burn redactions into `source`.
///
/// Every page number is checked before anything is drawn, so an invalid
/// entry anywhere in the list fails the whole export. With no redactions the
/// source bytes are returned untouched.
#[instrument(skip(codec, source, redactions), fields(bytes = source.len(), redactions = redactions.len()))]
pub fn export_vector<C: DocumentCodec>(
    codec: &C,
    source: &[u8],
    redactions: &[Redaction],
) -> Result<Vec<u8>> {
    let mut handle = codec.load(source)?;
    let page_count = handle.page_count();

    if let Some(bad) = redactions
        .iter()
        .find(|r| r.page < 1 || r.page > page_count as i64)
    {
        return Err(RedactError::InvalidPage {
            page: bad.page,
            page_count,
        });
    }

    if redactions.is_empty() {
        debug!("no redactions, returning source unchanged");
        return Ok(source.to_vec());
    }

    let mut drawn = 0usize;
    for redaction in redactions {
        let page = redaction.page as u32;
        let size = handle.page_size(page)?;
        let Some(rect) = clamp_to_page(&redaction.coordinates, size) else {
            debug!(id = %redaction.id, page, "redaction falls outside the page, skipped");
            continue;
        };
        handle.draw_rectangle(page, &rect, Rgb::BLACK)?;
        drawn += 1;
    }

    let bytes = handle.serialize()?;
    info!(drawn, output_bytes = bytes.len(), "vector export finished");
    Ok(bytes)
}

/// Build a raster-only document from baked page bitmaps, in page order.
#[instrument(skip(rasters), fields(pages = rasters.len()))]
pub fn export_flattened(rasters: &[RasterBitmap], dpi: f64) -> Result<Vec<u8>> {
    if rasters.is_empty() {
        return Err(RedactError::NoDocument);
    }
    let bytes = flatten_pages(rasters, dpi)?;
    info!(output_bytes = bytes.len(), "flattened export finished");
    Ok(bytes)
}
