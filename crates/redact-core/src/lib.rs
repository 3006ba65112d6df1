//! Interactive PDF redaction
//!
//! Users drag opaque rectangles over rendered pages, undo and redo them per
//! page, and save either a flattened copy (one image per page) or a vector
//! copy with black rectangles burned into the original page content.
//!
//! - [`Editor`]: the interactive session (pointer input, page cache, history, saves)
//! - [`export_vector`] / [`export_flattened`]: the export pipeline on its own
//! - [`PageRenderer`] and [`DocumentCodec`]: the seams to the host's renderer
//!   and the PDF library; [`LopdfCodec`] is the lopdf-backed codec

pub mod cache;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod draw;
pub mod driver;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod redaction;
pub mod render;
pub mod search;
pub mod text;
pub mod toolbar;

pub use cancel::CancelToken;
pub use codec::{clamp_to_page, DocumentCodec, DocumentHandle, NativeRect};
pub use config::{EditorConfig, HistoryScope};
pub use draw::{DrawMachine, DrawSession, Gesture, PointerEvent, PointerFeed};
pub use editor::{Editor, ExportTask, TickReport};
pub use error::{RedactError, Result};
pub use export::{export_flattened, export_vector, ExportArtifact, SaveMode};
pub use geometry::{CanvasBounds, Point, Rect, Viewport};
pub use page::Page;
pub use pdf::{IgnoredGeometry, LopdfCodec};
pub use raster::{RasterBitmap, Rgb};
pub use redaction::{Coordinates, Redaction, RedactionLog};
pub use render::{PageRenderer, PageSize};
pub use search::{annotate_search_terms, Annotated, SearchHit, SearchRequest, SearchTerm};
pub use text::TextRun;
pub use toolbar::{Tool, Toolbar};

/// Parse PDF bytes and return the native size of every page, in order
pub fn page_sizes(bytes: &[u8]) -> Result<Vec<PageSize>> {
    let handle = LopdfCodec.load(bytes)?;
    (1..=handle.page_count())
        .map(|page| handle.page_size(page))
        .collect()
}
