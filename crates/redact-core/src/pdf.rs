//! lopdf-backed document codec and the flattened-export writer

use crate::codec::{DocumentCodec, DocumentHandle, NativeRect};
use crate::error::{RedactError, Result};
use crate::raster::{RasterBitmap, Rgb};
use crate::render::PageSize;
use crate::text::{self, TextRun};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use tracing::{debug, warn};

/// Inherited attributes are looked up at most this many levels up the page tree.
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec;

impl DocumentCodec for LopdfCodec {
    type Handle = PdfHandle;

    fn load(&self, bytes: &[u8]) -> Result<PdfHandle> {
        PdfHandle::from_bytes(bytes)
    }
}

/// Page geometry the codec does not apply when placing overlays.
///
/// Overlays are positioned in unrotated MediaBox space, so a mark drawn on a
/// rotated or cropped rendering lands elsewhere on such a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IgnoredGeometry {
    /// Non-zero `/Rotate`, in degrees
    Rotate(i64),
    /// `/CropBox` as `[x, y, width, height]` when it differs from the MediaBox
    CropBox([f64; 4]),
}

pub struct PdfHandle {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    /// Pages whose original content has already been wrapped in q/Q
    isolated: HashSet<ObjectId>,
}

impl PdfHandle {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| RedactError::Load(e.to_string()))?;
        let pages = doc.get_pages();
        debug!(pages = pages.len(), "document loaded");
        let handle = Self {
            doc,
            pages,
            isolated: HashSet::new(),
        };
        for (&page, &page_id) in &handle.pages {
            for ignored in handle.geometry_of(page_id) {
                warn!(
                    page,
                    ?ignored,
                    "page geometry ignored; overlays use the unrotated MediaBox"
                );
            }
        }
        Ok(handle)
    }

    /// Rotation and cropping on `page` that overlays do not account for.
    pub fn ignored_geometry(&self, page: u32) -> Result<Vec<IgnoredGeometry>> {
        Ok(self.geometry_of(self.page_id(page)?))
    }

    fn geometry_of(&self, page_id: ObjectId) -> Vec<IgnoredGeometry> {
        let mut ignored = Vec::new();
        let rotate = self
            .inherited(page_id, b"Rotate")
            .and_then(|o| self.number(o))
            .map(|deg| (deg as i64).rem_euclid(360))
            .unwrap_or(0);
        if rotate != 0 {
            ignored.push(IgnoredGeometry::Rotate(rotate));
        }
        let media = self.media_box(page_id);
        if let Some(crop) = self
            .inherited(page_id, b"CropBox")
            .and_then(|o| self.parse_rect(o))
        {
            if crop != media {
                ignored.push(IgnoredGeometry::CropBox(crop));
            }
        }
        ignored
    }

    /// An attribute looked up on the page and then up the page tree
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_TREE_DEPTH {
            let dict = current.and_then(|id| self.doc.get_dictionary(id).ok())?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(RedactError::InvalidPage {
                page: page as i64,
                page_count: self.page_count(),
            })
    }

    /// MediaBox as `[x, y, width, height]`, inherited through the page tree,
    /// falling back to US Letter.
    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        self.inherited(page_id, b"MediaBox")
            .and_then(|o| self.parse_rect(o))
            .unwrap_or([0.0, 0.0, PageSize::LETTER.width, PageSize::LETTER.height])
    }

    fn parse_rect(&self, obj: &Object) -> Option<[f64; 4]> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self.doc.get_object(*id).ok()?.as_array().ok()?,
            _ => return None,
        };
        if arr.len() != 4 {
            return None;
        }
        let mut v = [0.0f64; 4];
        for (slot, obj) in v.iter_mut().zip(arr) {
            *slot = self.number(obj)?;
        }
        let (x0, x1) = (v[0].min(v[2]), v[0].max(v[2]));
        let (y0, y1) = (v[1].min(v[3]), v[1].max(v[3]));
        Some([x0, y0, x1 - x0, y1 - y0])
    }

    fn number(&self, obj: &Object) -> Option<f64> {
        match obj {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r as f64),
            Object::Reference(id) => self.number(self.doc.get_object(*id).ok()?),
            _ => None,
        }
    }

    /// Current content streams of a page, as references
    fn content_refs(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| RedactError::Operation(e.to_string()))?;
        let refs = match dict.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok(refs)
    }

    fn add_content_stream(&mut self, bytes: Vec<u8>) -> Object {
        Object::Reference(self.doc.add_object(Stream::new(Dictionary::new(), bytes)))
    }

    /// Append `body` inside its own q/Q after everything already on the page.
    ///
    /// The first overlay on a page also wraps the original content in q/Q so
    /// graphics state it leaves behind cannot leak into the overlay.
    fn append_overlay(&mut self, page_id: ObjectId, body: Vec<Operation>) -> Result<()> {
        let first_on_page = self.isolated.insert(page_id);
        let mut operations = Vec::with_capacity(body.len() + 3);
        if first_on_page {
            // Close the graphics state opened ahead of the original content
            operations.push(Operation::new("Q", vec![]));
        }
        operations.push(Operation::new("q", vec![]));
        operations.extend(body);
        operations.push(Operation::new("Q", vec![]));

        let encoded = Content { operations }
            .encode()
            .map_err(|e| RedactError::Operation(e.to_string()))?;
        let mut overlay = b"\n".to_vec();
        overlay.extend(encoded);

        let mut contents = self.content_refs(page_id)?;
        if first_on_page {
            let open = self.add_content_stream(b"q\n".to_vec());
            contents.insert(0, open);
        }
        let overlay = self.add_content_stream(overlay);
        contents.push(overlay);

        let dict = self
            .doc
            .get_dictionary_mut(page_id)
            .map_err(|e| RedactError::Operation(e.to_string()))?;
        dict.set("Contents", Object::Array(contents));
        Ok(())
    }
}

/// PDF text string: a literal when ASCII, else UTF-16BE with a byte-order mark
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

impl DocumentHandle for PdfHandle {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSize> {
        let [_, _, w, h] = self.media_box(self.page_id(page)?);
        Ok(PageSize::new(w, h))
    }

    fn draw_rectangle(&mut self, page: u32, rect: &NativeRect, color: Rgb) -> Result<()> {
        let page_id = self.page_id(page)?;
        let [ox, oy, _, _] = self.media_box(page_id);
        let (r, g, b) = color.unit();

        self.append_overlay(
            page_id,
            vec![
                Operation::new(
                    "rg",
                    vec![Object::Real(r), Object::Real(g), Object::Real(b)],
                ),
                Operation::new(
                    "re",
                    vec![
                        Object::Real((ox + rect.x) as f32),
                        Object::Real((oy + rect.y) as f32),
                        Object::Real(rect.width as f32),
                        Object::Real(rect.height as f32),
                    ],
                ),
                Operation::new("f", vec![]),
            ],
        )?;
        debug!(page, x = rect.x, y = rect.y, w = rect.width, h = rect.height, "rectangle drawn");
        Ok(())
    }

    fn text_runs(&self, page: u32) -> Result<Vec<TextRun>> {
        let page_id = self.page_id(page)?;
        let [ox, oy, _, _] = self.media_box(page_id);
        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| RedactError::Operation(e.to_string()))?;
        let content =
            Content::decode(&content).map_err(|e| RedactError::Operation(e.to_string()))?;

        let mut runs = text::text_runs(&content.operations);
        for glyph in runs.iter_mut().flat_map(|run| run.glyphs.iter_mut()) {
            let [x0, y0, x1, y1] = glyph.bounds;
            glyph.bounds = [x0 - ox, y0 - oy, x1 - ox, y1 - oy];
        }
        Ok(runs)
    }

    fn draw_line(
        &mut self,
        page: u32,
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
        width: f64,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let [ox, oy, _, _] = self.media_box(page_id);
        let (r, g, b) = color.unit();
        let point = |(x, y): (f64, f64)| {
            vec![
                Object::Real((ox + x) as f32),
                Object::Real((oy + y) as f32),
            ]
        };

        self.append_overlay(
            page_id,
            vec![
                Operation::new(
                    "RG",
                    vec![Object::Real(r), Object::Real(g), Object::Real(b)],
                ),
                Operation::new("w", vec![Object::Real(width as f32)]),
                Operation::new("m", point(from)),
                Operation::new("l", point(to)),
                Operation::new("S", vec![]),
            ],
        )?;
        debug!(page, ?from, ?to, "line drawn");
        Ok(())
    }

    fn add_comment(
        &mut self,
        page: u32,
        rect: &NativeRect,
        comment: &str,
        color: Rgb,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let [ox, oy, _, _] = self.media_box(page_id);
        let (r, g, b) = color.unit();
        let (x0, y0) = ((ox + rect.x) as f32, (oy + rect.y) as f32);
        let (x1, y1) = (x0 + rect.width as f32, y0 + rect.height as f32);
        let reals =
            |values: &[f32]| -> Vec<Object> { values.iter().map(|v| Object::Real(*v)).collect() };

        let annot_id = self.doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
            "P" => page_id,
            "Rect" => reals(&[x0, y0, x1, y1]),
            "QuadPoints" => reals(&[x0, y1, x1, y1, x0, y0, x1, y0]),
            "Contents" => text_string(comment),
            "C" => reals(&[r, g, b]),
            "CA" => Object::Real(0.0),
            // Print
            "F" => 4,
        });

        let existing = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| RedactError::Operation(e.to_string()))?
            .get(b"Annots")
            .ok()
            .cloned();
        match existing {
            Some(Object::Reference(id)) => {
                self.doc
                    .get_object_mut(id)
                    .and_then(Object::as_array_mut)
                    .map_err(|e| RedactError::Operation(e.to_string()))?
                    .push(Object::Reference(annot_id));
            }
            existing => {
                let mut annots = match existing {
                    Some(Object::Array(items)) => items,
                    _ => Vec::new(),
                };
                annots.push(Object::Reference(annot_id));
                self.doc
                    .get_dictionary_mut(page_id)
                    .map_err(|e| RedactError::Operation(e.to_string()))?
                    .set("Annots", Object::Array(annots));
            }
        }
        debug!(page, chars = comment.len(), "comment attached");
        Ok(())
    }

    fn serialize(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| RedactError::Operation(e.to_string()))?;
        Ok(output)
    }
}

/// Build a new document holding one full-page image per raster, in order.
///
/// Each page's MediaBox is the raster's own pixel dimensions scaled to
/// points at `dpi`, so portrait and landscape pages come out as rendered.
pub fn flatten_pages(rasters: &[RasterBitmap], dpi: f64) -> Result<Vec<u8>> {
    let points_per_px = 72.0 / dpi;
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(rasters.len());

    for (i, raster) in rasters.iter().enumerate() {
        let width = raster.width() as f64 * points_per_px;
        let height = raster.height() as f64 * points_per_px;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => raster.width() as i64,
                "Height" => raster.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&raster.to_rgb_bytes())?,
        );
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width as f32),
                        0.into(),
                        0.into(),
                        Object::Real(height as f32),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content
                .encode()
                .map_err(|e| RedactError::Operation(e.to_string()))?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width as f32), Object::Real(height as f32)],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
        debug!(page = i + 1, width, height, "flattened page written");
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| RedactError::Operation(e.to_string()))?;
    Ok(output)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RedactError::Operation(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| RedactError::Operation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn create_test_pdf(media_box: [i64; 4]) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal("secret account number")],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn rect_operands(doc: &Document, page: u32) -> Vec<Vec<f32>> {
        let page_id = doc.get_pages()[&page];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .filter(|op| op.operator == "re")
            .map(|op| op.operands.iter().map(|o| o.as_float().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_malformed_bytes_fail_to_load() {
        let err = LopdfCodec.load(b"not a pdf").err();
        assert!(matches!(err, Some(RedactError::Load(_))));
    }

    #[test]
    fn test_media_box_inherited_from_parent() {
        let handle = LopdfCodec.load(&create_test_pdf([0, 0, 200, 300])).unwrap();
        assert_eq!(handle.page_count(), 1);
        assert_eq!(handle.page_size(1).unwrap(), PageSize::new(200.0, 300.0));
    }

    #[test]
    fn test_page_size_out_of_range() {
        let handle = LopdfCodec.load(&create_test_pdf([0, 0, 200, 300])).unwrap();
        assert!(matches!(
            handle.page_size(2),
            Err(RedactError::InvalidPage { page: 2, page_count: 1 })
        ));
    }

    #[test]
    fn test_draw_rectangle_appends_after_original_content() {
        let mut handle = LopdfCodec.load(&create_test_pdf([0, 0, 612, 792])).unwrap();
        let rect = NativeRect {
            x: 50.0,
            y: 50.0,
            width: 100.0,
            height: 20.0,
        };
        handle.draw_rectangle(1, &rect, Rgb::BLACK).unwrap();
        handle.draw_rectangle(1, &rect, Rgb::BLACK).unwrap();
        let bytes = handle.serialize().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|o| o.operator.as_str()).collect();

        assert_eq!(ops.first(), Some(&"q"));
        let text_end = ops.iter().position(|o| *o == "ET").unwrap();
        let first_fill = ops.iter().position(|o| *o == "f").unwrap();
        assert!(text_end < first_fill);
        assert_eq!(ops.iter().filter(|o| **o == "q").count(), 3);
        assert_eq!(ops.iter().filter(|o| **o == "Q").count(), 3);
        assert_eq!(rect_operands(&doc, 1), vec![vec![50.0, 50.0, 100.0, 20.0]; 2]);
    }

    #[test]
    fn test_draw_rectangle_offsets_by_media_box_origin() {
        let mut handle = LopdfCodec.load(&create_test_pdf([10, 20, 210, 320])).unwrap();
        assert_eq!(handle.page_size(1).unwrap(), PageSize::new(200.0, 300.0));
        let rect = NativeRect {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 300.0,
        };
        handle.draw_rectangle(1, &rect, Rgb::BLACK).unwrap();
        let doc = Document::load_mem(&handle.serialize().unwrap()).unwrap();
        assert_eq!(rect_operands(&doc, 1), vec![vec![10.0, 20.0, 200.0, 300.0]]);
    }

    #[test]
    fn test_text_runs_are_relative_to_media_box_origin() {
        let handle = LopdfCodec.load(&create_test_pdf([10, 20, 622, 812])).unwrap();
        let runs = handle.text_runs(1).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text(), "secret account number");

        // 24pt text at (100, 700): glyphs are 12pt wide
        let hits = runs[0].find("account");
        assert_eq!(hits.len(), 1);
        let [x0, y0, x1, _] = hits[0];
        assert_eq!((x0, x1), (100.0 - 10.0 + 7.0 * 12.0, 100.0 - 10.0 + 14.0 * 12.0));
        assert!((y0 - (700.0 - 20.0 - 4.8)).abs() < 1e-9);
    }

    #[test]
    fn test_draw_line_strokes_in_its_own_state() {
        let mut handle = LopdfCodec.load(&create_test_pdf([0, 0, 612, 792])).unwrap();
        handle
            .draw_line(1, (100.0, 690.0), (200.0, 690.0), Rgb(0, 0, 255), 1.0)
            .unwrap();
        let doc = Document::load_mem(&handle.serialize().unwrap()).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|o| o.operator.as_str()).collect();

        let tail = &ops[ops.len() - 7..];
        assert_eq!(tail, &["q", "RG", "w", "m", "l", "S", "Q"]);
        assert_eq!(ops.first(), Some(&"q"));
    }

    #[test]
    fn test_comments_append_to_annots() {
        let mut handle = LopdfCodec.load(&create_test_pdf([0, 0, 612, 792])).unwrap();
        let rect = NativeRect {
            x: 100.0,
            y: 680.0,
            width: 84.0,
            height: 30.0,
        };
        handle.add_comment(1, &rect, "first", Rgb::BLACK).unwrap();
        handle.add_comment(1, &rect, "zweiter Kommentar ü", Rgb::BLACK).unwrap();
        let doc = Document::load_mem(&handle.serialize().unwrap()).unwrap();

        let page = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        let annots = page.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 2);

        let annot = doc.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
        let bounds: Vec<f32> = annot
            .get(b"Rect")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(bounds, vec![100.0, 680.0, 184.0, 710.0]);
        assert_eq!(annot.get(b"CA").unwrap().as_float().unwrap(), 0.0);

        let second = doc.get_dictionary(annots[1].as_reference().unwrap()).unwrap();
        let contents = second.get(b"Contents").unwrap().as_str().unwrap();
        assert_eq!(&contents[..2], &[0xFE, 0xFF]);
    }

    /// Re-save `bytes` with extra entries on page 1
    fn with_page_entries(bytes: &[u8], entries: Vec<(&str, Object)>) -> Vec<u8> {
        let mut doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_dictionary_mut(page_id).unwrap();
        for (key, value) in entries {
            page.set(key, value);
        }
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_plain_page_has_no_ignored_geometry() {
        let handle = LopdfCodec.load(&create_test_pdf([0, 0, 612, 792])).unwrap();
        assert_eq!(handle.ignored_geometry(1).unwrap(), vec![]);
    }

    #[test]
    fn test_rotated_and_cropped_page_keeps_media_box_placement() {
        let bytes = with_page_entries(
            &create_test_pdf([0, 0, 612, 792]),
            vec![
                ("Rotate", Object::Integer(-90)),
                (
                    "CropBox",
                    Object::Array(vec![36.into(), 36.into(), 576.into(), 756.into()]),
                ),
            ],
        );
        let mut handle = LopdfCodec.load(&bytes).unwrap();
        assert_eq!(
            handle.ignored_geometry(1).unwrap(),
            vec![
                IgnoredGeometry::Rotate(270),
                IgnoredGeometry::CropBox([36.0, 36.0, 540.0, 720.0]),
            ]
        );

        // Size and overlay placement still come from the MediaBox
        assert_eq!(handle.page_size(1).unwrap(), PageSize::new(612.0, 792.0));
        let rect = NativeRect {
            x: 50.0,
            y: 50.0,
            width: 100.0,
            height: 20.0,
        };
        handle.draw_rectangle(1, &rect, Rgb::BLACK).unwrap();
        let doc = Document::load_mem(&handle.serialize().unwrap()).unwrap();
        assert_eq!(rect_operands(&doc, 1), vec![vec![50.0, 50.0, 100.0, 20.0]]);
    }

    #[test]
    fn test_crop_box_equal_to_media_box_is_not_reported() {
        let bytes = with_page_entries(
            &create_test_pdf([0, 0, 612, 792]),
            vec![(
                "CropBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            )],
        );
        let handle = LopdfCodec.load(&bytes).unwrap();
        assert_eq!(handle.ignored_geometry(1).unwrap(), vec![]);
    }

    #[test]
    fn test_flatten_one_page_per_raster() {
        let mut first = RasterBitmap::new(96, 48);
        first.fill_rect(
            &Rect {
                x: 10.0,
                y: 10.0,
                w: 20.0,
                h: 10.0,
            },
            Rgb::BLACK,
        );
        let second = RasterBitmap::new(48, 96);

        let bytes = flatten_pages(&[first, second], 96.0).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let handle = LopdfCodec.load(&bytes).unwrap();
        assert_eq!(handle.page_size(1).unwrap(), PageSize::new(72.0, 36.0));
        assert_eq!(handle.page_size(2).unwrap(), PageSize::new(36.0, 72.0));
    }
}
