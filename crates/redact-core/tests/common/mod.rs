//! Shared fixtures: synthetic PDFs and a deterministic renderer

#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use redact_core::{PageRenderer, PageSize, RasterBitmap, RedactError, Result};
use std::collections::HashSet;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Build a PDF with `num_pages` pages of `width` x `height` points, each with
/// one line of text so content comparisons have something to compare.
pub fn create_synthetic_pdf(num_pages: u32, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut page_ids = Vec::new();

    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(20), Object::Integer(40)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Confidential page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Decoded content stream of `page` (1-based)
pub fn page_content(bytes: &[u8], page: u32) -> Vec<u8> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    doc.get_page_content(page_id).unwrap()
}

/// Operands of every `re` operator on `page`
pub fn rect_operands(bytes: &[u8], page: u32) -> Vec<Vec<f32>> {
    let content = Content::decode(&page_content(bytes, page)).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "re")
        .map(|op| op.operands.iter().map(|o| o.as_float().unwrap()).collect())
        .collect()
}

/// Inflated RGB samples of the full-page image on a flattened `page`
pub fn flattened_image(bytes: &[u8], page: u32) -> Vec<u8> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    let image_id = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|res| res.get(b"XObject"))
        .and_then(Object::as_dict)
        .and_then(|xobjects| xobjects.get(b"Im1"))
        .and_then(Object::as_reference)
        .unwrap();
    let stream = doc.get_object(image_id).and_then(Object::as_stream).unwrap();
    assert_eq!(
        stream.dict.get(b"Filter").and_then(Object::as_name).unwrap(),
        b"FlateDecode"
    );

    let mut samples = Vec::new();
    flate2::read::ZlibDecoder::new(stream.content.as_slice())
        .read_to_end(&mut samples)
        .unwrap();
    samples
}

/// Renders every page as a flat colour derived from its page number.
///
/// Same page and width always give the same pixels. The bitmap height keeps
/// the page's aspect ratio.
pub struct FakeRenderer {
    pub pages: Vec<PageSize>,
    pub failing: HashSet<u32>,
    pub delay: Duration,
    pub renders: AtomicUsize,
}

impl FakeRenderer {
    pub fn uniform(count: u32, size: PageSize) -> Self {
        Self {
            pages: vec![size; count as usize],
            failing: HashSet::new(),
            delay: Duration::ZERO,
            renders: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn shade(page: u32) -> u8 {
        200u8.wrapping_add((page * 10) as u8)
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_native_size(&self, page: u32) -> Result<PageSize> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or(RedactError::Render {
                page,
                reason: "no such page".into(),
            })
    }

    async fn render(&self, page: u32, target_width: u32) -> Result<RasterBitmap> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&page) {
            return Err(RedactError::Render {
                page,
                reason: "renderer crashed".into(),
            });
        }
        let size = self.page_native_size(page)?;
        let height = (target_width as f64 * size.height / size.width).round() as u32;
        let shade = Self::shade(page);
        Ok(RasterBitmap::from_image(RgbaImage::from_pixel(
            target_width,
            height,
            Rgba([shade, shade, shade, 255]),
        )))
    }
}
