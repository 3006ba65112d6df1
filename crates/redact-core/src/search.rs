//! Search-term pass
//!
//! Every occurrence of each term's text is either blacked out or underlined
//! in the term's colour, optionally with a hover comment attached. Like the
//! vector export this is all-or-nothing.

use crate::codec::{clamp_to_page, DocumentCodec, DocumentHandle, NativeRect};
use crate::error::{RedactError, Result};
use crate::raster::Rgb;
use crate::redaction::Coordinates;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Distance between a match's bottom edge and its underline
const UNDERLINE_GAP: f64 = 2.0;
const UNDERLINE_WIDTH: f64 = 1.0;
/// Height of the hover area, hanging down from the top of the match
const COMMENT_HEIGHT: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub text: String,
    /// Underline colour as 0.0..=1.0 components; black when absent
    #[serde(default)]
    pub color: Option<[f64; 3]>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Black out matches instead of underlining them
    #[serde(default)]
    pub redact: Option<bool>,
}

impl SearchTerm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            comment: None,
            redact: None,
        }
    }

    pub fn redacted(mut self) -> Self {
        self.redact = Some(true);
        self
    }

    pub fn with_color(mut self, color: [f64; 3]) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn redacts(&self) -> bool {
        self.redact.unwrap_or(false)
    }

    pub fn rgb(&self) -> Rgb {
        self.color
            .map(|[r, g, b]| Rgb::from_unit(r, g, b))
            .unwrap_or(Rgb::BLACK)
    }

    fn validate(&self) -> Result<()> {
        if self.text.is_empty() {
            return Err(RedactError::InvalidSearchTerms(
                "Search text cannot be empty".into(),
            ));
        }
        if let Some(color) = self.color {
            if !color.iter().all(|c| (0.0..=1.0).contains(c)) {
                return Err(RedactError::InvalidSearchTerms(
                    "Color values must be numbers between 0 and 1".into(),
                ));
            }
        }
        Ok(())
    }
}

/// JSON body: `{"search_terms": [{"text": ..., "color": [r, g, b], "comment": ..., "redact": ...}]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_terms: Vec<SearchTerm>,
}

impl SearchRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let request: SearchRequest = serde_json::from_str(json)
            .map_err(|e| RedactError::InvalidSearchTerms(e.to_string()))?;
        validate(&request.search_terms)?;
        Ok(request)
    }
}

fn validate(terms: &[SearchTerm]) -> Result<()> {
    if terms.is_empty() {
        return Err(RedactError::InvalidSearchTerms(
            "At least one search term is required".into(),
        ));
    }
    terms.iter().try_for_each(SearchTerm::validate)
}

/// One occurrence of a term, in native page units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub page: u32,
    /// Index into the term list
    pub term: usize,
    pub bounds: NativeRect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub bytes: Vec<u8>,
    pub hits: Vec<SearchHit>,
}

/// Every occurrence of every term, page by page, in term order.
pub fn find_hits<H: DocumentHandle>(handle: &H, terms: &[SearchTerm]) -> Result<Vec<SearchHit>> {
    let mut hits = Vec::new();
    for page in 1..=handle.page_count() {
        let runs = handle.text_runs(page)?;
        for (term, search) in terms.iter().enumerate() {
            let found = runs.iter().flat_map(|run| run.find(&search.text));
            hits.extend(found.map(|[x0, y0, x1, y1]| SearchHit {
                page,
                term,
                bounds: NativeRect {
                    x: x0,
                    y: y0,
                    width: x1 - x0,
                    height: y1 - y0,
                },
            }));
        }
        debug!(page, runs = runs.len(), "page searched");
    }
    Ok(hits)
}

/// Apply `terms` to `source`.
///
/// With no matches anywhere the source bytes are returned untouched.
#[instrument(skip(codec, source, terms), fields(bytes = source.len(), terms = terms.len()))]
pub fn annotate_search_terms<C: DocumentCodec>(
    codec: &C,
    source: &[u8],
    terms: &[SearchTerm],
) -> Result<Annotated> {
    validate(terms)?;
    let mut handle = codec.load(source)?;
    let hits = find_hits(&handle, terms)?;
    if hits.is_empty() {
        info!("no matches, returning source unchanged");
        return Ok(Annotated {
            bytes: source.to_vec(),
            hits,
        });
    }

    for hit in &hits {
        let term = &terms[hit.term];
        let size = handle.page_size(hit.page)?;
        let NativeRect {
            x,
            y,
            width,
            height,
        } = hit.bounds;

        if term.redacts() {
            let coords = Coordinates {
                x,
                y,
                width,
                height,
            };
            if let Some(rect) = clamp_to_page(&coords, size) {
                handle.draw_rectangle(hit.page, &rect, Rgb::BLACK)?;
            }
            continue;
        }

        let underline = y - UNDERLINE_GAP;
        handle.draw_line(
            hit.page,
            (x, underline),
            (x + width, underline),
            term.rgb(),
            UNDERLINE_WIDTH,
        )?;
        if let Some(comment) = &term.comment {
            let hover = Coordinates {
                x,
                y: y + height - COMMENT_HEIGHT,
                width,
                height: COMMENT_HEIGHT,
            };
            if let Some(rect) = clamp_to_page(&hover, size) {
                handle.add_comment(hit.page, &rect, comment, term.rgb())?;
            }
        }
    }

    let redacted = hits.iter().filter(|h| terms[h.term].redacts()).count();
    info!(
        hits = hits.len(),
        redacted,
        underlined = hits.len() - redacted,
        "search terms applied"
    );
    Ok(Annotated {
        bytes: handle.serialize()?,
        hits,
    })
}
