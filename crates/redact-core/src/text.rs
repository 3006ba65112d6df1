//! Locating shown text in a page content stream
//!
//! Glyph widths come from a fixed em fraction rather than font metrics, so
//! boxes are approximate horizontally. Positions follow the text matrix,
//! the CTM (`cm`, `q`/`Q`), leading, character and word spacing, horizontal
//! scaling and rise.

use lopdf::content::Operation;
use lopdf::Object;

/// Advance of every glyph, as a fraction of the font size
const GLYPH_WIDTH_EM: f64 = 0.5;
const ASCENT_EM: f64 = 0.8;
const DESCENT_EM: f64 = -0.2;

/// `TJ` adjustments larger than this (in thousandths of an em) read as a space
const TJ_SPACE_THRESHOLD: f64 = 100.0;

/// Axis-aligned box in user space, `[x0, y0, x1, y1]`
pub type Bounds = [f64; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bounds: Bounds,
}

/// Glyphs shown between two text-positioning operators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRun {
    pub glyphs: Vec<Glyph>,
}

impl TextRun {
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }

    /// Every non-overlapping, ASCII case-insensitive occurrence of `needle`,
    /// as the union of its glyph boxes.
    pub fn find(&self, needle: &str) -> Vec<Bounds> {
        let needle: Vec<char> = needle.chars().map(|c| c.to_ascii_lowercase()).collect();
        if needle.is_empty() || needle.len() > self.glyphs.len() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        let mut start = 0;
        while start + needle.len() <= self.glyphs.len() {
            let window = &self.glyphs[start..start + needle.len()];
            if window
                .iter()
                .zip(&needle)
                .all(|(g, c)| g.ch.to_ascii_lowercase() == *c)
            {
                hits.push(union(window.iter().map(|g| g.bounds)));
                start += needle.len();
            } else {
                start += 1;
            }
        }
        hits
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other` in PDF's row-vector convention
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [oa, ob, oc, od, oe, of] = other.0;
        Matrix([
            a * oa + b * oc,
            a * ob + b * od,
            c * oa + d * oc,
            c * ob + d * od,
            e * oa + f * oc + oe,
            e * ob + f * od + of,
        ])
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.0;
        (x * a + y * c + e, x * b + y * d + f)
    }

    fn from_operands(operands: &[Object]) -> Option<Self> {
        let values = numbers(operands);
        let values: [f64; 6] = values.get(..6)?.try_into().ok()?;
        Some(Matrix(values))
    }
}

struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_size: 0.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            rise: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn glyph(&mut self, ch: char) -> Glyph {
        let width = GLYPH_WIDTH_EM * self.font_size * self.h_scale;
        let low = self.rise + DESCENT_EM * self.font_size;
        let high = self.rise + ASCENT_EM * self.font_size;
        let to_user = self.tm.then(&self.ctm);
        let corners = [(0.0, low), (width, low), (0.0, high), (width, high)]
            .map(|(x, y)| to_user.apply(x, y));
        let bounds = union(corners.iter().map(|&(x, y)| [x, y, x, y]));

        let mut advance = GLYPH_WIDTH_EM * self.font_size + self.char_spacing;
        if ch == ' ' {
            advance += self.word_spacing;
        }
        self.shift(advance * self.h_scale);
        Glyph { ch, bounds }
    }

    /// Move along the baseline by `tx` unscaled text-space units
    fn shift(&mut self, tx: f64) {
        self.tm = Matrix::translate(tx, 0.0).then(&self.tm);
    }

    /// Zero-width marker at the current position
    fn space_marker(&self) -> Glyph {
        let (x, y) = self.tm.then(&self.ctm).apply(0.0, self.rise);
        Glyph {
            ch: ' ',
            bounds: [x, y, x, y],
        }
    }
}

/// Split a page's operations into text runs, in user-space coordinates.
pub fn text_runs(operations: &[Operation]) -> Vec<TextRun> {
    let mut state = TextState::default();
    let mut runs = Vec::new();
    let mut current = TextRun::default();

    for op in operations {
        let nums = numbers(&op.operands);
        let num = |i: usize| nums.get(i).copied().unwrap_or(0.0);
        match op.operator.as_str() {
            "q" => state.saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.ctm = m.then(&state.ctm);
                }
            }
            "BT" => {
                flush(&mut current, &mut runs);
                state.tm = Matrix::IDENTITY;
                state.tlm = Matrix::IDENTITY;
            }
            "ET" => flush(&mut current, &mut runs),
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => state.leading = num(0),
            "Tc" => state.char_spacing = num(0),
            "Tw" => state.word_spacing = num(0),
            "Tz" => state.h_scale = num(0) / 100.0,
            "Ts" => state.rise = num(0),
            "Td" => {
                flush(&mut current, &mut runs);
                state.move_line(num(0), num(1));
            }
            "TD" => {
                flush(&mut current, &mut runs);
                state.leading = -num(1);
                state.move_line(num(0), num(1));
            }
            "Tm" => {
                flush(&mut current, &mut runs);
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.tlm = m;
                    state.tm = m;
                }
            }
            "T*" => {
                flush(&mut current, &mut runs);
                state.move_line(0.0, -state.leading);
            }
            "Tj" => show(&mut state, &mut current, op.operands.first()),
            "'" => {
                flush(&mut current, &mut runs);
                state.move_line(0.0, -state.leading);
                show(&mut state, &mut current, op.operands.first());
            }
            "\"" => {
                flush(&mut current, &mut runs);
                state.word_spacing = num(0);
                state.char_spacing = num(1);
                state.move_line(0.0, -state.leading);
                show(&mut state, &mut current, op.operands.get(2));
            }
            "TJ" => {
                let Some(Object::Array(items)) = op.operands.first() else {
                    continue;
                };
                for item in items {
                    match item {
                        Object::String(..) => show(&mut state, &mut current, Some(item)),
                        other => {
                            if let Some(adjust) = number(other) {
                                if adjust < -TJ_SPACE_THRESHOLD {
                                    current.glyphs.push(state.space_marker());
                                }
                                state.shift(-adjust / 1000.0 * state.font_size * state.h_scale);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    flush(&mut current, &mut runs);
    runs
}

fn flush(current: &mut TextRun, runs: &mut Vec<TextRun>) {
    if !current.glyphs.is_empty() {
        runs.push(std::mem::take(current));
    }
}

fn show(state: &mut TextState, run: &mut TextRun, operand: Option<&Object>) {
    let Some(Object::String(bytes, _)) = operand else {
        return;
    };
    for ch in decode(bytes) {
        let glyph = state.glyph(ch);
        run.glyphs.push(glyph);
    }
}

/// One char per shown glyph: UTF-16BE when marked with a BOM, else one
/// Latin-1 char per byte.
fn decode(bytes: &[u8]) -> Vec<char> {
    if let Some(units) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = units
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

fn union(boxes: impl Iterator<Item = Bounds>) -> Bounds {
    boxes
        .reduce(|a, b| [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])])
        .unwrap_or_default()
}
