//! Content stream interpreter: positions every shown glyph in page space.
//!
//! The same walk feeds the layout reader and the glyph remover, so a
//! rectangle built from layout boxes selects exactly the glyphs that
//! produced them.

use crate::font::PdfFont;
use crate::utils::{get_matrix, get_number, multiply, resource_entry, transform, Matrix, IDENTITY};
use josamask_core::geometry::{BBox, BoundsAccumulator};
use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct TextParams {
    font: Vec<u8>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// `Tz / 100`.
    scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextParams,
}

/// One glyph drawn by a show operator.
#[derive(Debug, Clone)]
pub struct ShownGlyph {
    pub bytes: Vec<u8>,
    pub format: StringFormat,
    pub text: String,
    pub bbox: BBox,
    /// Advance width in thousandths of text space.
    pub width: f32,
    pub word_space: bool,
    /// `Tc` (plus `Tw` after a word space) the pen moves past the glyph box,
    /// in page space.
    pub spacing: f32,
}

impl ShownGlyph {
    pub fn center(&self) -> (f32, f32) {
        ((self.bbox[0] + self.bbox[2]) / 2.0, (self.bbox[1] + self.bbox[3]) / 2.0)
    }
}

#[derive(Debug, Clone)]
pub enum ShowItem {
    Glyph(ShownGlyph),
    /// A `TJ` displacement number.
    Adjust(Object),
}

/// Everything one `Tj`, `TJ`, `'` or `"` operator drew.
#[derive(Debug, Clone)]
pub struct ShowEvent {
    pub op_index: usize,
    /// Index of the enclosing `BT … ET` object on the page.
    pub text_object: usize,
    pub font: Vec<u8>,
    pub size: f32,
    pub char_spacing: f32,
    pub word_spacing: f32,
    /// Baseline start point in page space.
    pub origin: (f32, f32),
    /// Glyph height in page space.
    pub em: f32,
    pub items: Vec<ShowItem>,
}

impl ShowEvent {
    pub fn glyphs(&self) -> impl Iterator<Item = &ShownGlyph> {
        self.items.iter().filter_map(|item| match item {
            ShowItem::Glyph(g) => Some(g),
            ShowItem::Adjust(_) => None,
        })
    }
}

/// Something drawn by the content stream, in drawing order.
#[derive(Debug, Clone)]
pub enum Mark {
    Show(ShowEvent),
    Image { op_index: usize, bbox: BBox },
}

/// Walks a decoded content stream.
pub struct Interpreter<'a> {
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    fonts: &'a HashMap<Vec<u8>, PdfFont>,
    fallback: PdfFont,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    text_object: usize,
    in_text: bool,
    missing_fonts: Vec<Vec<u8>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        doc: &'a Document,
        resources: Option<&'a Dictionary>,
        fonts: &'a HashMap<Vec<u8>, PdfFont>,
    ) -> Self {
        Self {
            doc,
            resources,
            fonts,
            fallback: PdfFont::default(),
            state: GraphicsState {
                ctm: IDENTITY,
                text: TextParams::default(),
            },
            stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            text_object: 0,
            in_text: false,
            missing_fonts: Vec::new(),
        }
    }

    pub fn run(mut self, operations: &[Operation]) -> Vec<Mark> {
        let mut marks = Vec::new();
        for (op_index, op) in operations.iter().enumerate() {
            if let Some(mark) = self.step(op_index, op) {
                marks.push(mark);
            }
        }
        marks
    }

    fn step(&mut self, op_index: usize, op: &Operation) -> Option<Mark> {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = get_matrix(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "ET" => {
                if self.in_text {
                    self.text_object += 1;
                }
                self.in_text = false;
            }
            "Tf" if operands.len() >= 2 => {
                if let Object::Name(name) = &operands[0] {
                    self.state.text.font = name.clone();
                }
                if let Some(size) = get_number(&operands[1]) {
                    self.state.text.size = size;
                }
            }
            "Tc" => self.set_param(operands, |t, v| t.char_spacing = v),
            "Tw" => self.set_param(operands, |t, v| t.word_spacing = v),
            "Tz" => self.set_param(operands, |t, v| t.scale = v / 100.0),
            "TL" => self.set_param(operands, |t, v| t.leading = v),
            "Ts" => self.set_param(operands, |t, v| t.rise = v),
            "Td" if operands.len() >= 2 => {
                if let (Some(tx), Some(ty)) = (get_number(&operands[0]), get_number(&operands[1])) {
                    self.move_line(tx, ty);
                }
            }
            "TD" if operands.len() >= 2 => {
                if let (Some(tx), Some(ty)) = (get_number(&operands[0]), get_number(&operands[1])) {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = get_matrix(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                let items = operands.first().map(std::slice::from_ref).unwrap_or_default();
                return self.show(op_index, items);
            }
            "'" => {
                self.next_line();
                let items = operands.first().map(std::slice::from_ref).unwrap_or_default();
                return self.show(op_index, items);
            }
            "\"" if operands.len() >= 3 => {
                if let Some(aw) = get_number(&operands[0]) {
                    self.state.text.word_spacing = aw;
                }
                if let Some(ac) = get_number(&operands[1]) {
                    self.state.text.char_spacing = ac;
                }
                self.next_line();
                return self.show(op_index, &operands[2..3]);
            }
            "TJ" => {
                if let Some(Object::Array(arr)) = operands.first() {
                    return self.show(op_index, arr);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    return self.xobject(op_index, name);
                }
            }
            _ => {}
        }
        None
    }

    fn set_param(&mut self, operands: &[Object], apply: impl FnOnce(&mut TextParams, f32)) {
        if let Some(v) = operands.first().and_then(get_number) {
            apply(&mut self.state.text, v);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.tm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.tm);
    }

    fn font(&mut self) -> &PdfFont {
        let name = &self.state.text.font;
        match self.fonts.get(name) {
            Some(font) => font,
            None => {
                if !self.missing_fonts.contains(name) {
                    log::warn!("[Layout] font /{} not found, using defaults", String::from_utf8_lossy(name));
                    self.missing_fonts.push(name.clone());
                }
                &self.fallback
            }
        }
    }

    fn show(&mut self, op_index: usize, items: &[Object]) -> Option<Mark> {
        if !self.in_text {
            return None;
        }
        let params = self.state.text.clone();
        let font = self.font().clone();
        let trm = multiply(&self.tm, &self.state.ctm);
        let origin = transform(&trm, 0.0, params.rise);
        let em = text_height(&trm, params.size);

        let mut shown = Vec::new();
        for item in items {
            match item {
                Object::String(bytes, format) => {
                    for (code, chunk) in font.codes(bytes) {
                        let width = font.width(code);
                        let word_space = font.is_word_space(code);
                        let bbox = self.glyph_box(&params, &font, width);
                        let spacing = params.char_spacing + if word_space { params.word_spacing } else { 0.0 };
                        shown.push(ShowItem::Glyph(ShownGlyph {
                            bytes: chunk.to_vec(),
                            format: *format,
                            text: font.text(code),
                            bbox,
                            width,
                            word_space,
                            spacing: text_width(&trm, spacing * params.scale),
                        }));
                        self.advance((width / 1000.0 * params.size + spacing) * params.scale);
                    }
                }
                Object::Integer(_) | Object::Real(_) => {
                    let n = get_number(item).unwrap_or(0.0);
                    self.advance(-n / 1000.0 * params.size * params.scale);
                    shown.push(ShowItem::Adjust(item.clone()));
                }
                _ => {}
            }
        }

        Some(Mark::Show(ShowEvent {
            op_index,
            text_object: self.text_object,
            font: params.font,
            size: params.size,
            char_spacing: params.char_spacing,
            word_spacing: params.word_spacing,
            origin,
            em,
            items: shown,
        }))
    }

    /// Page-space box of a glyph at the current text position.
    fn glyph_box(&self, params: &TextParams, font: &PdfFont, width: f32) -> BBox {
        let trm = multiply(&self.tm, &self.state.ctm);
        let x1 = width / 1000.0 * params.size * params.scale;
        let y0 = font.descent * params.size + params.rise;
        let y1 = font.ascent * params.size + params.rise;

        let mut acc = BoundsAccumulator::default();
        for (x, y) in [(0.0, y0), (x1, y0), (0.0, y1), (x1, y1)] {
            let (px, py) = transform(&trm, x, y);
            acc.add(&[px, py, px, py]);
        }
        acc.finish()
            .map(|r| [r.x0, r.y0, r.x1, r.y1])
            .unwrap_or_else(|| {
                let (px, py) = transform(&trm, 0.0, y0);
                [px, py, px, py]
            })
    }

    fn xobject(&self, op_index: usize, name: &[u8]) -> Option<Mark> {
        let Some(Object::Stream(stream)) = resource_entry(self.doc, self.resources, b"XObject", name) else {
            return None;
        };
        match stream.dict.get(b"Subtype") {
            Ok(Object::Name(subtype)) if subtype == b"Image" => {
                let mut acc = BoundsAccumulator::default();
                for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
                    let (px, py) = transform(&self.state.ctm, x, y);
                    acc.add(&[px, py, px, py]);
                }
                acc.finish().map(|r| Mark::Image {
                    op_index,
                    bbox: [r.x0, r.y0, r.x1, r.y1],
                })
            }
            _ => {
                log::debug!("[Layout] form XObject /{} not descended", String::from_utf8_lossy(name));
                None
            }
        }
    }
}

/// Signed page-space length of a horizontal text-space distance.
fn text_width(trm: &Matrix, dx: f32) -> f32 {
    let (x0, y0) = transform(trm, 0.0, 0.0);
    let (x1, y1) = transform(trm, dx, 0.0);
    ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt().copysign(dx)
}

fn text_height(trm: &Matrix, size: f32) -> f32 {
    let (x0, y0) = transform(trm, 0.0, 0.0);
    let (x1, y1) = transform(trm, 0.0, size);
    ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;

    fn helvetica() -> HashMap<Vec<u8>, PdfFont> {
        let mut fonts = HashMap::new();
        fonts.insert(b"F1".to_vec(), PdfFont::default());
        fonts
    }

    fn run(ops: Vec<Operation>) -> Vec<Mark> {
        let doc = Document::with_version("1.5");
        let fonts = helvetica();
        Interpreter::new(&doc, None, &fonts).run(&ops)
    }

    fn shows(marks: &[Mark]) -> Vec<&ShowEvent> {
        marks
            .iter()
            .filter_map(|m| match m {
                Mark::Show(e) => Some(e),
                Mark::Image { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_glyph_positions_follow_widths() {
        let marks = run(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("AI")]),
            Operation::new("ET", vec![]),
        ]);
        let events = shows(&marks);
        assert_eq!(events.len(), 1);
        let glyphs: Vec<_> = events[0].glyphs().collect();
        assert_eq!(glyphs.len(), 2);
        // A = 667, I = 278
        assert!((glyphs[0].bbox[0] - 100.0).abs() < 1e-3);
        assert!((glyphs[0].bbox[2] - 106.67).abs() < 1e-3);
        assert!((glyphs[1].bbox[0] - 106.67).abs() < 1e-3);
        assert!((glyphs[1].bbox[2] - 109.45).abs() < 1e-3);
        assert!((glyphs[0].bbox[1] - 698.0).abs() < 1e-3);
        assert!((glyphs[0].bbox[3] - 708.0).abs() < 1e-3);
        assert_eq!(events[0].origin, (100.0, 700.0));
    }

    #[test]
    fn test_tj_adjustment_and_spacing() {
        let marks = run(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Tc", vec![1.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("A"),
                    Object::Integer(-1000),
                    Object::string_literal("A"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ]);
        let events = shows(&marks);
        let glyphs: Vec<_> = events[0].glyphs().collect();
        // 6.67 + Tc 1 + 10 from the -1000 displacement
        assert!((glyphs[1].bbox[0] - 17.67).abs() < 1e-3);
        assert!((glyphs[0].spacing - 1.0).abs() < 1e-3);
        assert_eq!(events[0].items.len(), 3);
    }

    #[test]
    fn test_ctm_scales_boxes() {
        let marks = run(vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Tj", vec![Object::string_literal("A")]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Tj", vec![Object::string_literal("A")]),
            Operation::new("ET", vec![]),
        ]);
        let events = shows(&marks);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].text_object, 0);
        assert_eq!(events[1].text_object, 1);
        assert!((events[0].em - 20.0).abs() < 1e-3);
        assert!((events[1].em - 10.0).abs() < 1e-3);
        let a = events[0].glyphs().next().unwrap().bbox;
        assert!((a[2] - 13.34).abs() < 1e-3);
    }

    #[test]
    fn test_quote_moves_to_next_line() {
        let marks = run(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("Td", vec![0.into(), 100.into()]),
            Operation::new("Tj", vec![Object::string_literal("A")]),
            Operation::new("'", vec![Object::string_literal("B")]),
            Operation::new("ET", vec![]),
        ]);
        let events = shows(&marks);
        assert_eq!(events[0].origin.1, 100.0);
        assert_eq!(events[1].origin.1, 88.0);
        assert_eq!(events[1].origin.0, 0.0);
    }

    #[test]
    fn test_show_outside_text_object_ignored() {
        let content = Content::decode(b"(stray) Tj BT /F1 12 Tf (ok) Tj ET").unwrap();
        let marks = run(content.operations);
        assert_eq!(shows(&marks).len(), 1);
    }
}
