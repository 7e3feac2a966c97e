//! Cuts glyphs out of show operators.
//!
//! A glyph is removed when the centre of its box lies inside a rectangle.
//! Its code is replaced by a `TJ` displacement equal to its advance, so the
//! glyphs that stay keep their positions. An image XObject lying wholly
//! inside one rectangle is not drawn at all.

use crate::text::{Mark, ShowEvent, ShowItem, ShownGlyph};
use crate::utils::get_number;
use josamask_core::geometry::{BBox, Rect};
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};
use std::collections::{HashMap, HashSet};

fn covered(glyph: &ShownGlyph, rects: &[Rect]) -> bool {
    let (cx, cy) = glyph.center();
    rects.iter().any(|r| r.contains_point(cx, cy))
}

/// Displacement number that advances exactly as far as `glyph` did.
fn displacement(glyph: &ShownGlyph, event: &ShowEvent) -> f32 {
    let spacing = event.char_spacing + if glyph.word_space { event.word_spacing } else { 0.0 };
    if event.size.abs() < f32::EPSILON {
        return -glyph.width;
    }
    -(glyph.width + spacing * 1000.0 / event.size)
}

#[derive(Default)]
struct ArrayBuilder {
    array: Vec<Object>,
    run: Vec<u8>,
    format: Option<StringFormat>,
    adjust: f32,
}

impl ArrayBuilder {
    fn flush_run(&mut self) {
        if let Some(format) = self.format.take() {
            self.array.push(Object::String(std::mem::take(&mut self.run), format));
        }
    }

    fn flush_adjust(&mut self) {
        if self.adjust != 0.0 {
            self.array.push(Object::Real(self.adjust));
            self.adjust = 0.0;
        }
    }

    fn keep(&mut self, glyph: &ShownGlyph) {
        if self.adjust != 0.0 {
            self.flush_run();
            self.flush_adjust();
        }
        if self.format.is_some() && self.format != Some(glyph.format) {
            self.flush_run();
        }
        self.format = Some(glyph.format);
        self.run.extend_from_slice(&glyph.bytes);
    }

    fn skip(&mut self, amount: f32) {
        self.flush_run();
        self.adjust += amount;
    }

    fn finish(mut self) -> Vec<Object> {
        self.flush_run();
        self.flush_adjust();
        self.array
    }
}

fn image_covered(bbox: &BBox, rects: &[Rect]) -> bool {
    rects.iter().any(|r| {
        r.x0 <= bbox[0] && r.y0 <= bbox[1] && r.x1 >= bbox[2] && r.y1 >= bbox[3]
    })
}

/// `TJ` operand equivalent to `event` minus the covered glyphs.
fn rewritten_array(event: &ShowEvent, rects: &[Rect]) -> (Vec<Object>, usize) {
    let mut builder = ArrayBuilder::default();
    let mut removed = 0;
    for item in &event.items {
        match item {
            ShowItem::Glyph(glyph) if covered(glyph, rects) => {
                builder.skip(displacement(glyph, event));
                removed += 1;
            }
            ShowItem::Glyph(glyph) => builder.keep(glyph),
            ShowItem::Adjust(obj) => builder.skip(get_number(obj).unwrap_or(0.0)),
        }
    }
    (builder.finish(), removed)
}

/// Rewrites `operations` so that no glyph centred in `rects` is drawn, and
/// drops the `Do` of every image a single rectangle covers.
/// Returns the new operations and the number of glyphs removed.
pub fn remove_glyphs(operations: Vec<Operation>, marks: &[Mark], rects: &[Rect]) -> (Vec<Operation>, usize) {
    let mut events: HashMap<usize, &ShowEvent> = HashMap::new();
    let mut hidden_images: HashSet<usize> = HashSet::new();
    for mark in marks {
        match mark {
            Mark::Show(event) => {
                events.insert(event.op_index, event);
            }
            Mark::Image { op_index, bbox } if image_covered(bbox, rects) => {
                hidden_images.insert(*op_index);
            }
            Mark::Image { .. } => {}
        }
    }

    let mut removed_total = 0;
    let mut out = Vec::with_capacity(operations.len());

    for (index, op) in operations.into_iter().enumerate() {
        if hidden_images.contains(&index) {
            log::debug!("[Redact] op {} `Do`: image removed", index);
            continue;
        }
        let Some(event) = events.get(&index) else {
            out.push(op);
            continue;
        };
        if !event.glyphs().any(|g| covered(g, rects)) {
            out.push(op);
            continue;
        }

        let (array, removed) = rewritten_array(event, rects);
        removed_total += removed;
        log::debug!("[Redact] op {} `{}`: {} glyphs removed", index, op.operator, removed);

        match op.operator.as_str() {
            "'" => out.push(Operation::new("T*", vec![])),
            "\"" => {
                let mut operands = op.operands.into_iter();
                if let Some(aw) = operands.next() {
                    out.push(Operation::new("Tw", vec![aw]));
                }
                if let Some(ac) = operands.next() {
                    out.push(Operation::new("Tc", vec![ac]));
                }
                out.push(Operation::new("T*", vec![]));
            }
            _ => {}
        }
        out.push(Operation::new("TJ", vec![Object::Array(array)]));
    }

    (out, removed_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::PdfFont;
    use crate::text::Interpreter;
    use lopdf::content::Content;
    use lopdf::Document;

    fn marks_for(ops: &[Operation]) -> Vec<Mark> {
        let doc = Document::with_version("1.5");
        let mut fonts = HashMap::new();
        fonts.insert(b"F1".to_vec(), PdfFont::default());
        Interpreter::new(&doc, None, &fonts).run(ops)
    }

    fn glyph_xs(ops: &[Operation]) -> Vec<(String, f32)> {
        marks_for(ops)
            .iter()
            .filter_map(|m| match m {
                Mark::Show(e) => Some(e),
                Mark::Image { .. } => None,
            })
            .flat_map(|e| e.glyphs().map(|g| (g.text.clone(), g.bbox[0])).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_removed_glyphs_keep_following_positions() {
        let ops = Content::decode(b"BT /F1 10 Tf 1 Tc 72 700 Td (ABCD) Tj (E) Tj ET")
            .unwrap()
            .operations;
        let before = glyph_xs(&ops);
        // covers B and C
        let rect = Rect::new(before[1].1, 690.0, before[3].1 - 0.1, 720.0).unwrap();

        let marks = marks_for(&ops);
        let (rewritten, removed) = remove_glyphs(ops, &marks, &[rect]);
        assert_eq!(removed, 2);

        let after = glyph_xs(&rewritten);
        let texts: Vec<&str> = after.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["A", "D", "E"]);
        assert!((after[1].1 - before[3].1).abs() < 1e-3);
        assert!((after[2].1 - before[4].1).abs() < 1e-3);
    }

    #[test]
    fn test_word_spacing_preserved_for_removed_space() {
        let ops = Content::decode(b"BT /F1 10 Tf 5 Tw 0 700 Td (a b) Tj ET").unwrap().operations;
        let before = glyph_xs(&ops);
        let space_x = before[1].1 + 0.5;
        let rect = Rect::new(space_x, 690.0, space_x + 1.0, 720.0).unwrap();

        let marks = marks_for(&ops);
        let (rewritten, removed) = remove_glyphs(ops, &marks, &[rect]);
        assert_eq!(removed, 1);
        let after = glyph_xs(&rewritten);
        assert_eq!(after.len(), 2);
        assert!((after[1].1 - before[2].1).abs() < 1e-3);
    }

    #[test]
    fn test_quote_operators_keep_line_moves() {
        let ops = Content::decode(b"BT /F1 10 Tf 12 TL 0 700 Td (x) Tj 1 0 (yy) \" ET")
            .unwrap()
            .operations;
        let rect = Rect::new(-1.0, 680.0, 100.0, 695.0).unwrap();
        let marks = marks_for(&ops);
        let (rewritten, removed) = remove_glyphs(ops, &marks, &[rect]);
        assert_eq!(removed, 2);
        let operators: Vec<&str> = rewritten.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["BT", "Tf", "TL", "Td", "Tj", "Tw", "Tc", "T*", "TJ", "ET"]);
    }

    #[test]
    fn test_untouched_operations_pass_through() {
        let ops = Content::decode(b"BT /F1 10 Tf 0 700 Td (keep) Tj ET").unwrap().operations;
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let marks = marks_for(&ops);
        let (rewritten, removed) = remove_glyphs(ops.clone(), &marks, &[rect]);
        assert_eq!(removed, 0);
        assert_eq!(rewritten.len(), ops.len());
        assert_eq!(rewritten[3].operator, "Tj");
    }

    #[test]
    fn test_fully_covered_image_is_dropped() {
        let ops = Content::decode(b"q 50 0 0 50 100 100 cm /Im1 Do Q q 50 0 0 50 300 100 cm /Im2 Do Q")
            .unwrap()
            .operations;
        let marks = vec![
            Mark::Image { op_index: 2, bbox: [100.0, 100.0, 150.0, 150.0] },
            Mark::Image { op_index: 6, bbox: [300.0, 100.0, 350.0, 150.0] },
        ];
        // whole of the first image, half of the second
        let rects = [
            Rect::new(90.0, 90.0, 160.0, 160.0).unwrap(),
            Rect::new(290.0, 90.0, 325.0, 160.0).unwrap(),
        ];
        let (rewritten, removed) = remove_glyphs(ops, &marks, &rects);
        assert_eq!(removed, 0);
        let operators: Vec<&str> = rewritten.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, vec!["q", "cm", "Q", "q", "cm", "Do", "Q"]);
        assert_eq!(rewritten[5].operands, vec![Object::Name(b"Im2".to_vec())]);
    }
}
