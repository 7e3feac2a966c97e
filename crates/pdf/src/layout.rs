//! Groups interpreter output into blocks, lines, spans and characters.

use crate::text::{Mark, ShowEvent};
use josamask_core::geometry::BBox;
use josamask_core::layout::{RawBlock, RawChar, RawLine, RawPage, RawSpan};

/// A gap wider than this fraction of the font height reads as a word break.
const SPACE_GAP_EM: f32 = 0.25;
/// Baseline shift, as a fraction of the font height, that starts a new line.
const BASELINE_TOLERANCE_EM: f32 = 0.2;

#[derive(Default)]
struct LineBuilder {
    baseline: f32,
    spans: Vec<RawSpan>,
    last: Option<RawChar>,
    /// Character and word spacing the pen moved past `last`.
    last_spacing: f32,
}

impl LineBuilder {
    fn push_event(&mut self, event: &ShowEvent) {
        let mut span = RawSpan {
            font: String::from_utf8_lossy(&event.font).into_owned(),
            size: event.em,
            chars: Vec::new(),
        };

        for glyph in event.glyphs() {
            let chars: Vec<char> = glyph.text.chars().collect();
            if chars.is_empty() {
                continue;
            }

            if let Some(last) = self.last {
                // letter spacing is not a word break, only jumps beyond it are
                let gap = glyph.bbox[0] - last.bbox[2] - self.last_spacing;
                if gap > SPACE_GAP_EM * event.em && !last.c.is_whitespace() && !chars[0].is_whitespace() {
                    let space = RawChar {
                        c: ' ',
                        bbox: [last.bbox[2], glyph.bbox[1], glyph.bbox[0], glyph.bbox[3]],
                    };
                    span.chars.push(space);
                }
            }

            for (c, bbox) in chars.iter().zip(split_box(&glyph.bbox, chars.len())) {
                let rc = RawChar { c: *c, bbox };
                span.chars.push(rc);
                self.last = Some(rc);
            }
            self.last_spacing = glyph.spacing;
        }

        if !span.chars.is_empty() {
            self.spans.push(span);
        }
    }

    fn finish(self) -> Option<RawLine> {
        (!self.spans.is_empty()).then_some(RawLine { spans: self.spans })
    }
}

/// Divides a ligature box evenly between its characters.
fn split_box(bbox: &BBox, n: usize) -> Vec<BBox> {
    let step = (bbox[2] - bbox[0]) / n as f32;
    (0..n)
        .map(|i| {
            let x0 = bbox[0] + step * i as f32;
            [x0, bbox[1], x0 + step, bbox[3]]
        })
        .collect()
}

#[derive(Default)]
struct BlockBuilder {
    text_object: Option<usize>,
    lines: Vec<RawLine>,
    line: Option<LineBuilder>,
}

impl BlockBuilder {
    fn push_event(&mut self, event: &ShowEvent) {
        let tolerance = (BASELINE_TOLERANCE_EM * event.em).max(0.5);
        let same_line = self
            .line
            .as_ref()
            .map(|line| (line.baseline - event.origin.1).abs() <= tolerance)
            .unwrap_or(false);

        if !same_line {
            self.close_line();
            self.line = Some(LineBuilder {
                baseline: event.origin.1,
                ..LineBuilder::default()
            });
        }
        if let Some(line) = self.line.as_mut() {
            line.push_event(event);
        }
    }

    fn close_line(&mut self) {
        if let Some(line) = self.line.take().and_then(LineBuilder::finish) {
            self.lines.push(line);
        }
    }

    fn finish(mut self) -> Option<RawBlock> {
        self.close_line();
        (!self.lines.is_empty()).then_some(RawBlock::Text { lines: self.lines })
    }
}

/// Builds the raw layout of one page from its marks.
pub fn build_layout(marks: &[Mark], width: f32, height: f32) -> RawPage {
    let mut blocks = Vec::new();
    let mut current = BlockBuilder::default();

    for mark in marks {
        match mark {
            Mark::Show(event) => {
                if current.text_object != Some(event.text_object) {
                    blocks.extend(std::mem::take(&mut current).finish());
                    current.text_object = Some(event.text_object);
                }
                current.push_event(event);
            }
            Mark::Image { bbox, .. } => {
                blocks.extend(std::mem::take(&mut current).finish());
                blocks.push(RawBlock::Image { bbox: *bbox });
            }
        }
    }
    blocks.extend(current.finish());

    RawPage { width, height, blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::PdfFont;
    use crate::text::Interpreter;
    use lopdf::content::Content;
    use lopdf::Document;
    use std::collections::HashMap;

    fn layout(stream: &[u8]) -> RawPage {
        let doc = Document::with_version("1.5");
        let mut fonts = HashMap::new();
        fonts.insert(b"F1".to_vec(), PdfFont::default());
        let content = Content::decode(stream).unwrap();
        let marks = Interpreter::new(&doc, None, &fonts).run(&content.operations);
        build_layout(&marks, 612.0, 792.0)
    }

    fn line_texts(page: &RawPage) -> Vec<String> {
        page.blocks
            .iter()
            .flat_map(|b| match b {
                RawBlock::Text { lines } => lines.clone(),
                RawBlock::Image { .. } => Vec::new(),
            })
            .map(|l| l.spans.iter().flat_map(|s| s.chars.iter().map(|c| c.c)).collect())
            .collect()
    }

    #[test]
    fn test_lines_split_on_baseline() {
        let page = layout(b"BT /F1 10 Tf 72 700 Td (Hello) Tj 0 -14 Td (World) Tj ET");
        assert_eq!(line_texts(&page), vec!["Hello", "World"]);
        assert_eq!(page.blocks.len(), 1);
    }

    #[test]
    fn test_spans_on_same_baseline_join() {
        let page = layout(b"BT /F1 10 Tf 72 700 Td (Hel) Tj (lo) Tj ET");
        assert_eq!(line_texts(&page), vec!["Hello"]);
        let RawBlock::Text { lines } = &page.blocks[0] else {
            panic!("expected text block");
        };
        assert_eq!(lines[0].spans.len(), 2);
    }

    #[test]
    fn test_wide_gap_inserts_space() {
        let page = layout(b"BT /F1 10 Tf 72 700 Td [(ab) -400 (cd)] TJ ET");
        assert_eq!(line_texts(&page), vec!["ab cd"]);
    }

    #[test]
    fn test_letter_spacing_is_not_a_word_break() {
        let page = layout(b"BT /F1 10 Tf 4 Tc 72 700 Td (ab) Tj ( cd) Tj ET");
        assert_eq!(line_texts(&page), vec!["ab cd"]);
    }

    #[test]
    fn test_gap_beyond_letter_spacing_inserts_space() {
        let page = layout(b"BT /F1 10 Tf 4 Tc 72 700 Td [(ab) -400 (cd)] TJ ET");
        assert_eq!(line_texts(&page), vec!["ab cd"]);
    }

    #[test]
    fn test_word_spacing_after_space_glyph() {
        let page = layout(b"BT /F1 10 Tf 8 Tw 72 700 Td (a b) Tj ET");
        assert_eq!(line_texts(&page), vec!["a b"]);
    }

    #[test]
    fn test_narrow_kerning_no_space() {
        let page = layout(b"BT /F1 10 Tf 72 700 Td [(ab) -50 (cd)] TJ ET");
        assert_eq!(line_texts(&page), vec!["abcd"]);
    }

    #[test]
    fn test_each_text_object_is_a_block() {
        let page = layout(b"BT /F1 10 Tf 72 700 Td (one) Tj ET BT /F1 10 Tf 72 600 Td (two) Tj ET");
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(line_texts(&page), vec!["one", "two"]);
    }

    #[test]
    fn test_split_box() {
        let parts = split_box(&[0.0, 0.0, 10.0, 5.0], 2);
        assert_eq!(parts, vec![[0.0, 0.0, 5.0, 5.0], [5.0, 0.0, 10.0, 5.0]]);
    }
}
