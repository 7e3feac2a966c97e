//! Structured page layout and glyph extraction.
//!
//! A layout source reports a page as blocks → lines → spans → characters.
//! [`extract_lines`] flattens that into [`Line`]s of [`Glyph`]s, the unit the
//! tokenizer and the projector work on.

use crate::geometry::BBox;
use serde::{Deserialize, Serialize};

/// One page as reported by the layout source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<RawBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawBlock {
    Text { lines: Vec<RawLine> },
    Image { bbox: BBox },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLine {
    pub spans: Vec<RawSpan>,
}

/// Run of characters sharing one font and size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSpan {
    pub font: String,
    pub size: f32,
    pub chars: Vec<RawChar>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawChar {
    pub c: char,
    pub bbox: BBox,
}

/// One visual character and its box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BBox,
}

/// Glyphs of one visual text line, in reading order.
///
/// Character offsets used by tokens and spans index into `glyphs`; the
/// reconstructed `text` has exactly one `char` per glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    glyphs: Vec<Glyph>,
    text: String,
}

impl Line {
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        let text = glyphs.iter().map(|g| g.ch).collect();
        Self { glyphs, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Length in characters (not bytes).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Groups a page's raw layout into lines.
///
/// Non-text blocks are skipped, as are lines whose text is empty or only
/// whitespace.
pub fn extract_lines(page: &RawPage) -> Vec<Line> {
    let mut lines = Vec::new();

    for block in &page.blocks {
        let RawBlock::Text { lines: raw_lines } = block else {
            continue;
        };

        for raw_line in raw_lines {
            let glyphs: Vec<Glyph> = raw_line
                .spans
                .iter()
                .flat_map(|span| span.chars.iter())
                .map(|rc| Glyph {
                    ch: rc.c,
                    bbox: rc.bbox,
                })
                .collect();

            if glyphs.iter().all(|g| g.ch.is_whitespace()) {
                continue;
            }
            lines.push(Line::new(glyphs));
        }
    }

    log::debug!("[Layout] {} blocks -> {} lines", page.blocks.len(), lines.len());
    lines
}
