//! Span → rectangle projection.

use crate::geometry::{BoundsAccumulator, Rect};
use crate::layout::Line;
use crate::span::Span;

/// Bounding box of the glyphs covered by `span`.
///
/// Offsets past the end of the line are ignored. `None` when no glyph is
/// covered or the union has no area, which means the tokenizer's offsets and
/// the glyph list disagree; callers drop the span.
pub fn project_span(line: &Line, span: Span) -> Option<Rect> {
    let glyphs = line.glyphs();
    let end = span.end.min(glyphs.len());
    if span.start >= end {
        return None;
    }

    let mut bounds = BoundsAccumulator::default();
    for glyph in &glyphs[span.start..end] {
        bounds.add(&glyph.bbox);
    }
    bounds.finish()
}
