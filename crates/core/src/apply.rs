//! Applies a page's final rectangles in redact or highlight mode.

use crate::config::{MaskConfig, MaskMode};
use crate::document::PageCanvas;
use crate::geometry::Rect;
use crate::Result;

/// Marks `rects` on `page`.
///
/// Redact: register every area, commit them in one step, then stroke a
/// confirmation border over each. Highlight: stroke outlines only.
/// An empty set leaves the page untouched.
pub fn apply_rects<C: PageCanvas + ?Sized>(
    canvas: &mut C,
    page: usize,
    rects: &[Rect],
    config: &MaskConfig,
) -> Result<()> {
    if rects.is_empty() {
        return Ok(());
    }

    match config.mode {
        MaskMode::Redact => {
            for rect in rects {
                canvas.add_redaction(page, *rect, config.fill_color)?;
            }
            canvas.apply_redactions(page)?;
            if config.stroke_width > 0.0 {
                for rect in rects {
                    canvas.draw_rect(page, *rect, config.stroke_color, config.stroke_width)?;
                }
            }
        }
        MaskMode::Highlight => {
            for rect in rects {
                canvas.draw_rect(page, *rect, config.highlight_color, config.line_width)?;
            }
        }
    }

    log::debug!("[Apply] page {}: {} rects ({:?})", page, rects.len(), config.mode);
    Ok(())
}
