//! Post-processing verification checks.
//!
//! Re-reads a masked document and compares it with its source: same pages in
//! the same order, and for redaction no visible glyph left under an applied
//! rectangle.

use josamask_core::config::MaskMode;
use josamask_core::geometry::Rect;
use josamask_core::layout::{RawBlock, RawPage};
use josamask_core::pipeline::MaskReport;
use josamask_core::MaskError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page sizes closer than this are treated as equal.
const SIZE_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Compare page count and per-page size with the source.
    pub page_order: bool,
    /// Look for glyphs left inside redacted rectangles.
    pub text_search: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            page_order: true,
            text_search: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResult {
    pub ok: bool,
    pub warnings: Vec<String>,
    /// Non-whitespace glyphs found inside applied rectangles.
    pub residual_glyphs: usize,
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("cannot read source document: {0}")]
    Source(#[source] MaskError),

    #[error("cannot read output document: {0}")]
    Output(#[source] MaskError),
}

/// Checks `output` against `source` using the rectangles recorded in `report`.
pub fn verify_output(
    source: &[u8],
    output: &[u8],
    report: &MaskReport,
    mode: MaskMode,
    options: &VerifyOptions,
) -> Result<VerifyResult, VerifyError> {
    let before = josamask_pdf::read_layouts(source).map_err(VerifyError::Source)?;
    let after = josamask_pdf::read_layouts(output).map_err(VerifyError::Output)?;
    let mut warnings = Vec::new();
    let mut residual_glyphs = 0;

    if options.page_order {
        warnings.extend(compare_pages(&before, &after));
    }

    if options.text_search {
        match mode {
            MaskMode::Redact => {
                for page_report in &report.pages {
                    let Some(page) = after.get(page_report.page) else {
                        continue;
                    };
                    let found = residual_in(page, &page_report.rects);
                    if found > 0 {
                        warnings.push(format!(
                            "page {}: {} glyphs left inside redacted areas",
                            page_report.page + 1,
                            found
                        ));
                    }
                    residual_glyphs += found;
                }
            }
            MaskMode::Highlight => {
                for (index, (src, out)) in before.iter().zip(&after).enumerate() {
                    let (expected, found) = (visible_chars(src), visible_chars(out));
                    if expected != found {
                        warnings.push(format!(
                            "page {}: highlight changed text ({} glyphs before, {} after)",
                            index + 1,
                            expected,
                            found
                        ));
                    }
                }
            }
        }
    }

    for warning in &warnings {
        log::warn!("[Verify] {}", warning);
    }
    let ok = warnings.is_empty();
    log::info!(
        "[Verify] {} pages checked, {}",
        after.len(),
        if ok { "no issues" } else { "issues found" }
    );

    Ok(VerifyResult {
        ok,
        warnings,
        residual_glyphs,
    })
}

fn compare_pages(before: &[RawPage], after: &[RawPage]) -> Vec<String> {
    if before.len() != after.len() {
        return vec![format!(
            "page count changed from {} to {}",
            before.len(),
            after.len()
        )];
    }

    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (src, out))| {
            (src.width - out.width).abs() > SIZE_TOLERANCE || (src.height - out.height).abs() > SIZE_TOLERANCE
        })
        .map(|(index, (src, out))| {
            format!(
                "page {}: size changed from {}x{} to {}x{}",
                index + 1,
                src.width,
                src.height,
                out.width,
                out.height
            )
        })
        .collect()
}

fn glyphs(page: &RawPage) -> impl Iterator<Item = &josamask_core::layout::RawChar> {
    page.blocks
        .iter()
        .filter_map(|block| match block {
            RawBlock::Text { lines } => Some(lines),
            RawBlock::Image { .. } => None,
        })
        .flatten()
        .flat_map(|line| &line.spans)
        .flat_map(|span| &span.chars)
        .filter(|ch| !ch.c.is_whitespace())
}

fn visible_chars(page: &RawPage) -> usize {
    glyphs(page).count()
}

fn residual_in(page: &RawPage, rects: &[Rect]) -> usize {
    if rects.is_empty() {
        return 0;
    }
    glyphs(page)
        .filter(|ch| {
            let Some(bbox) = Rect::from_bbox(&ch.bbox) else {
                return false;
            };
            let (x, y) = (bbox.center_x(), bbox.center_y());
            rects.iter().any(|rect| rect.contains_point(x, y))
        })
        .inspect(|ch| log::debug!("[Verify] residual {:?} at {:?}", ch.c, ch.bbox))
        .count()
}
