//! Per-line, per-page and per-document masking pipeline.
//!
//! ```text
//! layout → lines → tokens → spans → merged spans → rects
//!        → merged rects → sampled rects → canvas
//! ```
//!
//! Recoverable failures are values: a line that fails to tokenize is
//! [`LineOutcome::Skipped`], a page whose layout cannot be read is
//! [`PageOutcome::Skipped`] (under [`LayoutErrorPolicy::Skip`]). Only
//! document-level failures are `Err`.

use crate::apply::apply_rects;
use crate::config::{LayoutErrorPolicy, MaskConfig};
use crate::detect::detect_spans;
use crate::document::MaskDocument;
use crate::geometry::Rect;
use crate::layout::{extract_lines, Line, RawPage};
use crate::merge::merge_rects;
use crate::project::project_span;
use crate::sample::{page_rng, sample_rects};
use crate::span::{merge_spans, Span};
use crate::tokenizer::{check_offsets, Token, TokenizeError, Tokenizer};
use crate::{MaskError, Result};
use rand::Rng;
use serde::Serialize;
use std::time::Instant;

/// Result of running detection over one line.
#[derive(Debug)]
pub enum LineOutcome {
    Masked { tokens: Vec<Token>, spans: Vec<Span> },
    /// The line stays unmasked.
    Skipped(TokenizeError),
}

/// Counters for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub lines: usize,
    pub lines_skipped: usize,
    pub spans: usize,
    /// Spans whose offsets matched no glyph box.
    pub projection_drops: usize,
    pub rects_projected: usize,
    pub rects_merged: usize,
    pub rects_applied: usize,
}

#[derive(Debug)]
pub enum PageOutcome {
    /// Final rectangles, ready for the applier.
    Masked { rects: Vec<Rect>, stats: PageStats },
    /// Layout unreadable; page left as is.
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: usize,
    pub skipped: Option<String>,
    pub stats: PageStats,
    pub rects: Vec<Rect>,
}

/// What happened to every page of a document, in page order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaskReport {
    pub pages: Vec<PageReport>,
}

impl MaskReport {
    pub fn rects_applied(&self) -> usize {
        self.pages.iter().map(|p| p.stats.rects_applied).sum()
    }

    pub fn pages_skipped(&self) -> usize {
        self.pages.iter().filter(|p| p.skipped.is_some()).count()
    }

    pub fn lines_skipped(&self) -> usize {
        self.pages.iter().map(|p| p.stats.lines_skipped).sum()
    }
}

/// Runs the pipeline with one tokenizer and one validated config.
///
/// The tokenizer is borrowed: the host builds it once and lends it to every
/// invocation.
pub struct Masker<'a, T: Tokenizer + ?Sized> {
    tokenizer: &'a T,
    config: &'a MaskConfig,
}

impl<'a, T: Tokenizer + ?Sized> Masker<'a, T> {
    pub fn new(tokenizer: &'a T, config: &'a MaskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { tokenizer, config })
    }

    pub fn config(&self) -> &MaskConfig {
        self.config
    }

    /// Tokenizes a line and returns its merged spans.
    pub fn line_spans(&self, line: &Line) -> LineOutcome {
        let tokens = match self
            .tokenizer
            .tokenize(line.text())
            .and_then(|tokens| check_offsets(&tokens, line.len()).map(|_| tokens))
        {
            Ok(tokens) => tokens,
            Err(e) => {
                log::warn!("[Pipeline] line skipped ({}): {:?}", e, line.text());
                return LineOutcome::Skipped(e);
            }
        };

        let spans = merge_spans(detect_spans(&tokens, self.config));
        LineOutcome::Masked { tokens, spans }
    }

    /// Detection and geometry for one page: everything up to, not including,
    /// the applier.
    pub fn page_rects<R: Rng + ?Sized>(&self, layout: &RawPage, rng: &mut R) -> (Vec<Rect>, PageStats) {
        let mut stats = PageStats::default();
        let mut raw_rects = Vec::new();

        for line in extract_lines(layout) {
            stats.lines += 1;
            let spans = match self.line_spans(&line) {
                LineOutcome::Masked { spans, .. } => spans,
                LineOutcome::Skipped(_) => {
                    stats.lines_skipped += 1;
                    continue;
                }
            };

            stats.spans += spans.len();
            for span in spans {
                match project_span(&line, span) {
                    Some(rect) => raw_rects.push(rect),
                    None => {
                        stats.projection_drops += 1;
                        log::debug!(
                            "[Pipeline] span {}..{} has no glyph box in {:?}",
                            span.start,
                            span.end,
                            line.text()
                        );
                    }
                }
            }
        }

        stats.rects_projected = raw_rects.len();
        let merged = merge_rects(raw_rects, &self.config.merge);
        stats.rects_merged = merged.len();
        let rects = sample_rects(merged, self.config.mask_ratio, rng);
        stats.rects_applied = rects.len();

        (rects, stats)
    }

    /// Page pipeline with the configured layout-error policy applied.
    pub fn process_page<D: MaskDocument>(&self, doc: &D, page: usize, seed: u64) -> Result<PageOutcome> {
        let layout = match doc.page_layout(page) {
            Ok(layout) => layout,
            Err(e) => match self.config.on_layout_error {
                LayoutErrorPolicy::Abort => {
                    return Err(MaskError::PageLayout {
                        page,
                        message: e.to_string(),
                    })
                }
                LayoutErrorPolicy::Skip => {
                    log::warn!("[Pipeline] page {} skipped: {}", page + 1, e);
                    return Ok(PageOutcome::Skipped {
                        reason: e.to_string(),
                    });
                }
            },
        };

        let mut rng = page_rng(seed, page);
        let (rects, stats) = self.page_rects(&layout, &mut rng);
        Ok(PageOutcome::Masked { rects, stats })
    }

    /// Loads `bytes` with backend `D`, masks every page in order and returns
    /// the serialized result.
    pub fn mask_document<D: MaskDocument>(&self, bytes: &[u8]) -> Result<(Vec<u8>, MaskReport)> {
        let started = Instant::now();
        let mut doc = D::load(bytes)?;
        let page_count = doc.page_count();
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut report = MaskReport::default();

        for page in 0..page_count {
            let page_report = match self.process_page(&doc, page, seed)? {
                PageOutcome::Masked { rects, stats } => {
                    apply_rects(&mut doc, page, &rects, self.config)?;
                    log::debug!("[Pipeline] page {}: {:?}", page + 1, stats);
                    PageReport {
                        page,
                        skipped: None,
                        stats,
                        rects,
                    }
                }
                PageOutcome::Skipped { reason } => PageReport {
                    page,
                    skipped: Some(reason),
                    stats: PageStats::default(),
                    rects: Vec::new(),
                },
            };
            report.pages.push(page_report);
        }

        let out = doc.save()?;
        log::info!(
            "[Pipeline] {} pages, {} rects applied, {} pages skipped, {} lines skipped ({} ms)",
            page_count,
            report.rects_applied(),
            report.pages_skipped(),
            report.lines_skipped(),
            started.elapsed().as_millis()
        );
        Ok((out, report))
    }
}

/// One-shot entry: validate, mask, serialize.
pub fn mask<D: MaskDocument, T: Tokenizer + ?Sized>(
    bytes: &[u8],
    config: &MaskConfig,
    tokenizer: &T,
) -> Result<Vec<u8>> {
    let masker = Masker::new(tokenizer, config)?;
    masker.mask_document::<D>(bytes).map(|(out, _)| out)
}
