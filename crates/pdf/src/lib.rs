//! lopdf backend for josamask.
//!
//! [`PdfDocument`] reads page layouts by interpreting content streams and
//! marks pages in a copy of the loaded document:
//!
//! - redaction cuts covered glyphs out of the content streams, then covers
//!   each area with an opaque fill;
//! - strokes and fills go on one overlay stream per page, drawn after the
//!   page's own content, which is isolated in `q … Q`.
//!
//! Content inside form XObjects is neither read nor redacted. An image is
//! removed only when one area covers it whole; vector paths and partly
//! covered images stay beneath the fill.

mod cmap;
mod error;
mod font;
mod layout;
mod metadata;
mod overlay;
mod redact;
mod text;
mod utils;

pub use error::PdfError;
pub use metadata::PRODUCER;

use josamask_core::config::Rgb;
use josamask_core::document::{LayoutError, MaskDocument, PageCanvas};
use josamask_core::geometry::Rect;
use josamask_core::layout::RawPage;
use josamask_core::pipeline::{MaskReport, Masker};
use josamask_core::tokenizer::Tokenizer;
use josamask_core::{MaskConfig, MaskError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;

use font::load_fonts;
use text::{Interpreter, Mark};
use utils::{content_stream_ids, get_media_box, get_page_content, page_resources};

/// A loaded PDF being masked.
///
/// Layouts are always read from the document as loaded; every mutation goes
/// to a separate output copy.
pub struct PdfDocument {
    source: Document,
    output: Document,
    pages: Vec<ObjectId>,
    pending: BTreeMap<usize, Vec<(Rect, Rgb)>>,
    overlays: BTreeMap<usize, Vec<Operation>>,
}

impl PdfDocument {
    pub fn from_document(source: Document) -> Self {
        let pages = source.get_pages().into_values().collect();
        let output = source.clone();
        Self {
            source,
            output,
            pages,
            pending: BTreeMap::new(),
            overlays: BTreeMap::new(),
        }
    }

    fn page_id(&self, page: usize) -> std::result::Result<ObjectId, PdfError> {
        self.pages.get(page).copied().ok_or(PdfError::PageOutOfRange(page))
    }

    /// Operations and marks of a page of `doc`.
    fn interpret(doc: &Document, page_id: ObjectId) -> std::result::Result<(Vec<Operation>, Vec<Mark>), PdfError> {
        let data = get_page_content(doc, page_id)?;
        let operations = Content::decode(&data)?.operations;
        let resources = page_resources(doc, page_id);
        let fonts = load_fonts(doc, resources);
        let marks = Interpreter::new(doc, resources, &fonts).run(&operations);
        Ok((operations, marks))
    }

    /// Raw layout of page `page` of `doc`.
    pub fn read_layout(doc: &Document, page_id: ObjectId) -> std::result::Result<RawPage, PdfError> {
        let (_, marks) = Self::interpret(doc, page_id)?;
        let (llx, lly, urx, ury) = get_media_box(doc, page_id);
        Ok(layout::build_layout(&marks, urx - llx, ury - lly))
    }

    fn add_stream(&mut self, data: Vec<u8>) -> ObjectId {
        let mut stream = Stream::new(Dictionary::new(), data);
        if let Err(e) = stream.compress() {
            log::debug!("[Redact] stream left uncompressed: {}", e);
        }
        self.output.add_object(stream)
    }

    fn redact_page(&mut self, page: usize, entries: &[(Rect, Rgb)]) -> std::result::Result<usize, PdfError> {
        let page_id = self.page_id(page)?;
        let (operations, marks) = Self::interpret(&self.output, page_id)?;
        let rects: Vec<Rect> = entries.iter().map(|(rect, _)| *rect).collect();
        let (rewritten, removed) = redact::remove_glyphs(operations, &marks, &rects);

        let data = Content { operations: rewritten }.encode()?;
        let stream_id = self.add_stream(data);
        self.output
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Reference(stream_id));

        let overlay = self.overlays.entry(page).or_default();
        for (rect, fill) in entries {
            overlay.extend(overlay::fill_ops(rect, *fill));
        }
        Ok(removed)
    }

    /// Appends each page's overlay after its isolated content.
    fn flush_overlays(&mut self) -> std::result::Result<(), (usize, PdfError)> {
        for (page, ops) in std::mem::take(&mut self.overlays) {
            if ops.is_empty() {
                continue;
            }
            self.flush_overlay(page, ops).map_err(|e| (page, e))?;
        }
        Ok(())
    }

    fn flush_overlay(&mut self, page: usize, ops: Vec<Operation>) -> std::result::Result<(), PdfError> {
        let page_id = self.page_id(page)?;
        let existing = content_stream_ids(&self.output, page_id)?;
        let data = Content { operations: ops }.encode()?;

        let open = self.add_stream(b"q\n".to_vec());
        let close = self.add_stream(b"Q\n".to_vec());
        let overlay = self.add_stream(data);

        let mut contents = vec![Object::Reference(open)];
        contents.extend(existing.into_iter().map(Object::Reference));
        contents.push(Object::Reference(close));
        contents.push(Object::Reference(overlay));

        self.output
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }
}

impl PageCanvas for PdfDocument {
    fn add_redaction(&mut self, page: usize, rect: Rect, fill: Rgb) -> Result<()> {
        if page >= self.pages.len() {
            return Err(MaskError::Apply {
                page,
                message: PdfError::PageOutOfRange(page).to_string(),
            });
        }
        self.pending.entry(page).or_default().push((rect, fill));
        Ok(())
    }

    fn apply_redactions(&mut self, page: usize) -> Result<()> {
        let Some(entries) = self.pending.remove(&page) else {
            return Ok(());
        };
        let removed = self.redact_page(page, &entries).map_err(|e| MaskError::Apply {
            page,
            message: e.to_string(),
        })?;
        log::info!(
            "[Redact] page {}: {} areas, {} glyphs removed",
            page + 1,
            entries.len(),
            removed
        );
        Ok(())
    }

    fn draw_rect(&mut self, page: usize, rect: Rect, color: Rgb, width: f32) -> Result<()> {
        if page >= self.pages.len() {
            return Err(MaskError::Apply {
                page,
                message: PdfError::PageOutOfRange(page).to_string(),
            });
        }
        self.overlays
            .entry(page)
            .or_default()
            .extend(overlay::stroke_ops(&rect, color, width));
        Ok(())
    }
}

impl MaskDocument for PdfDocument {
    fn load(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| MaskError::DocumentParse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(MaskError::DocumentParse("encrypted documents are not supported".to_string()));
        }
        Ok(Self::from_document(doc))
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_layout(&self, page: usize) -> std::result::Result<RawPage, LayoutError> {
        let page_id = self.page_id(page).map_err(|e| LayoutError(e.to_string()))?;
        Self::read_layout(&self.source, page_id).map_err(|e| LayoutError(e.to_string()))
    }

    fn save(mut self) -> Result<Vec<u8>> {
        for page in self.pending.keys() {
            log::warn!("[Redact] page {}: registered areas never applied", page + 1);
        }
        self.flush_overlays().map_err(|(page, e)| MaskError::Apply {
            page,
            message: e.to_string(),
        })?;
        metadata::set_redaction_metadata(&mut self.output);
        self.output.prune_objects();

        let mut out = Vec::new();
        self.output
            .save_to(&mut out)
            .map_err(|e| MaskError::Serialization(e.to_string()))?;
        Ok(out)
    }
}

/// Raw layout of every page, in order.
pub fn read_layouts(bytes: &[u8]) -> Result<Vec<RawPage>> {
    let doc = PdfDocument::load(bytes)?;
    (0..doc.page_count())
        .map(|page| {
            doc.page_layout(page).map_err(|e| MaskError::PageLayout {
                page,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Masks a PDF held in memory.
pub fn mask_pdf<T: Tokenizer + ?Sized>(bytes: &[u8], config: &MaskConfig, tokenizer: &T) -> Result<Vec<u8>> {
    josamask_core::mask::<PdfDocument, T>(bytes, config, tokenizer)
}

/// [`mask_pdf`] plus the per-page report.
pub fn mask_pdf_with_report<T: Tokenizer + ?Sized>(
    bytes: &[u8],
    config: &MaskConfig,
    tokenizer: &T,
) -> Result<(Vec<u8>, MaskReport)> {
    Masker::new(tokenizer, config)?.mask_document::<PdfDocument>(bytes)
}
