//! Document collaborator interface.
//!
//! The pipeline never touches a file format directly. A backend implements
//! [`MaskDocument`] to read page layouts and [`PageCanvas`] to mark pages.

use crate::config::Rgb;
use crate::geometry::Rect;
use crate::layout::RawPage;
use crate::Result;
use thiserror::Error;

/// A page's structured text could not be read.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct LayoutError(pub String);

/// Page-mutation operations used by the redaction applier.
pub trait PageCanvas {
    /// Registers an area for removal; nothing changes until
    /// [`apply_redactions`](Self::apply_redactions).
    fn add_redaction(&mut self, page: usize, rect: Rect, fill: Rgb) -> Result<()>;

    /// Removes the content under every registered area of `page` and covers
    /// each area with its fill color. Irreversible.
    fn apply_redactions(&mut self, page: usize) -> Result<()>;

    /// Strokes a rectangle outline on top of the page content.
    fn draw_rect(&mut self, page: usize, rect: Rect, color: Rgb, width: f32) -> Result<()>;
}

/// Loaded document that can be masked page by page.
///
/// `load` must leave the caller's bytes untouched; every mutation goes to the
/// loaded copy, which `save` serializes.
pub trait MaskDocument: PageCanvas {
    /// Opens a document. Fails with [`MaskError::DocumentParse`](crate::MaskError::DocumentParse).
    fn load(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;

    fn page_count(&self) -> usize;

    /// Layout of the page as it was loaded, before any marking.
    fn page_layout(&self, page: usize) -> std::result::Result<RawPage, LayoutError>;

    /// Serializes the marked document. Fails with
    /// [`MaskError::Serialization`](crate::MaskError::Serialization).
    fn save(self) -> Result<Vec<u8>>;
}
