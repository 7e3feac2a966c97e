//! Particle-aware masking of Korean text in page layouts.
//!
//! Backend-independent: a document format plugs in through
//! [`document::MaskDocument`], a morphological analyzer through
//! [`tokenizer::Tokenizer`].

pub mod apply;
pub mod config;
pub mod detect;
pub mod document;
pub mod geometry;
pub mod layout;
pub mod merge;
pub mod pipeline;
pub mod project;
pub mod sample;
pub mod span;
pub mod tokenizer;

pub use config::{LayoutErrorPolicy, MaskConfig, MaskMode, MergeTolerance, Rgb, TargetMode};
pub use document::{LayoutError, MaskDocument, PageCanvas};
pub use geometry::{BBox, Rect};
pub use layout::{Glyph, Line, RawBlock, RawChar, RawLine, RawPage, RawSpan};
pub use pipeline::{mask, LineOutcome, MaskReport, Masker, PageOutcome, PageReport, PageStats};
pub use span::Span;
pub use tokenizer::{Serialized, Token, TokenizeError, Tokenizer, TokenizerMut};

pub type Result<T> = std::result::Result<T, MaskError>;

#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("failed to parse document: {0}")]
    DocumentParse(String),
    #[error("page {page}: layout unreadable: {message}")]
    PageLayout { page: usize, message: String },
    #[error("page {page}: failed to apply marks: {message}")]
    Apply { page: usize, message: String },
    #[error("failed to serialize document: {0}")]
    Serialization(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
