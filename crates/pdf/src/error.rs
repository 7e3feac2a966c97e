use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("lopdf: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("page index {0} out of range")]
    PageOutOfRange(usize),

    #[error("content stream: {0}")]
    Content(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
