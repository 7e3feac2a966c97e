//! Morphological tokenizer contract.
//!
//! The pipeline only needs tokens with a surface form, a grammatical tag and
//! character offsets into the line they came from. Any analyzer can be
//! plugged in by implementing [`Tokenizer`]; analyzers that need `&mut self`
//! implement [`TokenizerMut`] and are shared through [`Serialized`].

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

/// One morpheme of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub form: String,
    pub tag: String,
    /// Character offset into the line text.
    pub start: usize,
    /// Length in characters.
    pub len: usize,
}

impl Token {
    pub fn new(form: impl Into<String>, tag: impl Into<String>, start: usize, len: usize) -> Self {
        Self {
            form: form.into(),
            tag: tag.into(),
            start,
            len,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Error, Debug)]
pub enum TokenizeError {
    #[error("analyzer failed: {0}")]
    Analyzer(String),

    #[error("token {index} ({start}..{end}) breaks the offset contract for a line of {line_len} chars")]
    BadOffsets {
        index: usize,
        start: usize,
        end: usize,
        line_len: usize,
    },

    #[error("tokenizer lock poisoned")]
    Poisoned,
}

/// Analyzer that can be called through a shared reference.
///
/// Implementations must return tokens in left-to-right, non-overlapping order
/// with `start + len` within the input's character count. Output must depend
/// only on the input string.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;
}

/// Analyzer that needs exclusive access per call.
pub trait TokenizerMut {
    fn tokenize_mut(&mut self, text: &str) -> Result<Vec<Token>, TokenizeError>;
}

/// Serializes calls to a [`TokenizerMut`] so it can be shared across pages
/// and threads.
pub struct Serialized<T> {
    inner: Mutex<T>,
}

impl<T> Serialized<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> Option<T> {
        self.inner.into_inner().ok()
    }
}

impl<T: TokenizerMut> Tokenizer for Serialized<T> {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let mut guard = self.inner.lock().map_err(|_| TokenizeError::Poisoned)?;
        guard.tokenize_mut(text)
    }
}

/// Checks the offset contract against a line of `line_len` characters.
pub fn check_offsets(tokens: &[Token], line_len: usize) -> Result<(), TokenizeError> {
    let mut cursor = 0;
    for (index, token) in tokens.iter().enumerate() {
        let end = token.end();
        if token.start < cursor || end > line_len {
            return Err(TokenizeError::BadOffsets {
                index,
                start: token.start,
                end,
                line_len,
            });
        }
        cursor = end;
    }
    Ok(())
}
