//! Dry run: what would be masked, line by line, without writing anything.

use anyhow::{Context, Result};
use josamask_core::layout::extract_lines;
use josamask_core::{LineOutcome, MaskConfig, MaskDocument, Masker, Token, Tokenizer};
use josamask_pdf::PdfDocument;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct LineInspection {
    pub text: String,
    pub tokens: Vec<Token>,
    /// Text of every merged span.
    pub masked: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInspection {
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    pub lines: Vec<LineInspection>,
}

pub fn inspect_pdf<T: Tokenizer + ?Sized>(
    path: &Path,
    config: &MaskConfig,
    tokenizer: &T,
) -> Result<Vec<PageInspection>> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let doc = PdfDocument::load(&bytes)?;
    let masker = Masker::new(tokenizer, config)?;

    let pages = (0..doc.page_count())
        .map(|page| match doc.page_layout(page) {
            Ok(layout) => PageInspection {
                page,
                skipped: None,
                lines: extract_lines(&layout)
                    .iter()
                    .map(|line| {
                        let chars: Vec<char> = line.text().chars().collect();
                        match masker.line_spans(line) {
                            LineOutcome::Masked { tokens, spans } => LineInspection {
                                text: line.text().to_string(),
                                tokens,
                                masked: spans
                                    .iter()
                                    .filter_map(|span| chars.get(span.start..span.end))
                                    .map(|fragment| fragment.iter().collect())
                                    .collect(),
                                skipped: None,
                            },
                            LineOutcome::Skipped(e) => LineInspection {
                                text: line.text().to_string(),
                                tokens: Vec::new(),
                                masked: Vec::new(),
                                skipped: Some(e.to_string()),
                            },
                        }
                    })
                    .collect(),
            },
            Err(e) => PageInspection {
                page,
                skipped: Some(e.to_string()),
                lines: Vec::new(),
            },
        })
        .collect();

    Ok(pages)
}

/// Human-readable listing of an inspection.
pub fn render(pages: &[PageInspection]) -> String {
    let mut out = String::new();
    for page in pages {
        let _ = writeln!(out, "== page {}", page.page + 1);
        if let Some(reason) = &page.skipped {
            let _ = writeln!(out, "   skipped: {}", reason);
            continue;
        }
        for line in &page.lines {
            let _ = writeln!(out, "{}", line.text);
            if let Some(reason) = &line.skipped {
                let _ = writeln!(out, "   skipped: {}", reason);
                continue;
            }
            let tokens: Vec<String> = line
                .tokens
                .iter()
                .filter(|t| !t.form.trim().is_empty())
                .map(|t| format!("{}/{}", t.form, t.tag))
                .collect();
            let _ = writeln!(out, "   tokens: {}", tokens.join(" "));
            if !line.masked.is_empty() {
                let _ = writeln!(out, "   masked: {}", line.masked.join(", "));
            }
        }
    }
    out
}
