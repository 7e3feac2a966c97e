//! Span detection over a tokenized line.
//!
//! Two strategies, selected by [`TargetMode`](crate::TargetMode):
//! - the word right before a particle (josa),
//! - every maximal run of noun-like tokens.
//!
//! Both return raw, possibly overlapping spans; [`merge_spans`](crate::merge_spans)
//! cleans them up.

use crate::config::MaskConfig;
use crate::span::Span;
use crate::tokenizer::Token;
use std::collections::BTreeSet;

const NOUN_TAG_PREFIX: char = 'N';
const PARTICLE_TAG_PREFIX: char = 'J';

/// Noun-family tag, or one of the configured extras.
pub fn is_nounish(tag: &str, include: &BTreeSet<String>) -> bool {
    tag.starts_with(NOUN_TAG_PREFIX) || include.contains(tag)
}

/// Listed surface form, or a particle-family tag.
pub fn is_particle(token: &Token, particles: &BTreeSet<String>) -> bool {
    particles.contains(&token.form) || token.tag.starts_with(PARTICLE_TAG_PREFIX)
}

/// Spans covering the word immediately before each particle.
///
/// With `allow_noun_span` the span reaches back over the whole contiguous run
/// of noun-like tokens; otherwise only the single preceding token is taken.
/// Either way the token right before the particle must itself be noun-like.
/// A span shorter than `min_mask_len` is dropped without trying shorter runs.
pub fn spans_before_particles(tokens: &[Token], config: &MaskConfig) -> Vec<Span> {
    let include = &config.nounish_include;
    let mut spans = Vec::new();

    for (i, token) in tokens.iter().enumerate().skip(1) {
        if !is_particle(token, &config.particles) {
            continue;
        }

        let last = &tokens[i - 1];
        if !is_nounish(&last.tag, include) {
            continue;
        }

        let mut first = i - 1;
        if config.allow_noun_span {
            while first > 0 && is_nounish(&tokens[first - 1].tag, include) {
                first -= 1;
            }
        }

        if let Some(span) = Span::new(tokens[first].start, last.end()) {
            if span.len() >= config.min_mask_len {
                spans.push(span);
            }
        }
    }

    spans
}

/// One span per maximal run of noun-like tokens.
pub fn noun_run_spans(tokens: &[Token], config: &MaskConfig) -> Vec<Span> {
    let include = &config.nounish_include;
    let mut spans = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if !is_nounish(&tokens[i].tag, include) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < tokens.len() && is_nounish(&tokens[j].tag, include) {
            j += 1;
        }

        if let Some(span) = Span::new(tokens[i].start, tokens[j - 1].end()) {
            if span.len() >= config.min_mask_len {
                spans.push(span);
            }
        }
        i = j;
    }

    spans
}

/// Runs the strategies enabled by `config.target_mode` and concatenates
/// their raw spans.
pub fn detect_spans(tokens: &[Token], config: &MaskConfig) -> Vec<Span> {
    let mut spans = Vec::new();
    if config.target_mode.detects_particles() {
        spans.extend(spans_before_particles(tokens, config));
    }
    if config.target_mode.detects_noun_runs() {
        spans.extend(noun_run_spans(tokens, config));
    }
    spans
}
