//! Dictionary-free Korean tokenizer.
//!
//! Splits a line into character-class runs and cuts each Hangul word into
//! stem and particle, or stem and light-verb ending, using suffix tables and
//! final-consonant (batchim) agreement. Every character of the input lands
//! in exactly one token; offsets are in characters.

use josamask_core::tokenizer::{Token, TokenizeError, Tokenizer};

// ============================================================================
// Tags
// ============================================================================

pub mod tags {
    pub const NNG: &str = "NNG";
    pub const JKS: &str = "JKS";
    pub const JKO: &str = "JKO";
    pub const JKB: &str = "JKB";
    pub const JKG: &str = "JKG";
    pub const JC: &str = "JC";
    pub const JX: &str = "JX";
    pub const XSV: &str = "XSV";
    pub const VV: &str = "VV";
    pub const MAG: &str = "MAG";
    pub const SL: &str = "SL";
    pub const SN: &str = "SN";
    pub const SH: &str = "SH";
    pub const WS: &str = "WS";
    pub const SF: &str = "SF";
    pub const SP: &str = "SP";
    pub const SS: &str = "SS";
    pub const SO: &str = "SO";
    pub const SW: &str = "SW";
}

use tags::*;

// ============================================================================
// Suffix tables
// ============================================================================

/// Which stem endings a particle form attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    Any,
    /// Stem ends in a final consonant.
    Consonant,
    /// Stem ends in a vowel.
    Vowel,
    /// 으로 family: final consonant other than ㄹ.
    ConsonantNotRieul,
    /// 로 family: vowel or final ㄹ.
    VowelOrRieul,
}

const PARTICLES: &[(&str, &str, Attach)] = &[
    ("은", JX, Attach::Consonant),
    ("는", JX, Attach::Vowel),
    ("이", JKS, Attach::Consonant),
    ("가", JKS, Attach::Vowel),
    ("을", JKO, Attach::Consonant),
    ("를", JKO, Attach::Vowel),
    ("의", JKG, Attach::Any),
    ("에", JKB, Attach::Any),
    ("에서", JKB, Attach::Any),
    ("에게", JKB, Attach::Any),
    ("에게서", JKB, Attach::Any),
    ("께", JKB, Attach::Any),
    ("한테", JKB, Attach::Any),
    ("한테서", JKB, Attach::Any),
    ("으로", JKB, Attach::ConsonantNotRieul),
    ("로", JKB, Attach::VowelOrRieul),
    ("으로서", JKB, Attach::ConsonantNotRieul),
    ("로서", JKB, Attach::VowelOrRieul),
    ("으로써", JKB, Attach::ConsonantNotRieul),
    ("로써", JKB, Attach::VowelOrRieul),
    ("처럼", JKB, Attach::Any),
    ("보다", JKB, Attach::Any),
    ("와", JC, Attach::Vowel),
    ("과", JC, Attach::Consonant),
    ("랑", JC, Attach::Vowel),
    ("이랑", JC, Attach::Consonant),
    ("까지", JX, Attach::Any),
    ("부터", JX, Attach::Any),
    ("이나", JX, Attach::Consonant),
    ("나", JX, Attach::Vowel),
    ("이나마", JX, Attach::Consonant),
    ("마다", JX, Attach::Any),
    ("조차", JX, Attach::Any),
    ("마저", JX, Attach::Any),
    ("밖에", JX, Attach::Any),
    ("도", JX, Attach::Any),
    ("만", JX, Attach::Any),
];

/// 하다/되다 endings that turn a noun into a verb.
const LIGHT_VERB_ENDINGS: &[&str] = &[
    "하다", "한다", "했다", "하였다", "합니다", "했습니다", "하는", "하고", "하여", "해서", "하며", "했고",
    "하면", "할", "한", "되다", "된다", "됐다", "되었다", "됩니다", "되었습니다", "되는", "되어", "되고", "된",
    "시키다", "시켰다",
];

/// Endings that mark a whole word as a predicate.
const VERB_ENDINGS: &[&str] = &[
    "습니다", "니다", "었다", "았다", "였다", "겠다", "는다", "었고", "았고", "어요", "아요", "세요", "지만",
    "면서",
];

/// Stem syllables that belong to a light verb, not a noun.
const VERBAL_STEM_ENDS: &[char] = &['하', '되'];

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const JONG_COUNT: u32 = 28;
const JONG_RIEUL: u32 = 8;

// ============================================================================
// Character classes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Hangul,
    Latin,
    Digit,
    Hanja,
    Space,
    Symbol(&'static str),
}

fn classify(c: char) -> CharClass {
    let cp = c as u32;
    if (HANGUL_BASE..=HANGUL_LAST).contains(&cp) || (0x3131..=0x318E).contains(&cp) {
        CharClass::Hangul
    } else if c.is_whitespace() {
        CharClass::Space
    } else if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_ascii_alphabetic() || (('\u{C0}'..='\u{24F}').contains(&c) && c.is_alphabetic()) {
        CharClass::Latin
    } else if (0x4E00..=0x9FFF).contains(&cp) || (0x3400..=0x4DBF).contains(&cp) || (0xF900..=0xFAFF).contains(&cp)
    {
        CharClass::Hanja
    } else {
        CharClass::Symbol(symbol_tag(c))
    }
}

fn symbol_tag(c: char) -> &'static str {
    match c {
        '.' | '?' | '!' | '。' => SF,
        ',' | ';' | ':' | '/' | '·' => SP,
        '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\'' | '“' | '”' | '‘' | '’' | '「' | '」' | '『'
        | '』' | '《' | '》' | '〈' | '〉' => SS,
        '-' | '~' | '–' | '—' | '∼' => SO,
        _ => SW,
    }
}

impl CharClass {
    fn tag(self) -> &'static str {
        match self {
            CharClass::Hangul => NNG,
            CharClass::Latin => SL,
            CharClass::Digit => SN,
            CharClass::Hanja => SH,
            CharClass::Space => WS,
            CharClass::Symbol(tag) => tag,
        }
    }

    /// Classes a particle can be written directly after (`PDF를`, `3개월의`).
    fn takes_particle(self) -> bool {
        matches!(self, CharClass::Latin | CharClass::Digit | CharClass::Hanja)
    }
}

/// Final consonant index of a Hangul syllable, 0 when open.
fn jongseong(c: char) -> Option<u32> {
    let cp = c as u32;
    (HANGUL_BASE..=HANGUL_LAST)
        .contains(&cp)
        .then(|| (cp - HANGUL_BASE) % JONG_COUNT)
}

fn agrees(attach: Attach, stem_last: char) -> bool {
    let Some(jong) = jongseong(stem_last) else {
        return attach == Attach::Any;
    };
    match attach {
        Attach::Any => true,
        Attach::Consonant => jong != 0,
        Attach::Vowel => jong == 0,
        Attach::ConsonantNotRieul => jong != 0 && jong != JONG_RIEUL,
        Attach::VowelOrRieul => jong == 0 || jong == JONG_RIEUL,
    }
}

fn ends_with(word: &[char], suffix: &[char]) -> bool {
    word.len() > suffix.len() && word.ends_with(suffix)
}

// ============================================================================
// Tokenizer
// ============================================================================

struct Particle {
    form: Vec<char>,
    tag: &'static str,
    attach: Attach,
}

/// Rule-based tokenizer for Korean text mixed with Latin, digits and Hanja.
///
/// Stateless and `Sync`: build one and share it.
pub struct HeuristicTokenizer {
    particles: Vec<Particle>,
    light_verbs: Vec<Vec<char>>,
    verb_endings: Vec<Vec<char>>,
}

fn longest_first(forms: &[&str]) -> Vec<Vec<char>> {
    let mut out: Vec<Vec<char>> = forms.iter().map(|f| f.chars().collect()).collect();
    out.sort_by(|a, b| b.len().cmp(&a.len()));
    out
}

impl Default for HeuristicTokenizer {
    fn default() -> Self {
        let mut particles: Vec<Particle> = PARTICLES
            .iter()
            .map(|(form, tag, attach)| Particle {
                form: form.chars().collect(),
                tag,
                attach: *attach,
            })
            .collect();
        particles.sort_by(|a, b| b.form.len().cmp(&a.form.len()));

        Self {
            particles,
            light_verbs: longest_first(LIGHT_VERB_ENDINGS),
            verb_endings: longest_first(VERB_ENDINGS),
        }
    }
}

impl HeuristicTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens for `text`. Never fails.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut prev_class = None;
        let mut i = 0;

        while i < chars.len() {
            let class = classify(chars[i]);
            let mut j = i + 1;
            while j < chars.len() && classify(chars[j]) == class {
                j += 1;
            }

            if class == CharClass::Hangul {
                let glued = prev_class.map(CharClass::takes_particle).unwrap_or(false);
                self.split_word(&chars[i..j], i, glued, &mut tokens);
            } else {
                let form: String = chars[i..j].iter().collect();
                tokens.push(Token::new(form, class.tag(), i, j - i));
            }

            prev_class = Some(class);
            i = j;
        }

        tokens
    }

    fn split_word(&self, word: &[char], start: usize, glued: bool, tokens: &mut Vec<Token>) {
        let n = word.len();
        let form = |range: std::ops::Range<usize>| word[range].iter().collect::<String>();

        if glued {
            if let Some(p) = self.particles.iter().find(|p| p.form == word) {
                tokens.push(Token::new(form(0..n), p.tag, start, n));
                return;
            }
        }

        for p in &self.particles {
            if !ends_with(word, &p.form) {
                continue;
            }
            let stem_len = n - p.form.len();
            let stem_last = word[stem_len - 1];
            if VERBAL_STEM_ENDS.contains(&stem_last) || !agrees(p.attach, stem_last) {
                continue;
            }
            tokens.push(Token::new(form(0..stem_len), NNG, start, stem_len));
            tokens.push(Token::new(form(stem_len..n), p.tag, start + stem_len, p.form.len()));
            return;
        }

        if let Some(ending) = self.light_verbs.iter().find(|e| ends_with(word, e)) {
            let stem_len = n - ending.len();
            tokens.push(Token::new(form(0..stem_len), NNG, start, stem_len));
            tokens.push(Token::new(form(stem_len..n), XSV, start + stem_len, ending.len()));
            return;
        }

        let tag = if self.is_predicate(word) {
            VV
        } else if n >= 2 && word[n - 1] == '히' {
            MAG
        } else {
            NNG
        };
        tokens.push(Token::new(form(0..n), tag, start, n));
    }

    fn is_predicate(&self, word: &[char]) -> bool {
        // a bare 했다/된다 is the verb itself
        if self.light_verbs.iter().any(|e| e == word) {
            return true;
        }
        if self.verb_endings.iter().any(|e| word.ends_with(e)) {
            return true;
        }
        // 있다, 좋다, 갔다: a plain 다 ending left over once particles and
        // light verbs were ruled out
        word.len() >= 2 && word.last() == Some(&'다')
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let tokens = self.analyze(text);
        log::trace!("[Tokenize] {:?} -> {} tokens", text, tokens.len());
        Ok(tokens)
    }
}
