//! Font metrics and text decoding for show operators.

use crate::cmap::ToUnicode;
use crate::utils::{get_number, get_stream_content, resolve, resolve_dict};
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;
const DEFAULT_SIMPLE_WIDTH: f32 = 500.0;
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// Helvetica advance widths for codes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // 32..47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48..63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64..79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80..95
    222, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96..111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112..126
];

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    Builtin {
        monospace: bool,
    },
    Cid {
        widths: HashMap<u32, f32>,
        default: f32,
    },
}

/// What a page needs to know about a font resource.
#[derive(Debug, Clone)]
pub struct PdfFont {
    two_byte: bool,
    widths: Widths,
    to_unicode: Option<ToUnicode>,
    /// Fraction of the font size above the baseline.
    pub ascent: f32,
    /// Fraction of the font size below the baseline, negative.
    pub descent: f32,
}

impl Default for PdfFont {
    fn default() -> Self {
        Self {
            two_byte: false,
            widths: Widths::Builtin { monospace: false },
            to_unicode: None,
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl PdfFont {
    pub fn load(doc: &Document, font: &Dictionary) -> Self {
        let subtype = name(font.get(b"Subtype").ok());
        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| match obj {
                Object::Stream(stream) => Some(ToUnicode::parse(&get_stream_content(stream))),
                _ => None,
            })
            .filter(|cmap| !cmap.is_empty());

        if subtype.as_deref() == Some(b"Type0".as_slice()) {
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .and_then(|obj| resolve(doc, obj))
                .and_then(|obj| match obj {
                    Object::Array(arr) => arr.first(),
                    _ => None,
                })
                .and_then(|obj| resolve_dict(doc, obj));

            let (widths, (ascent, descent)) = match descendant {
                Some(cid) => (cid_widths(doc, cid), descriptor_metrics(doc, cid)),
                None => (
                    Widths::Cid {
                        widths: HashMap::new(),
                        default: DEFAULT_CID_WIDTH,
                    },
                    (DEFAULT_ASCENT, DEFAULT_DESCENT),
                ),
            };
            return Self {
                two_byte: true,
                widths,
                to_unicode,
                ascent,
                descent,
            };
        }

        let (ascent, descent) = descriptor_metrics(doc, font);
        Self {
            two_byte: false,
            widths: simple_widths(doc, font),
            to_unicode,
            ascent,
            descent,
        }
    }

    /// Splits a show string into character codes with their byte spans.
    pub fn codes<'a>(&self, bytes: &'a [u8]) -> Vec<(u32, &'a [u8])> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|chunk| {
                    let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
                    (code, chunk)
                })
                .collect()
        } else {
            bytes.chunks(1).map(|chunk| (chunk[0] as u32, chunk)).collect()
        }
    }

    /// Advance width of `code` in thousandths of text space.
    pub fn width(&self, code: u32) -> f32 {
        match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Builtin { monospace: true } => 600.0,
            Widths::Builtin { monospace: false } => (32..=126)
                .contains(&code)
                .then(|| HELVETICA_WIDTHS[(code - 32) as usize] as f32)
                .unwrap_or(DEFAULT_SIMPLE_WIDTH),
            Widths::Cid { widths, default } => widths.get(&code).copied().unwrap_or(*default),
        }
    }

    /// Word spacing applies to the single-byte code 32 only.
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.two_byte && code == 32
    }

    pub fn text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|cmap| cmap.get(code)) {
            return text.to_string();
        }
        if self.two_byte {
            char::from_u32(code).map(String::from).unwrap_or_default()
        } else {
            // Latin-1 approximation of WinAnsi / Standard encoding.
            char::from_u32(code)
                .filter(|c| !c.is_control())
                .map(String::from)
                .unwrap_or_default()
        }
    }
}

/// Loads every font of a resource dictionary, keyed by resource name.
pub fn load_fonts(doc: &Document, resources: Option<&Dictionary>) -> HashMap<Vec<u8>, PdfFont> {
    let mut fonts = HashMap::new();
    let Some(font_dict) = resources
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return fonts;
    };

    for (key, value) in font_dict.iter() {
        match resolve_dict(doc, value) {
            Some(dict) => {
                fonts.insert(key.clone(), PdfFont::load(doc, dict));
            }
            None => log::warn!("[Layout] font /{} unreadable", String::from_utf8_lossy(key)),
        }
    }
    fonts
}

fn name(obj: Option<&Object>) -> Option<Vec<u8>> {
    match obj {
        Some(Object::Name(n)) => Some(n.clone()),
        _ => None,
    }
}

fn simple_widths(doc: &Document, font: &Dictionary) -> Widths {
    let widths = font
        .get(b"Widths")
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| match obj {
            Object::Array(arr) => Some(
                arr.iter()
                    .map(|w| resolve(doc, w).and_then(get_number).unwrap_or(0.0))
                    .collect::<Vec<f32>>(),
            ),
            _ => None,
        });

    match widths {
        Some(widths) => {
            let first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(get_number)
                .unwrap_or(0.0)
                .max(0.0) as u32;
            let missing = font
                .get(b"FontDescriptor")
                .ok()
                .and_then(|obj| resolve_dict(doc, obj))
                .and_then(|fd| fd.get(b"MissingWidth").ok())
                .and_then(get_number)
                .unwrap_or(DEFAULT_SIMPLE_WIDTH);
            Widths::Simple {
                first_char,
                widths,
                missing,
            }
        }
        None => {
            let base = name(font.get(b"BaseFont").ok()).unwrap_or_default();
            let monospace = String::from_utf8_lossy(&base).contains("Courier");
            Widths::Builtin { monospace }
        }
    }
}

/// Parses `/W` (`c [w1 w2 ...]` and `c_first c_last w` forms) and `/DW`.
fn cid_widths(doc: &Document, cid_font: &Dictionary) -> Widths {
    let default = cid_font
        .get(b"DW")
        .ok()
        .and_then(get_number)
        .unwrap_or(DEFAULT_CID_WIDTH);
    let mut widths = HashMap::new();

    if let Some(Object::Array(entries)) = cid_font.get(b"W").ok().and_then(|obj| resolve(doc, obj)) {
        let mut i = 0;
        while i < entries.len() {
            let Some(first) = get_number(&entries[i]) else {
                break;
            };
            let first = first.max(0.0) as u32;
            match entries.get(i + 1).and_then(|obj| resolve(doc, obj)) {
                Some(Object::Array(list)) => {
                    for (offset, w) in list.iter().enumerate() {
                        if let Some(w) = get_number(w) {
                            widths.insert(first + offset as u32, w);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(w)) = (get_number(last), entries.get(i + 2).and_then(get_number))
                    else {
                        break;
                    };
                    for code in first..=(last.max(0.0) as u32).min(first + 0xFFFF) {
                        widths.insert(code, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    Widths::Cid { widths, default }
}

fn descriptor_metrics(doc: &Document, font: &Dictionary) -> (f32, f32) {
    let descriptor = font
        .get(b"FontDescriptor")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj));
    let Some(fd) = descriptor else {
        return (DEFAULT_ASCENT, DEFAULT_DESCENT);
    };

    let ascent = fd
        .get(b"Ascent")
        .ok()
        .and_then(get_number)
        .filter(|a| *a > 0.0)
        .map(|a| a / 1000.0)
        .unwrap_or(DEFAULT_ASCENT);
    let descent = fd
        .get(b"Descent")
        .ok()
        .and_then(get_number)
        .filter(|d| *d < 0.0)
        .map(|d| d / 1000.0)
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_builtin_helvetica_widths() {
        let doc = Document::with_version("1.5");
        let font = PdfFont::load(
            &doc,
            &dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        );
        assert_eq!(font.width(b' ' as u32), 278.0);
        assert_eq!(font.width(b'W' as u32), 944.0);
        assert_eq!(font.width(b'~' as u32), 584.0);
        assert_eq!(font.width(200), DEFAULT_SIMPLE_WIDTH);
        assert_eq!(font.text(b'A' as u32), "A");
        assert!(font.is_word_space(32));
    }

    #[test]
    fn test_explicit_widths_with_first_char() {
        let doc = Document::with_version("1.5");
        let font = PdfFont::load(
            &doc,
            &dictionary! {
                "Type" => "Font",
                "Subtype" => "TrueType",
                "FirstChar" => 65,
                "Widths" => vec![Object::Integer(700), Object::Integer(650)],
            },
        );
        assert_eq!(font.width(65), 700.0);
        assert_eq!(font.width(66), 650.0);
        assert_eq!(font.width(67), DEFAULT_SIMPLE_WIDTH);
        assert_eq!(font.width(10), DEFAULT_SIMPLE_WIDTH);
    }

    #[test]
    fn test_type0_widths_and_codes() {
        let mut doc = Document::with_version("1.5");
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "Ascent" => 880,
            "Descent" => -120,
        });
        let cid = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 900,
            "FontDescriptor" => descriptor,
            "W" => vec![
                Object::Integer(1),
                Object::Array(vec![Object::Integer(500), Object::Integer(520)]),
                Object::Integer(10),
                Object::Integer(12),
                Object::Integer(300),
            ],
        });
        let font = PdfFont::load(
            &doc,
            &dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid)],
            },
        );

        assert_eq!(font.width(1), 500.0);
        assert_eq!(font.width(2), 520.0);
        assert_eq!(font.width(11), 300.0);
        assert_eq!(font.width(3), 900.0);
        assert!((font.ascent - 0.88).abs() < 1e-6);
        assert!((font.descent + 0.12).abs() < 1e-6);

        let codes = font.codes(&[0xD5, 0x59, 0x00, 0x20]);
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].0, 0xD559);
        assert_eq!(font.text(0xD559), "학");
        assert!(!font.is_word_space(32));
    }
}
