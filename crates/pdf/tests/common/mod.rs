//! In-memory PDF builders and a toy tokenizer for end-to-end tests.

#![allow(dead_code)]

use josamask_core::tokenizer::{Token, TokenizeError, Tokenizer};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

const HANGUL_CMAP: &str = "/CIDInit /ProcSet findresource begin\n\
12 dict begin\nbegincmap\n\
/CMapName /Adobe-Identity-UCS def\n\
1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
1 beginbfchar\n<0020> <0020>\nendbfchar\n\
1 beginbfrange\n<AC00> <D7A3> <AC00>\nendbfrange\n\
endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n";

pub enum Script {
    Latin,
    Hangul,
}

fn show(text: &str, script: &Script) -> Operation {
    match script {
        Script::Latin => Operation::new("Tj", vec![Object::string_literal(text)]),
        Script::Hangul => {
            let bytes = text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)])
        }
    }
}

/// One page per entry, each page a list of lines set at 12pt from the top.
pub fn build_pdf(pages: &[&[&str]], script: Script) -> Vec<u8> {
    build_spaced_pdf(pages, script, 0.0)
}

/// [`build_pdf`] with character spacing `Tc` applied to every line.
pub fn build_spaced_pdf(pages: &[&[&str]], script: Script, char_spacing: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = match script {
        Script::Latin => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }),
        Script::Hangul => {
            let cmap_id = doc.add_object(Stream::new(dictionary! {}, HANGUL_CMAP.as_bytes().to_vec()));
            let descriptor_id = doc.add_object(dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => "NanumGothic",
                "Ascent" => 800,
                "Descent" => -200,
            });
            let cid_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "NanumGothic",
                "DW" => 1000,
                "FontDescriptor" => descriptor_id,
                "W" => vec![Object::Integer(32), Object::Array(vec![Object::Integer(300)])],
            });
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => "NanumGothic",
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(cid_id)],
                "ToUnicode" => cmap_id,
            })
        }
    };
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tc", vec![Object::Real(char_spacing)]),
            Operation::new("Td", vec![72.into(), 760.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-20).into()]));
            }
            operations.push(show(line, &script));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Space-separated words. A Hangul word ending in 은/는/이/가/을/를 splits
/// into `NNG` + `JX`; a capitalised Latin word is `NNP`; anything else `VV`.
pub struct ToyTokenizer;

impl Tokenizer for ToyTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        for (i, word) in text.split(' ').enumerate() {
            if i > 0 {
                tokens.push(Token::new(" ", "WS", pos, 1));
                pos += 1;
            }
            let chars: Vec<char> = word.chars().collect();
            let n = chars.len();
            match chars.last() {
                None => {}
                Some(&last) if n > 1 && "은는이가을를".contains(last) => {
                    let stem: String = chars[..n - 1].iter().collect();
                    tokens.push(Token::new(stem, "NNG", pos, n - 1));
                    tokens.push(Token::new(last.to_string(), "JX", pos + n - 1, 1));
                }
                Some(_) if chars[0].is_ascii_uppercase() => tokens.push(Token::new(word, "NNP", pos, n)),
                Some(_) => tokens.push(Token::new(word, "VV", pos, n)),
            }
            pos += n;
        }
        Ok(tokens)
    }
}

/// Text of every line on every page, in order.
pub fn page_texts(bytes: &[u8]) -> Vec<Vec<String>> {
    josamask_pdf::read_layouts(bytes)
        .unwrap()
        .iter()
        .map(|page| {
            josamask_core::layout::extract_lines(page)
                .iter()
                .map(|line| line.text().to_string())
                .collect()
        })
        .collect()
}

/// Decoded content of page `page` (1-based), all streams concatenated.
pub fn page_content(bytes: &[u8], page: u32) -> Vec<u8> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    doc.get_page_content(page_id).unwrap()
}

pub fn content_entries(bytes: &[u8], page: u32) -> usize {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    match doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap() {
        Object::Array(arr) => arr.len(),
        _ => 1,
    }
}
