//! `/ToUnicode` CMap parsing (bfchar and bfrange sections).

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static BFCHAR_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap());
static BFRANGE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap());
static BFCHAR_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]*)>").unwrap());
static BFRANGE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<([0-9A-Fa-f]+)>\s*<([0-9A-Fa-f]+)>\s*(?:<([0-9A-Fa-f]*)>|\[(.*?)\])").unwrap()
});
static HEX_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([0-9A-Fa-f]*)>").unwrap());

/// Ranges wider than this are treated as corrupt and skipped.
const MAX_RANGE: u32 = 0xFFFF;

/// Character code to Unicode text.
#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    map: HashMap<u32, String>,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let mut map = HashMap::new();

        for section in BFCHAR_SECTION.captures_iter(&text) {
            for entry in BFCHAR_ENTRY.captures_iter(&section[1]) {
                if let (Some(code), Some(dst)) = (parse_code(&entry[1]), utf16_hex(&entry[2])) {
                    map.insert(code, dst);
                }
            }
        }

        for section in BFRANGE_SECTION.captures_iter(&text) {
            for entry in BFRANGE_ENTRY.captures_iter(&section[1]) {
                let (Some(lo), Some(hi)) = (parse_code(&entry[1]), parse_code(&entry[2])) else {
                    continue;
                };
                if hi < lo || hi - lo > MAX_RANGE {
                    continue;
                }
                if let Some(base) = entry.get(3) {
                    let Some(units) = utf16_units(base.as_str()) else {
                        continue;
                    };
                    for (offset, code) in (lo..=hi).enumerate() {
                        let mut units = units.clone();
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        map.insert(code, String::from_utf16_lossy(&units));
                    }
                } else if let Some(list) = entry.get(4) {
                    for (code, dst) in (lo..=hi).zip(HEX_STRING.captures_iter(list.as_str())) {
                        if let Some(dst) = utf16_hex(&dst[1]) {
                            map.insert(code, dst);
                        }
                    }
                }
            }
        }

        Self { map }
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn parse_code(hex: &str) -> Option<u32> {
    if hex.len() > 8 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn utf16_units(hex: &str) -> Option<Vec<u16>> {
    if hex.is_empty() || hex.len() % 4 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect()
}

fn utf16_hex(hex: &str) -> Option<String> {
    utf16_units(hex).map(|units| String::from_utf16_lossy(&units))
}
