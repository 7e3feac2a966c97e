use lopdf::{Dictionary, Document, Object, StringFormat};

pub const PRODUCER: &str = concat!("josamask v", env!("CARGO_PKG_VERSION"));

/// Stamps the Info dictionary with this tool as Producer and the current
/// time as ModDate, creating the dictionary when missing.
pub fn set_redaction_metadata(doc: &mut Document) {
    use chrono::Local;

    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        _ => {
            let new_id = doc.add_object(Object::Dictionary(Dictionary::new()));
            doc.trailer.set("Info", Object::Reference(new_id));
            new_id
        }
    };

    // D:YYYYMMDDHHmmSS+HH'mm'
    let now = Local::now();
    let offset = now.format("%z").to_string();
    let pdf_date = match (offset.get(..3), offset.get(3..)) {
        (Some(hours), Some(minutes)) if !minutes.is_empty() => {
            format!("D:{}{}'{}'", now.format("%Y%m%d%H%M%S"), hours, minutes)
        }
        _ => format!("D:{}", now.format("%Y%m%d%H%M%S")),
    };

    if let Ok(Object::Dictionary(ref mut info)) = doc.get_object_mut(info_id) {
        info.set("Producer", Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal));
        info.set("ModDate", Object::String(pdf_date.into_bytes(), StringFormat::Literal));
    } else {
        log::warn!("[Redact] Info {:?} is not a dictionary, metadata not stamped", info_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_info_dictionary() {
        let mut doc = Document::with_version("1.5");
        set_redaction_metadata(&mut doc);

        let Ok(Object::Reference(id)) = doc.trailer.get(b"Info") else {
            panic!("Info not set");
        };
        let info = doc.get_dictionary(*id).unwrap();
        assert_eq!(
            info.get(b"Producer").unwrap(),
            &Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal)
        );
        let Object::String(date, _) = info.get(b"ModDate").unwrap() else {
            panic!("ModDate not a string");
        };
        assert!(date.starts_with(b"D:"));
    }
}
