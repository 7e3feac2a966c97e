use crate::error::PdfError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Row-vector affine matrix `[a b c d e f]`.
pub type Matrix = [f32; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

const MAX_INHERIT_DEPTH: usize = 32;

/// `m × n`.
pub fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

pub fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Extracts a number from an integer or real object.
pub fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Reads six numeric operands as a matrix.
pub fn get_matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = get_number(obj)?;
    }
    Some(m)
}

/// Follows a reference, if any.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Looks a key up on the page, then on its `Parent` chain.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        dict = resolve_dict(doc, dict.get(b"Parent").ok()?)?;
    }
    None
}

pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Entry `name` of resource category `category` (`Font`, `XObject`, ...).
pub fn resource_entry<'a>(
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    category: &[u8],
    name: &[u8],
) -> Option<&'a Object> {
    let category = resolve_dict(doc, resources?.get(category).ok()?)?;
    resolve(doc, category.get(name).ok()?)
}

fn box_values(arr: &[Object]) -> Option<(f32, f32, f32, f32)> {
    let values: Vec<f32> = arr.iter().filter_map(get_number).collect();
    if values.len() == 4 {
        Some((
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ))
    } else {
        None
    }
}

/// Visible page box: CropBox if present, else MediaBox, else US Letter.
pub fn get_media_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
        if let Some(Object::Array(arr)) = inherited(doc, page_id, key) {
            if let Some(values) = box_values(arr) {
                return values;
            }
        }
    }
    log::warn!("[Layout] page {:?} has no MediaBox, assuming Letter", page_id);
    (0.0, 0.0, 612.0, 792.0)
}

/// Stream data, decompressed when the filter is supported.
pub fn get_stream_content(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

/// Ids of the page's content streams, in drawing order.
pub fn content_stream_ids(doc: &Document, page_id: ObjectId) -> Result<Vec<ObjectId>, PdfError> {
    let page = doc.get_dictionary(page_id)?;
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(arr) => Ok(reference_ids(arr)),
            _ => Ok(vec![*id]),
        },
        Ok(Object::Array(arr)) => Ok(reference_ids(arr)),
        Ok(_) => Err(PdfError::Content("unsupported /Contents entry".to_string())),
        Err(_) => Ok(Vec::new()),
    }
}

fn reference_ids(arr: &[Object]) -> Vec<ObjectId> {
    arr.iter()
        .filter_map(|item| match item {
            Object::Reference(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// Concatenated, decompressed content of every stream of the page.
/// A page without `/Contents` is blank.
pub fn get_page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, PdfError> {
    let mut all_content = Vec::new();
    for id in content_stream_ids(doc, page_id)? {
        match doc.get_object(id)? {
            Object::Stream(stream) => {
                all_content.extend(get_stream_content(stream));
                all_content.push(b'\n');
            }
            _ => return Err(PdfError::Content(format!("content {:?} is not a stream", id))),
        }
    }
    Ok(all_content)
}
