//! Read reviewer annotations directly from a PDF with `lopdf`.

use crate::error::{Error, Result};
use crate::source::{ExtractedAnnotation, Origin};
use lopdf::{Dictionary, Document, Object};
use std::path::Path;

/// Subtypes that never carry reviewer comments.
const SKIPPED_SUBTYPES: [&[u8]; 3] = [b"Link", b"Popup", b"Widget"];

/// Follow a reference, if `obj` is one.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn numbers(doc: &Document, obj: &Object) -> Option<Vec<f32>> {
    match resolve(doc, obj).ok()? {
        Object::Array(items) => items
            .iter()
            .map(|item| resolve(doc, item).ok().and_then(number))
            .collect(),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with byte order mark, else UTF-8,
/// else Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

/// `MediaBox` of a page, inherited through `/Parent` when needed.
fn media_box(doc: &Document, page: &Dictionary) -> Option<[f32; 4]> {
    let mut current = page;
    // Page trees are shallow; the bound guards against reference cycles.
    for _ in 0..32 {
        if let Ok(obj) = current.get(b"MediaBox") {
            let values = numbers(doc, obj)?;
            if values.len() == 4 {
                return Some([values[0], values[1], values[2], values[3]]);
            }
            return None;
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn annotation_from_dict(
    doc: &Document,
    dict: &Dictionary,
    page: usize,
    media: [f32; 4],
) -> Option<ExtractedAnnotation> {
    let subtype = match dict.get(b"Subtype").ok().and_then(|o| resolve(doc, o).ok()) {
        Some(Object::Name(name)) => name.clone(),
        _ => return None,
    };
    if SKIPPED_SUBTYPES.contains(&subtype.as_slice()) {
        return None;
    }

    let comment = match dict.get(b"Contents").ok().and_then(|o| resolve(doc, o).ok()) {
        Some(Object::String(bytes, _)) => decode_text(bytes),
        _ => String::new(),
    };
    if comment.trim().is_empty() {
        return None;
    }

    // PDF user space has its origin at the media box's lower left corner.
    let to_top_left = |x: f32, y: f32| (x - media[0], media[3] - y);

    let rect = dict
        .get(b"Rect")
        .ok()
        .and_then(|o| numbers(doc, o))
        .filter(|v| v.len() == 4)
        .map(|v| {
            let (x0, y0) = to_top_left(v[0], v[1]);
            let (x1, y1) = to_top_left(v[2], v[3]);
            [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
        });
    let quad_points = dict
        .get(b"QuadPoints")
        .ok()
        .and_then(|o| numbers(doc, o))
        .filter(|v| v.len() >= 8)
        .map(|v| {
            v.chunks_exact(2)
                .flat_map(|p| {
                    let (x, y) = to_top_left(p[0], p[1]);
                    [x, y]
                })
                .collect::<Vec<f32>>()
        });

    Some(ExtractedAnnotation {
        page,
        comment,
        subtype: Some(String::from_utf8_lossy(&subtype).into_owned()),
        rect,
        quad_points,
        highlighted: None,
        origin: Some(Origin::TopLeft),
    })
}

/// Read commented annotations from every page of a PDF.
///
/// Boxes are converted to top-left page coordinates. Links, popups, form
/// widgets and annotations without `/Contents` are skipped.
pub fn read_annotations(path: &Path) -> Result<Vec<ExtractedAnnotation>> {
    let doc = Document::load(path)?;
    let mut annotations = Vec::new();

    for (number, page_id) in doc.get_pages() {
        let page = number as usize - 1;
        let page_dict = doc.get_dictionary(page_id)?;
        let media = media_box(&doc, page_dict)
            .ok_or_else(|| Error::Pdf(format!("page {} has no usable MediaBox", number)))?;

        let annots = match page_dict.get(b"Annots") {
            Ok(obj) => match resolve(&doc, obj)? {
                Object::Array(items) => items.clone(),
                _ => continue,
            },
            Err(_) => continue,
        };

        for item in &annots {
            let dict = match resolve(&doc, item) {
                Ok(Object::Dictionary(dict)) => dict,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Page {}: unreadable annotation: {}", number, e);
                    continue;
                },
            };
            if let Some(annotation) = annotation_from_dict(&doc, dict, page, media) {
                annotations.push(annotation);
            }
        }
    }

    log::info!("Read {} annotations from {}", annotations.len(), path.display());
    Ok(annotations)
}
