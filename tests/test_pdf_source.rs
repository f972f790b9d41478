//! Reading reviewer annotations from real PDF files.

use lopdf::{Document, Object, ObjectId, StringFormat, dictionary};
use pdf_remarks::annotations::AnnotationSubtype;
use pdf_remarks::layout::LineLabelFormat;
use pdf_remarks::source::{ExtractedDocument, Origin, pdf};
use std::path::Path;

fn real_array(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

/// Two pages; the media box is inherited from the page tree on page 2.
fn write_annotated_pdf(path: &Path) {
    let mut doc = Document::with_version("1.7");
    let pages_id: ObjectId = doc.new_object_id();

    let highlight = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => real_array(&[100.0, 680.0, 200.0, 692.0]),
        "QuadPoints" => real_array(&[100.0, 692.0, 200.0, 692.0, 100.0, 680.0, 200.0, 680.0]),
        "Contents" => Object::String(b"Warum diese Methode?".to_vec(), StringFormat::Literal),
    });
    let link = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![10.into(), 10.into(), 20.into(), 20.into()],
        "Contents" => Object::String(b"ignored".to_vec(), StringFormat::Literal),
    });
    let empty_note = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Text",
        "Rect" => vec![10.into(), 10.into(), 20.into(), 20.into()],
    });
    let utf16 = [0xFE, 0xFF, 0x00, 0x51, 0x00, 0x75, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x65, 0x00, 0x3F];
    let note = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Text",
        "Rect" => vec![300.into(), 500.into(), 320.into(), 520.into()],
        "Contents" => Object::String(utf16.to_vec(), StringFormat::Hexadecimal),
    });

    let page1 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Annots" => vec![Object::Reference(highlight), Object::Reference(link), Object::Reference(empty_note)],
    });
    let page2 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "Annots" => vec![Object::Reference(note)],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page1), Object::Reference(page2)],
            "Count" => 2,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog));
    doc.save(path).unwrap();
}

#[test]
fn test_read_annotations_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotated.pdf");
    write_annotated_pdf(&path);

    let annotations = pdf::read_annotations(&path).unwrap();
    assert_eq!(annotations.len(), 2);

    let highlight = &annotations[0];
    assert_eq!(highlight.page, 0);
    assert_eq!(highlight.comment, "Warum diese Methode?");
    assert_eq!(highlight.subtype.as_deref(), Some("Highlight"));
    assert_eq!(highlight.rect, Some([100.0, 100.0, 200.0, 112.0]));
    assert_eq!(highlight.quad_points.as_ref().map(Vec::len), Some(8));
    assert_eq!(highlight.origin, Some(Origin::TopLeft));

    let note = &annotations[1];
    assert_eq!(note.page, 1);
    assert_eq!(note.comment, "Quelle?");
    assert_eq!(note.rect, Some([300.0, 322.0, 320.0, 342.0]));
}

#[test]
fn test_pdf_annotations_merge_into_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotated.pdf");
    write_annotated_pdf(&path);

    let mut doc = ExtractedDocument::from_json(
        r#"{"pages": [
            {"index": 0, "width": 612, "height": 792,
             "blocks": [{"text": "Wir verwenden die Methode X.", "bbox": [72, 98, 540, 114]}]},
            {"index": 1, "width": 595, "height": 842, "blocks": []}
        ], "annotations": [{"page": 0, "comment": "stale", "rect": [0, 0, 1, 1]}]}"#,
    )
    .unwrap();
    doc.replace_annotations(pdf::read_annotations(&path).unwrap());

    let (_, annotations, stats) = doc.into_parts(&LineLabelFormat::disabled(), true);
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0].subtype, AnnotationSubtype::Highlight);
    assert_eq!(annotations[0].bbox.top(), 100.0);
    assert_eq!(stats.source, 1);
}
