//! Input boundary: the text extraction dump and PDF annotations.
//!
//! Text layout comes from an upstream extraction step as JSON. The
//! annotations can come from the same dump or be read straight from the
//! annotated PDF with [`pdf::read_annotations`].
//!
//! # Examples
//!
//! ```
//! use pdf_remarks::layout::LineLabelFormat;
//! use pdf_remarks::source::ExtractedDocument;
//!
//! let json = r#"{
//!   "pages": [{"index": 0, "width": 595, "height": 842,
//!              "blocks": [{"text": "Die Stichprobe ist klein.", "bbox": [72, 100, 300, 112]}]}],
//!   "annotations": [{"page": 0, "comment": "Warum?", "rect": [80, 98, 150, 114]}]
//! }"#;
//! let doc = ExtractedDocument::from_json(json).unwrap();
//! let (layouts, annotations, _stats) = doc.into_parts(&LineLabelFormat::disabled(), true);
//! assert_eq!(layouts.len(), 1);
//! assert_eq!(annotations[0].comment, "Warum?");
//! ```

pub mod pdf;

use crate::annotations::{AnnotationSubtype, CategoryStats, RawAnnotation};
use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::{LineLabelFormat, PageLayout, PageLayoutBuilder, TextBlock, Word};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the y axis starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// y grows downwards from the top edge
    #[default]
    TopLeft,
    /// PDF user space: y grows upwards from the bottom edge
    BottomLeft,
}

impl Origin {
    /// Convert an `[x0, y0, x1, y1]` box to a top-left [`Rect`].
    pub fn to_rect(self, bbox: [f32; 4], page_height: f32) -> Rect {
        let rect = Rect::from_points(bbox[0], bbox[1], bbox[2], bbox[3]);
        match self {
            Self::TopLeft => rect,
            Self::BottomLeft => rect.flip_y(page_height),
        }
    }
}

/// A word with its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedWord {
    /// Word text
    pub text: String,
    /// `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
}

/// A text block, optionally with its words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    /// Block text
    pub text: String,
    /// `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    /// Word boxes, when the extractor provides them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<ExtractedWord>,
}

/// One page of the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Zero-based page index
    pub index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Coordinate origin of every box on this page
    #[serde(default)]
    pub origin: Origin,
    /// Text blocks
    #[serde(default)]
    pub blocks: Vec<ExtractedBlock>,
    /// Words not assigned to any block
    #[serde(default)]
    pub words: Vec<ExtractedWord>,
}

/// One annotation of the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAnnotation {
    /// Zero-based page index
    pub page: usize,
    /// Comment text (`/Contents`)
    #[serde(default)]
    pub comment: String,
    /// PDF subtype name, e.g. `Highlight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// `[x0, y0, x1, y1]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f32; 4]>,
    /// Flat `QuadPoints` array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quad_points: Option<Vec<f32>>,
    /// Highlighted text, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<String>,
    /// Coordinate origin; the page's origin when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
}

impl ExtractedAnnotation {
    /// Box of the annotation: `rect`, else the quad points.
    fn bbox(&self, origin: Origin, page_height: f32) -> Option<Rect> {
        let origin = self.origin.unwrap_or(origin);
        if let Some(rect) = self.rect {
            return Some(origin.to_rect(rect, page_height));
        }
        let quad = Rect::from_quad_points(self.quad_points.as_deref()?)?;
        Some(origin.to_rect([quad.left(), quad.top(), quad.right(), quad.bottom()], page_height))
    }
}

/// The complete extraction dump of one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Pages in any order
    #[serde(default)]
    pub pages: Vec<ExtractedPage>,
    /// Annotations in document order
    #[serde(default)]
    pub annotations: Vec<ExtractedAnnotation>,
}

impl ExtractedDocument {
    /// Parse a JSON dump.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON dump from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let doc = Self::from_json(&json)?;
        log::info!(
            "Loaded {} pages and {} annotations from {}",
            doc.pages.len(),
            doc.annotations.len(),
            path.display()
        );
        Ok(doc)
    }

    /// Replace the annotations, e.g. with those read from the PDF.
    pub fn replace_annotations(&mut self, annotations: Vec<ExtractedAnnotation>) {
        log::debug!(
            "Replacing {} annotations with {}",
            self.annotations.len(),
            annotations.len()
        );
        self.annotations = annotations;
    }

    fn sorted_pages(&self) -> Vec<&ExtractedPage> {
        let mut pages: Vec<&ExtractedPage> = self.pages.iter().collect();
        pages.sort_by_key(|p| p.index);
        pages
    }

    /// Plain text per page, in page order.
    pub fn page_texts(&self) -> Vec<String> {
        self.sorted_pages()
            .into_iter()
            .map(|page| {
                if page.blocks.is_empty() {
                    page.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
                } else {
                    page.blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n")
                }
            })
            .collect()
    }

    /// Build every page layout and the classified annotations.
    ///
    /// Annotations without comment text or without any box are dropped.
    /// The rest are numbered in document order (page, then dump order).
    pub fn into_parts(
        &self,
        format: &LineLabelFormat,
        ignore_source: bool,
    ) -> (Vec<PageLayout>, Vec<RawAnnotation>, CategoryStats) {
        let pages = self.sorted_pages();
        let layouts: Vec<PageLayout> = pages.iter().map(|page| build_layout(page, format)).collect();

        let mut indexed: Vec<(usize, &ExtractedAnnotation)> = self.annotations.iter().enumerate().collect();
        indexed.sort_by_key(|(i, a)| (a.page, *i));

        let mut annotations = Vec::new();
        for (_, extracted) in indexed {
            let comment = extracted.comment.trim();
            if comment.is_empty() {
                continue;
            }
            // Annotations on unknown pages keep their box; the locator reports them.
            let (origin, height) = pages
                .iter()
                .find(|p| p.index == extracted.page)
                .map(|p| (p.origin, p.height))
                .unwrap_or((Origin::TopLeft, 0.0));
            let Some(bbox) = extracted.bbox(origin, height) else {
                log::warn!("Dropping annotation on page {} without rect", extracted.page);
                continue;
            };

            let mut annotation = RawAnnotation::new(annotations.len(), extracted.page, bbox, comment)
                .classified(ignore_source);
            if let Some(subtype) = &extracted.subtype {
                annotation = annotation.with_subtype(AnnotationSubtype::from_pdf_name(subtype));
            }
            if let Some(text) = extracted.highlighted.as_deref().filter(|t| !t.trim().is_empty()) {
                annotation = annotation.with_highlighted(text);
            }
            annotations.push(annotation);
        }

        let stats = CategoryStats::from_annotations(&annotations);
        log::info!(
            "{} annotations ({} source, {} language remarks)",
            annotations.len(),
            stats.source,
            stats.language
        );
        (layouts, annotations, stats)
    }
}

fn build_layout(page: &ExtractedPage, format: &LineLabelFormat) -> PageLayout {
    let to_word = |w: &ExtractedWord| Word::new(w.text.clone(), page.origin.to_rect(w.bbox, page.height));

    let mut builder = PageLayoutBuilder::new(page.index, Rect::new(0.0, 0.0, page.width, page.height));
    for block in &page.blocks {
        let bbox = page.origin.to_rect(block.bbox, page.height);
        let words: Vec<Word> = block.words.iter().map(to_word).collect();
        builder = builder.block(TextBlock::new(block.text.clone(), bbox).with_words(words));
    }
    builder.words(page.words.iter().map(to_word).collect()).build(format)
}
