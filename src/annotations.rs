//! Reviewer annotations as read from a PDF.
//!
//! A [`RawAnnotation`] is one comment or highlight in document order, with
//! its box already in top-left page coordinates. Comments are sorted into an
//! [`AnnotationCategory`] when they are read: only `Rewrite` remarks go to
//! the language model, the others feed summary statistics.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Annotation subtype (ISO 32000-1 Table 169), reduced to the markup types a
/// reviewer leaves on a manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnnotationSubtype {
    /// Sticky note
    #[default]
    Text,
    /// Free text box on the page
    FreeText,
    /// Highlighted text
    Highlight,
    /// Underlined text
    Underline,
    /// Squiggly underline
    Squiggly,
    /// Struck-out text
    StrikeOut,
    /// Insertion caret
    Caret,
    /// Freehand drawing
    Ink,
    /// Rectangle
    Square,
    /// Ellipse
    Circle,
    /// Anything else
    Other,
}

impl AnnotationSubtype {
    /// Get the PDF name for this annotation subtype.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::FreeText => "FreeText",
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Squiggly => "Squiggly",
            Self::StrikeOut => "StrikeOut",
            Self::Caret => "Caret",
            Self::Ink => "Ink",
            Self::Square => "Square",
            Self::Circle => "Circle",
            Self::Other => "Other",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name.trim_start_matches('/') {
            "Text" => Self::Text,
            "FreeText" => Self::FreeText,
            "Highlight" => Self::Highlight,
            "Underline" => Self::Underline,
            "Squiggly" => Self::Squiggly,
            "StrikeOut" => Self::StrikeOut,
            "Caret" => Self::Caret,
            "Ink" => Self::Ink,
            "Square" => Self::Square,
            "Circle" => Self::Circle,
            _ => Self::Other,
        }
    }

    /// Check if this is a text markup annotation (marks a span of text).
    pub fn is_text_markup(&self) -> bool {
        matches!(self, Self::Highlight | Self::Underline | Self::Squiggly | Self::StrikeOut)
    }
}

const LANGUAGE_KEYWORDS: [&str; 4] = ["rechtschreibung", "grammatik", "tippfehler", "ausdruck"];

/// Maximum length of a comment that is only a missing-source marker.
const SOURCE_MARKER_MAX_CHARS: usize = 15;

/// What happens to an annotation's comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationCategory {
    /// Rewritten by the language model
    #[default]
    Rewrite,
    /// Short "Quelle?"/"source?" marker, only counted
    Source,
    /// Spelling or grammar remark, only counted
    Language,
    /// "ab hier" range marker, dropped
    Ignore,
}

impl AnnotationCategory {
    /// Categorize a comment.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::annotations::AnnotationCategory;
    ///
    /// assert_eq!(AnnotationCategory::classify("Ab hier", true), AnnotationCategory::Ignore);
    /// assert_eq!(AnnotationCategory::classify("Quelle?", true), AnnotationCategory::Source);
    /// assert_eq!(AnnotationCategory::classify("Quelle?", false), AnnotationCategory::Rewrite);
    /// assert_eq!(AnnotationCategory::classify("Grammatik", true), AnnotationCategory::Language);
    /// ```
    pub fn classify(comment: &str, ignore_source: bool) -> Self {
        let text = comment.trim();
        let lower = text.to_lowercase();

        if lower == "ab hier" {
            Self::Ignore
        } else if ignore_source
            && (lower.contains("quelle") || lower.contains("source"))
            && text.chars().count() < SOURCE_MARKER_MAX_CHARS
        {
            Self::Source
        } else if LANGUAGE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            Self::Language
        } else {
            Self::Rewrite
        }
    }
}

/// Counts of comments that are not rewritten but summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Missing-source markers
    pub source: usize,
    /// Spelling and grammar remarks
    pub language: usize,
}

impl CategoryStats {
    /// Count one annotation.
    pub fn record(&mut self, category: AnnotationCategory) {
        match category {
            AnnotationCategory::Source => self.source += 1,
            AnnotationCategory::Language => self.language += 1,
            AnnotationCategory::Rewrite | AnnotationCategory::Ignore => {},
        }
    }

    /// Count every annotation of a slice.
    pub fn from_annotations(annotations: &[RawAnnotation]) -> Self {
        let mut stats = Self::default();
        for annotation in annotations {
            stats.record(annotation.category);
        }
        stats
    }
}

/// One reviewer annotation before placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    /// Position in document order
    pub order: usize,
    /// Zero-based page index
    pub page: usize,
    /// Annotation box (top-left origin, page space)
    pub bbox: Rect,
    /// Reviewer comment
    pub comment: String,
    /// Highlighted substring, when the source knows it
    pub highlighted: Option<String>,
    /// PDF subtype
    pub subtype: AnnotationSubtype,
    /// Comment category
    pub category: AnnotationCategory,
}

impl RawAnnotation {
    /// Create an annotation; the category defaults to `Rewrite`.
    pub fn new(order: usize, page: usize, bbox: Rect, comment: impl Into<String>) -> Self {
        Self {
            order,
            page,
            bbox,
            comment: comment.into(),
            highlighted: None,
            subtype: AnnotationSubtype::Text,
            category: AnnotationCategory::Rewrite,
        }
    }

    /// Attach the highlighted substring.
    pub fn with_highlighted(mut self, text: impl Into<String>) -> Self {
        self.highlighted = Some(text.into());
        self
    }

    /// Set the subtype.
    pub fn with_subtype(mut self, subtype: AnnotationSubtype) -> Self {
        self.subtype = subtype;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: AnnotationCategory) -> Self {
        self.category = category;
        self
    }

    /// Re-derive the category from the comment.
    pub fn classified(mut self, ignore_source: bool) -> Self {
        self.category = AnnotationCategory::classify(&self.comment, ignore_source);
        self
    }
}
