//! Printed line-number labels.
//!
//! Review manuscripts are usually typeset with line numbers in the margin.
//! When the extraction dump carries them as text, they give exact line
//! references; [`LineLabelFormat`] decides which margin text counts as one.

use crate::config::DocumentKind;
use crate::geometry::Rect;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One to five digits, nothing else
    static ref RE_NUMERIC_LABEL: Regex = Regex::new(r"^\d{1,5}$").unwrap();
}

/// How printed line numbers look on a page.
#[derive(Debug, Clone)]
pub struct LineLabelFormat {
    pattern: Option<Regex>,
    margin_fraction: f32,
}

impl LineLabelFormat {
    /// Plain digits inside the outer 15% of the page width.
    pub fn numeric() -> Self {
        Self {
            pattern: Some(RE_NUMERIC_LABEL.clone()),
            margin_fraction: 0.15,
        }
    }

    /// Never matches; every block is paragraph text.
    pub fn disabled() -> Self {
        Self {
            pattern: None,
            margin_fraction: 0.0,
        }
    }

    /// Custom label pattern. The label value is read from the digits of the
    /// matched text.
    pub fn custom(pattern: Regex, margin_fraction: f32) -> Self {
        Self {
            pattern: Some(pattern),
            margin_fraction: margin_fraction.clamp(0.0, 0.5),
        }
    }

    /// Format used for a document kind: peer-review manuscripts carry
    /// margin numbers, theses usually do not.
    pub fn for_document(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::PeerReview => Self::numeric(),
            DocumentKind::Thesis => Self::disabled(),
        }
    }

    /// Whether this format can match anything.
    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// Fraction of the page width treated as margin on each side.
    pub fn margin_fraction(&self) -> f32 {
        self.margin_fraction
    }

    /// Label value of `text` at `bbox`, if it is a printed line number.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    /// use pdf_remarks::layout::LineLabelFormat;
    ///
    /// let page = Rect::new(0.0, 0.0, 600.0, 800.0);
    /// let format = LineLabelFormat::numeric();
    ///
    /// assert_eq!(format.parse("42", &Rect::new(20.0, 100.0, 10.0, 10.0), &page), Some(42));
    /// // Same digits in the text column are not a label
    /// assert_eq!(format.parse("42", &Rect::new(300.0, 100.0, 10.0, 10.0), &page), None);
    /// ```
    pub fn parse(&self, text: &str, bbox: &Rect, page_bounds: &Rect) -> Option<u32> {
        let pattern = self.pattern.as_ref()?;
        let text = text.trim();
        if !pattern.is_match(text) || !self.in_margin(bbox, page_bounds) {
            return None;
        }
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    fn in_margin(&self, bbox: &Rect, page_bounds: &Rect) -> bool {
        let margin = page_bounds.width * self.margin_fraction;
        bbox.right() <= page_bounds.left() + margin || bbox.left() >= page_bounds.right() - margin
    }
}

impl Default for LineLabelFormat {
    fn default() -> Self {
        Self::numeric()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Rect {
        Rect::new(0.0, 0.0, 600.0, 800.0)
    }

    #[test]
    fn test_left_and_right_margin() {
        let format = LineLabelFormat::numeric();
        assert_eq!(format.parse("7", &Rect::new(30.0, 50.0, 8.0, 10.0), &page()), Some(7));
        assert_eq!(format.parse("128", &Rect::new(560.0, 50.0, 20.0, 10.0), &page()), Some(128));
    }

    #[test]
    fn test_rejects_non_numeric_and_long() {
        let format = LineLabelFormat::numeric();
        let bbox = Rect::new(30.0, 50.0, 8.0, 10.0);
        assert_eq!(format.parse("7a", &bbox, &page()), None);
        assert_eq!(format.parse("123456", &bbox, &page()), None);
        assert_eq!(format.parse("", &bbox, &page()), None);
    }

    #[test]
    fn test_box_crossing_margin_is_not_label() {
        let format = LineLabelFormat::numeric();
        // Right edge at 95 is past the 90pt margin
        assert_eq!(format.parse("12", &Rect::new(80.0, 50.0, 15.0, 10.0), &page()), None);
    }

    #[test]
    fn test_disabled() {
        let format = LineLabelFormat::disabled();
        assert!(!format.is_enabled());
        assert_eq!(format.parse("3", &Rect::new(10.0, 50.0, 8.0, 10.0), &page()), None);
    }

    #[test]
    fn test_custom_pattern() {
        let format = LineLabelFormat::custom(Regex::new(r"^\[\d+\]$").unwrap(), 0.1);
        assert_eq!(format.parse("[15]", &Rect::new(5.0, 50.0, 20.0, 10.0), &page()), Some(15));
    }

    #[test]
    fn test_for_document() {
        assert!(LineLabelFormat::for_document(DocumentKind::PeerReview).is_enabled());
        assert!(!LineLabelFormat::for_document(DocumentKind::Thesis).is_enabled());
    }
}
