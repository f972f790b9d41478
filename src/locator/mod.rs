//! Annotation Locator: places each annotation on its page.
//!
//! For one annotation and the layout of its page the locator finds the
//! enclosing paragraph block (widening the search box in a few steps to
//! tolerate offset highlight boxes), extracts the anchored words and
//! assigns a printed or interpolated line number.
//!
//! # Example
//!
//! ```
//! use pdf_remarks::annotations::RawAnnotation;
//! use pdf_remarks::geometry::Rect;
//! use pdf_remarks::layout::{LineLabelFormat, PageLayoutBuilder, TextBlock};
//! use pdf_remarks::locator::{Confidence, Locator};
//!
//! let layout = PageLayoutBuilder::new(0, Rect::new(0.0, 0.0, 600.0, 800.0))
//!     .block(TextBlock::new("The results are significant.", Rect::new(100.0, 100.0, 300.0, 12.0)))
//!     .build(&LineLabelFormat::disabled());
//!
//! let annotation = RawAnnotation::new(0, 0, Rect::new(260.0, 101.0, 40.0, 10.0), "How?")
//!     .with_highlighted("significant");
//! let resolved = Locator::default().resolve(&annotation, &layout).unwrap();
//!
//! assert_eq!(resolved.anchor_text, "significant");
//! assert_eq!(resolved.confidence, Confidence::Estimated);
//! assert_eq!(resolved.line_number, 1);
//! ```

pub mod anchor;
pub mod line_number;

pub use anchor::{WordSpan, extract_anchor, word_spans};
pub use line_number::{LineSource, line_number_at};

use crate::annotations::RawAnnotation;
use crate::error::{LocateError, OutOfRangeReason};
use crate::geometry::Rect;
use crate::layout::{PageLayout, TextBlock};
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How reliably an annotation was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Anchor found and line read from a printed label
    Exact,
    /// Anchor found, line number interpolated
    Estimated,
    /// No text block near the annotation; anchor is empty
    None,
}

/// An annotation with its anchor, context and line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAnnotation {
    /// The source annotation with its box clipped to the page
    pub annotation: RawAnnotation,
    /// Matched word or phrase (normalized)
    pub anchor_text: String,
    /// Text of the enclosing paragraph block (normalized)
    pub paragraph_context: String,
    /// Printed or interpolated line number, 1-based
    pub line_number: u32,
    /// Where the line number came from
    pub line_source: LineSource,
    /// How reliably the annotation was placed
    pub confidence: Confidence,
}

impl ResolvedAnnotation {
    /// Position in document order.
    pub fn order(&self) -> usize {
        self.annotation.order
    }

    /// Zero-based page index.
    pub fn page(&self) -> usize {
        self.annotation.page
    }

    /// Whether an anchor was found.
    pub fn is_resolved(&self) -> bool {
        self.confidence != Confidence::None
    }
}

/// Spatial search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Growth per expansion step, in page units
    pub expansion_margin: f32,
    /// Number of expansion steps before giving up
    pub max_expansions: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            expansion_margin: 2.0,
            max_expansions: 5,
        }
    }
}

/// Resolves raw annotations against page layouts.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    config: LocatorConfig,
}

impl Locator {
    /// Create a locator.
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Resolve one annotation against the layout of its page.
    ///
    /// # Errors
    ///
    /// [`LocateError::OutOfRangeAnnotation`] when the layout belongs to a
    /// different page, has no text blocks, or the box lies outside the page.
    /// An annotation with no nearby text is not an error: it resolves with
    /// [`Confidence::None`] and an empty anchor.
    pub fn resolve(
        &self,
        annotation: &RawAnnotation,
        layout: &PageLayout,
    ) -> Result<ResolvedAnnotation, LocateError> {
        let out_of_range = |reason| LocateError::out_of_range(annotation.order, annotation.page, reason);

        if annotation.page != layout.index() {
            return Err(out_of_range(OutOfRangeReason::WrongPage));
        }
        if layout.is_empty() {
            return Err(out_of_range(OutOfRangeReason::EmptyPageLayout));
        }
        let clipped = annotation
            .bbox
            .clip_to(layout.bounds())
            .ok_or_else(|| out_of_range(OutOfRangeReason::OutsidePageBounds))?;

        let (line_number, line_source) = line_number_at(layout, clipped.top());
        let mut placed = annotation.clone();
        placed.bbox = clipped;

        let Some((block, probe)) = self.find_block(layout, &clipped) else {
            log::debug!(
                "Annotation #{} on page {}: no text block within {} expansions",
                annotation.order,
                annotation.page,
                self.config.max_expansions
            );
            return Ok(ResolvedAnnotation {
                annotation: placed,
                anchor_text: String::new(),
                paragraph_context: String::new(),
                line_number,
                line_source,
                confidence: Confidence::None,
            });
        };

        let raw_anchor = extract_anchor(
            block,
            &probe,
            annotation.highlighted.as_deref(),
            layout.metrics().line_height,
        );
        let anchor_text = normalize(raw_anchor);

        let confidence = if anchor_text.is_empty() {
            Confidence::None
        } else {
            match line_source {
                LineSource::Printed => Confidence::Exact,
                LineSource::Interpolated => Confidence::Estimated,
            }
        };
        let paragraph_context = if confidence == Confidence::None {
            String::new()
        } else {
            normalize(&block.text)
        };

        Ok(ResolvedAnnotation {
            annotation: placed,
            anchor_text,
            paragraph_context,
            line_number,
            line_source,
            confidence,
        })
    }

    /// Resolve every annotation against the layout with its page index.
    ///
    /// Returns one result per annotation, in input order. Failures are
    /// logged and never stop the batch.
    pub fn resolve_all(
        &self,
        annotations: &[RawAnnotation],
        layouts: &[PageLayout],
    ) -> Vec<Result<ResolvedAnnotation, LocateError>> {
        let by_page: HashMap<usize, &PageLayout> = layouts.iter().map(|l| (l.index(), l)).collect();

        let results: Vec<_> = annotations
            .iter()
            .map(|annotation| {
                let result = match by_page.get(&annotation.page) {
                    Some(layout) => self.resolve(annotation, layout),
                    None => Err(LocateError::out_of_range(
                        annotation.order,
                        annotation.page,
                        OutOfRangeReason::MissingPage,
                    )),
                };
                if let Err(e) = &result {
                    log::warn!("Skipping annotation: {}", e);
                }
                result
            })
            .collect();

        let unresolved = results
            .iter()
            .filter(|r| matches!(r, Ok(a) if !a.is_resolved()))
            .count();
        log::info!(
            "Resolved {} annotations ({} failed, {} without anchor)",
            results.len(),
            results.iter().filter(|r| r.is_err()).count(),
            unresolved
        );
        results
    }

    /// Block with the largest overlap, widening the probe step by step.
    fn find_block<'a>(&self, layout: &'a PageLayout, clipped: &Rect) -> Option<(&'a TextBlock, Rect)> {
        (0..=self.config.max_expansions).find_map(|step| {
            let probe = if step == 0 {
                *clipped
            } else {
                clipped.expand(step as f32 * self.config.expansion_margin)
            };
            best_overlap(layout, &probe).map(|block| (block, probe))
        })
    }
}

/// First text block with the largest non-zero overlap.
fn best_overlap<'a>(layout: &'a PageLayout, probe: &Rect) -> Option<&'a TextBlock> {
    let mut best: Option<(&TextBlock, f32)> = None;
    for block in layout.text_blocks() {
        let area = block.bbox.overlap_area(probe);
        if area > 0.0 && best.map_or(true, |(_, a)| area > a) {
            best = Some((block, area));
        }
    }
    best.map(|(block, _)| block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LineLabelFormat, PageLayoutBuilder};

    fn layout() -> PageLayout {
        PageLayoutBuilder::new(1, Rect::new(0.0, 0.0, 600.0, 800.0))
            .block(TextBlock::new("Erster Absatz mit Text.", Rect::new(100.0, 100.0, 400.0, 24.0)))
            .block(TextBlock::new("Zweiter Absatz.", Rect::new(100.0, 140.0, 400.0, 12.0)))
            .build(&LineLabelFormat::disabled())
    }

    fn annotation(bbox: Rect) -> RawAnnotation {
        RawAnnotation::new(0, 1, bbox, "Unklar")
    }

    #[test]
    fn test_wrong_page() {
        let a = RawAnnotation::new(4, 2, Rect::new(110.0, 100.0, 10.0, 10.0), "x");
        let err = Locator::default().resolve(&a, &layout()).unwrap_err();
        assert_eq!(err.reason(), OutOfRangeReason::WrongPage);
    }

    #[test]
    fn test_outside_bounds() {
        let a = annotation(Rect::new(700.0, 100.0, 10.0, 10.0));
        let err = Locator::default().resolve(&a, &layout()).unwrap_err();
        assert_eq!(err.reason(), OutOfRangeReason::OutsidePageBounds);
    }

    #[test]
    fn test_empty_layout() {
        let empty = PageLayoutBuilder::new(1, Rect::new(0.0, 0.0, 600.0, 800.0)).build(&LineLabelFormat::disabled());
        let err = Locator::default()
            .resolve(&annotation(Rect::new(10.0, 10.0, 5.0, 5.0)), &empty)
            .unwrap_err();
        assert_eq!(err.reason(), OutOfRangeReason::EmptyPageLayout);
    }

    #[test]
    fn test_largest_overlap_wins() {
        // Touches the first block a little, the second one a lot
        let a = annotation(Rect::new(100.0, 122.0, 100.0, 28.0));
        let resolved = Locator::default().resolve(&a, &layout()).unwrap();
        assert_eq!(resolved.paragraph_context, "Zweiter Absatz.");
    }

    #[test]
    fn test_expansion_finds_offset_highlight() {
        // 3 units below the second block: found on the second expansion step
        let a = annotation(Rect::new(110.0, 155.0, 30.0, 5.0));
        let resolved = Locator::default().resolve(&a, &layout()).unwrap();
        assert!(resolved.is_resolved());
        assert_eq!(resolved.paragraph_context, "Zweiter Absatz.");
    }

    #[test]
    fn test_unresolved_far_from_text() {
        let a = annotation(Rect::new(100.0, 600.0, 30.0, 10.0));
        let resolved = Locator::default().resolve(&a, &layout()).unwrap();
        assert_eq!(resolved.confidence, Confidence::None);
        assert!(resolved.anchor_text.is_empty());
        assert!(resolved.line_number >= 1);
    }

    #[test]
    fn test_bbox_is_clipped() {
        let a = annotation(Rect::new(550.0, 100.0, 100.0, 10.0));
        let resolved = Locator::default().resolve(&a, &layout()).unwrap();
        assert_eq!(resolved.annotation.bbox.right(), 600.0);
    }

    #[test]
    fn test_resolve_all_keeps_order_and_reports_missing_page() {
        let annotations = vec![
            annotation(Rect::new(110.0, 100.0, 20.0, 10.0)),
            RawAnnotation::new(1, 9, Rect::new(110.0, 100.0, 20.0, 10.0), "fehlt"),
            RawAnnotation::new(2, 1, Rect::new(110.0, 140.0, 20.0, 10.0), "zwei"),
        ];
        let results = Locator::default().resolve_all(&annotations, &[layout()]);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].as_ref().unwrap_err().reason(),
            OutOfRangeReason::MissingPage
        );
        assert_eq!(results[2].as_ref().unwrap().order(), 2);
    }
}
