//! Context Packager: turns resolved annotations into rewrite requests.
//!
//! Filters the annotations that should be rewritten, trims their paragraph
//! context to a character budget, drops duplicates and puts the result in
//! reading order.

use crate::annotations::AnnotationCategory;
use crate::config::DocumentKind;
use crate::locator::{Confidence, ResolvedAnnotation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Characters that end a sentence when followed by whitespace.
const SENTENCE_END: [char; 5] = ['.', '!', '?', ':', ';'];

/// Packaging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// Maximum paragraph context length in characters
    pub context_budget: usize,
    /// Also package source and language remarks
    pub include_all_categories: bool,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            context_budget: 500,
            include_all_categories: false,
        }
    }
}

/// The unit handed to the rewrite collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRequest {
    /// Position of the source annotation in document order
    pub order: usize,
    /// Zero-based page index
    pub page: usize,
    /// Printed or interpolated line number
    pub line_number: u32,
    /// Matched word or phrase; empty when unresolved
    pub anchor_text: String,
    /// Trimmed paragraph text
    pub paragraph_context: String,
    /// Reviewer comment as written
    pub raw_comment: String,
    /// Thesis question or review comment
    pub kind: DocumentKind,
    /// How reliably the annotation was placed
    pub confidence: Confidence,
}

impl RewriteRequest {
    /// One-based page number for display.
    pub fn page_number(&self) -> usize {
        self.page + 1
    }
}

/// Builds ordered, deduplicated rewrite requests.
#[derive(Debug, Clone, Default)]
pub struct ContextPackager {
    config: PackagerConfig,
}

impl ContextPackager {
    /// Create a packager.
    pub fn new(config: PackagerConfig) -> Self {
        Self { config }
    }

    /// Package resolved annotations.
    ///
    /// Later duplicates of the same `(page, anchor_text, line_number)` are
    /// dropped; annotations without an anchor are never merged. The result
    /// is sorted by page, line number and document order.
    pub fn package(&self, resolved: &[ResolvedAnnotation], kind: DocumentKind) -> Vec<RewriteRequest> {
        let mut in_order: Vec<&ResolvedAnnotation> = resolved
            .iter()
            .filter(|r| self.config.include_all_categories || r.annotation.category == AnnotationCategory::Rewrite)
            .collect();
        in_order.sort_by_key(|r| r.order());

        let mut seen: HashSet<(usize, &str, u32)> = HashSet::new();
        let mut requests: Vec<RewriteRequest> = Vec::with_capacity(in_order.len());
        for r in in_order {
            if !r.anchor_text.is_empty() && !seen.insert((r.page(), r.anchor_text.as_str(), r.line_number)) {
                log::debug!(
                    "Dropping duplicate annotation #{} ('{}' on page {}, line {})",
                    r.order(),
                    r.anchor_text,
                    r.page() + 1,
                    r.line_number
                );
                continue;
            }
            requests.push(RewriteRequest {
                order: r.order(),
                page: r.page(),
                line_number: r.line_number,
                anchor_text: r.anchor_text.clone(),
                paragraph_context: trim_context(&r.paragraph_context, self.config.context_budget),
                raw_comment: r.annotation.comment.trim().to_string(),
                kind,
                confidence: r.confidence,
            });
        }

        requests.sort_by_key(|r| (r.page, r.line_number, r.order));
        requests
    }
}

/// Trim text to at most `budget` characters without cutting a word.
///
/// Prefers the last sentence end inside the budget when it lies in the
/// second half of the budget, otherwise the last whitespace. A single word
/// longer than the budget is kept whole.
///
/// # Examples
///
/// ```
/// use pdf_remarks::packager::trim_context;
///
/// let text = "Short one. Then a longer second sentence follows here.";
/// assert_eq!(trim_context(text, 20), "Short one.");
/// assert_eq!(trim_context(text, 30), "Short one. Then a longer");
/// assert_eq!(trim_context("tiny", 10), "tiny");
/// ```
pub fn trim_context(text: &str, budget: usize) -> String {
    let text = text.trim();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    if chars.len() <= budget {
        return text.to_string();
    }

    let mut sentence_end: Option<(usize, usize)> = None;
    let mut last_space: Option<usize> = None;
    for i in 0..budget {
        let (pos, c) = chars[i];
        let next_is_space = chars.get(i + 1).is_some_and(|(_, n)| n.is_whitespace());
        if SENTENCE_END.contains(&c) && next_is_space {
            sentence_end = Some((i + 1, pos + c.len_utf8()));
        }
        if c.is_whitespace() {
            last_space = Some(pos);
        }
    }
    // Budget ends exactly before a space: the cut is clean there
    if chars[budget].1.is_whitespace() {
        last_space = Some(chars[budget].0);
    }

    if let Some((count, end)) = sentence_end {
        if count * 2 >= budget {
            return text[..end].to_string();
        }
    }
    if let Some(pos) = last_space {
        return text[..pos].trim_end().to_string();
    }

    // A single word longer than the budget
    let end = text[chars[budget].0..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| chars[budget].0 + offset);
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::RawAnnotation;
    use crate::geometry::Rect;
    use crate::locator::LineSource;

    fn resolved(order: usize, page: usize, line: u32, anchor: &str) -> ResolvedAnnotation {
        ResolvedAnnotation {
            annotation: RawAnnotation::new(order, page, Rect::new(0.0, 0.0, 10.0, 10.0), format!("c{}", order)),
            anchor_text: anchor.to_string(),
            paragraph_context: format!("Context with {}.", anchor),
            line_number: line,
            line_source: LineSource::Interpolated,
            confidence: if anchor.is_empty() {
                Confidence::None
            } else {
                Confidence::Estimated
            },
        }
    }

    #[test]
    fn test_orders_by_page_line_then_order() {
        let input = vec![
            resolved(0, 2, 5, "a"),
            resolved(1, 0, 40, "b"),
            resolved(2, 0, 3, "c"),
            resolved(3, 0, 3, "d"),
        ];
        let requests = ContextPackager::default().package(&input, DocumentKind::Thesis);
        let orders: Vec<usize> = requests.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![2, 3, 1, 0]);
    }

    #[test]
    fn test_deduplicates_keeping_first() {
        let input = vec![resolved(0, 1, 7, "Modell"), resolved(1, 1, 7, "Modell"), resolved(2, 1, 8, "Modell")];
        let requests = ContextPackager::default().package(&input, DocumentKind::PeerReview);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].order, 0);
        assert_eq!(requests[0].raw_comment, "c0");
        assert_eq!(requests[0].kind, DocumentKind::PeerReview);
    }

    #[test]
    fn test_unresolved_are_not_merged() {
        let input = vec![resolved(0, 1, 7, ""), resolved(1, 1, 7, "")];
        let requests = ContextPackager::default().package(&input, DocumentKind::Thesis);
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_filters_non_rewrite_categories() {
        let mut source = resolved(1, 0, 2, "x");
        source.annotation.category = AnnotationCategory::Source;
        let input = vec![resolved(0, 0, 1, "a"), source];

        assert_eq!(ContextPackager::default().package(&input, DocumentKind::Thesis).len(), 1);
        let all = ContextPackager::new(PackagerConfig {
            context_budget: 500,
            include_all_categories: true,
        });
        assert_eq!(all.package(&input, DocumentKind::Thesis).len(), 2);
    }

    #[test]
    fn test_trim_never_cuts_mid_word() {
        let text = "alpha beta gamma delta";
        assert_eq!(trim_context(text, 8), "alpha");
        assert_eq!(trim_context(text, 10), "alpha beta");
        assert_eq!(trim_context(text, 11), "alpha beta");
    }

    #[test]
    fn test_trim_single_long_word() {
        assert_eq!(trim_context("Donaudampfschifffahrt ist lang", 5), "Donaudampfschifffahrt");
    }

    #[test]
    fn test_trim_counts_characters_not_bytes() {
        let text = "Größe äußerst übermäßig";
        assert_eq!(trim_context(text, 14), "Größe äußerst");
    }

    #[test]
    fn test_early_sentence_end_is_ignored() {
        let text = "Ja. Dies ist ein sehr langer Satz ohne Ende in Sicht";
        assert_eq!(trim_context(text, 30), "Ja. Dies ist ein sehr langer");
    }
}
