//! Markdown peer review output.

use crate::error::Result;
use crate::locator::Confidence;
use crate::rewrite::RewrittenComment;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    /// Line breaks with surrounding whitespace
    static ref RE_LINE_BREAK: Regex = Regex::new(r"\s*\n\s*").unwrap();
}

/// One bullet of the review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    /// 1-based page number
    pub page: usize,
    /// Line number on the page
    pub line: u32,
    /// How the location was determined
    pub confidence: Confidence,
    /// Review comment
    pub text: String,
}

impl ReviewEntry {
    fn render(&self) -> String {
        let line = match self.confidence {
            Confidence::Exact => format!("Line {}", self.line),
            Confidence::Estimated | Confidence::None => format!("Line ~{}", self.line),
        };
        let text = RE_LINE_BREAK.replace_all(self.text.trim(), " ");
        match self.confidence {
            Confidence::None => format!("- Page {}, {}: {} (location approximate)", self.page, line, text),
            _ => format!("- Page {}, {}: {}", self.page, line, text),
        }
    }
}

/// A Markdown review letter to the authors of a manuscript.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewDocument {
    entries: Vec<ReviewEntry>,
}

impl ReviewDocument {
    /// Build from rewritten comments, keeping their order.
    pub fn from_comments(comments: &[RewrittenComment]) -> Self {
        let entries = comments
            .iter()
            .map(|c| ReviewEntry {
                page: c.request.page_number(),
                line: c.request.line_number,
                confidence: c.request.confidence,
                text: c.text.clone(),
            })
            .collect();
        Self { entries }
    }

    /// Review bullets.
    pub fn entries(&self) -> &[ReviewEntry] {
        &self.entries
    }

    /// Render the review.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::converters::ReviewDocument;
    ///
    /// let md = ReviewDocument::default().render();
    /// assert!(md.starts_with("# Peer Review\n\nDear authors,"));
    /// ```
    pub fn render(&self) -> String {
        let mut lines = vec![
            "# Peer Review".to_string(),
            String::new(),
            "Dear authors,".to_string(),
            String::new(),
            "here are my comments on your manuscript:".to_string(),
            String::new(),
        ];
        lines.extend(self.entries.iter().map(ReviewEntry::render));
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Write the rendered review.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        log::info!("Review written to {} ({} comments)", path.display(), self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: u32, confidence: Confidence, text: &str) -> ReviewEntry {
        ReviewEntry {
            page: 2,
            line,
            confidence,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_entry_formats() {
        assert_eq!(
            entry(12, Confidence::Exact, "Please cite.").render(),
            "- Page 2, Line 12: Please cite."
        );
        assert_eq!(
            entry(7, Confidence::Estimated, "Unclear.").render(),
            "- Page 2, Line ~7: Unclear."
        );
        assert_eq!(
            entry(1, Confidence::None, "Typo.").render(),
            "- Page 2, Line ~1: Typo. (location approximate)"
        );
    }

    #[test]
    fn test_multiline_comment_stays_one_bullet() {
        let rendered = entry(3, Confidence::Exact, "First point.\n\n  Second point.").render();
        assert_eq!(rendered, "- Page 2, Line 3: First point. Second point.");
    }

    #[test]
    fn test_render_and_write() {
        let doc = ReviewDocument {
            entries: vec![entry(3, Confidence::Exact, "A"), entry(9, Confidence::Exact, "B")],
        };
        let md = doc.render();
        assert!(md.ends_with("- Page 2, Line 3: A\n- Page 2, Line 9: B\n"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.md");
        doc.write_to(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), md);
    }
}
