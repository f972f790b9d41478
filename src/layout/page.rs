//! Page layout: ordered text blocks of one page and their line metrics.

use crate::geometry::Rect;
use crate::layout::clustering::{cluster_lines_into_blocks, cluster_words_into_lines, median_gap, merge_line_tops};
use crate::layout::line_labels::LineLabelFormat;
use serde::{Deserialize, Serialize};

/// Line height used when a page has fewer than two distinct line tops.
pub const DEFAULT_LINE_HEIGHT: f32 = 12.0;

/// A word cell with its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text
    pub text: String,
    /// Bounding box (top-left origin)
    pub bbox: Rect,
}

impl Word {
    /// Create a new word.
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// A block of text on a page.
///
/// Blocks with `line_label` set are printed line numbers from the margin,
/// not paragraph text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Bounding box (top-left origin)
    pub bbox: Rect,
    /// Block text in reading order
    pub text: String,
    /// Word boxes, when the source provides them
    #[serde(default)]
    pub words: Vec<Word>,
    /// Printed line number carried by this block
    #[serde(default)]
    pub line_label: Option<u32>,
}

impl TextBlock {
    /// Create a paragraph block without word boxes.
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            bbox,
            text: text.into(),
            words: Vec::new(),
            line_label: None,
        }
    }

    /// Create a label block for a printed line number.
    pub fn label(value: u32, bbox: Rect) -> Self {
        Self {
            bbox,
            text: value.to_string(),
            words: Vec::new(),
            line_label: Some(value),
        }
    }

    /// Build a block from words in reading order.
    ///
    /// The text is the words joined by single spaces; the box is their union.
    pub fn from_words(words: Vec<Word>) -> Self {
        let text = words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
        let bbox = words
            .iter()
            .map(|w| w.bbox)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| Rect::new(0.0, 0.0, 0.0, 0.0));
        Self {
            bbox,
            text,
            words,
            line_label: None,
        }
    }

    /// Attach word boxes.
    pub fn with_words(mut self, words: Vec<Word>) -> Self {
        self.words = words;
        self
    }

    /// Whether this block is a printed line number.
    pub fn is_label(&self) -> bool {
        self.line_label.is_some()
    }
}

/// Vertical line geometry of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Typical distance between consecutive line tops
    pub line_height: f32,
    /// Top of the topmost text line
    pub first_top: f32,
    /// Top of the bottommost text line
    pub last_top: f32,
}

impl LineMetrics {
    /// Number of lines the page is estimated to hold (at least 1).
    pub fn estimated_line_count(&self) -> u32 {
        let span = (self.last_top - self.first_top).max(0.0);
        ((1.0 + span / self.line_height).round() as u32).max(1)
    }

    /// Interpolated line number of a y-coordinate, clamped to the estimated
    /// line range of the page.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::layout::LineMetrics;
    ///
    /// let metrics = LineMetrics { line_height: 12.0, first_top: 100.0, last_top: 196.0 };
    /// assert_eq!(metrics.estimated_line_count(), 9);
    /// assert_eq!(metrics.line_at(124.0), 3);
    /// assert_eq!(metrics.line_at(20.0), 1);
    /// assert_eq!(metrics.line_at(700.0), 9);
    /// ```
    pub fn line_at(&self, top: f32) -> u32 {
        let raw = (1.0 + (top - self.first_top) / self.line_height).round();
        let max = self.estimated_line_count();
        if raw < 1.0 {
            1
        } else {
            (raw as u32).min(max)
        }
    }

    fn from_blocks(blocks: &[TextBlock]) -> Self {
        let text_blocks: Vec<&TextBlock> = blocks.iter().filter(|b| !b.is_label()).collect();
        if text_blocks.is_empty() {
            return Self {
                line_height: DEFAULT_LINE_HEIGHT,
                first_top: 0.0,
                last_top: 0.0,
            };
        }

        let word_tops: Vec<f32> = text_blocks
            .iter()
            .flat_map(|b| b.words.iter().map(|w| w.bbox.top()))
            .collect();

        // Word tops jitter within a line, so gaps are measured between lines
        let tops: Vec<f32> = if word_tops.is_empty() {
            text_blocks.iter().map(|b| b.bbox.top()).collect()
        } else {
            let tolerance = median_word_height(text_blocks.iter().flat_map(|b| b.words.iter())) * 0.5;
            let mut tops = word_tops;
            tops.extend(text_blocks.iter().filter(|b| b.words.is_empty()).map(|b| b.bbox.top()));
            merge_line_tops(&tops, tolerance)
        };

        let line_height = median_gap(&tops).unwrap_or(DEFAULT_LINE_HEIGHT);
        let first_top = tops.iter().copied().fold(f32::INFINITY, f32::min);

        // A block without word boxes still spans lines below its top
        let last_top = text_blocks
            .iter()
            .filter(|b| b.words.is_empty())
            .map(|b| b.bbox.top().max(b.bbox.bottom() - line_height))
            .chain(tops.iter().copied())
            .fold(f32::NEG_INFINITY, f32::max);

        Self {
            line_height,
            first_top,
            last_top: last_top.max(first_top),
        }
    }
}

/// Immutable layout of one page.
///
/// Built once by [`PageLayoutBuilder::build`] and then shared read-only by
/// every annotation on the page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    index: usize,
    bounds: Rect,
    blocks: Vec<TextBlock>,
    metrics: LineMetrics,
}

impl PageLayout {
    /// Zero-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page bounds (top-left origin).
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// All blocks in reading order, labels included.
    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    /// Paragraph blocks in reading order.
    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().filter(|b| !b.is_label())
    }

    /// Printed line-number blocks sorted top-to-bottom.
    pub fn label_blocks(&self) -> Vec<&TextBlock> {
        let mut labels: Vec<&TextBlock> = self.blocks.iter().filter(|b| b.is_label()).collect();
        labels.sort_by(|a, b| a.bbox.top().total_cmp(&b.bbox.top()));
        labels
    }

    /// Whether the page carries printed line numbers.
    pub fn has_line_labels(&self) -> bool {
        self.blocks.iter().any(|b| b.is_label())
    }

    /// Derived line geometry.
    pub fn metrics(&self) -> &LineMetrics {
        &self.metrics
    }

    /// Whether the page has no paragraph text.
    pub fn is_empty(&self) -> bool {
        self.text_blocks().next().is_none()
    }

    /// Paragraph text of the page, one block per line.
    pub fn plain_text(&self) -> String {
        self.text_blocks().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Builder for [`PageLayout`].
///
/// # Examples
///
/// ```
/// use pdf_remarks::geometry::Rect;
/// use pdf_remarks::layout::{LineLabelFormat, PageLayoutBuilder, TextBlock};
///
/// let layout = PageLayoutBuilder::new(0, Rect::new(0.0, 0.0, 600.0, 800.0))
///     .block(TextBlock::new("First paragraph.", Rect::new(100.0, 100.0, 400.0, 24.0)))
///     .block(TextBlock::new("12", Rect::new(20.0, 100.0, 10.0, 10.0)))
///     .build(&LineLabelFormat::numeric());
///
/// assert!(layout.has_line_labels());
/// assert_eq!(layout.text_blocks().count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PageLayoutBuilder {
    index: usize,
    bounds: Rect,
    blocks: Vec<TextBlock>,
    words: Vec<Word>,
}

impl PageLayoutBuilder {
    /// Start a page.
    pub fn new(index: usize, bounds: Rect) -> Self {
        Self {
            index,
            bounds: bounds.normalized(),
            blocks: Vec::new(),
            words: Vec::new(),
        }
    }

    /// Add a block in reading order.
    pub fn block(mut self, block: TextBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Add loose word cells that are not part of any block.
    pub fn words(mut self, words: Vec<Word>) -> Self {
        self.words.extend(words);
        self
    }

    /// Detect labels, cluster loose words and compute line metrics.
    pub fn build(self, format: &LineLabelFormat) -> PageLayout {
        let bounds = self.bounds;
        let mut blocks: Vec<TextBlock> = self
            .blocks
            .into_iter()
            .map(|mut block| {
                if block.line_label.is_none() {
                    block.line_label = format.parse(&block.text, &block.bbox, &bounds);
                }
                block
            })
            .collect();

        let mut loose = Vec::with_capacity(self.words.len());
        for word in self.words {
            match format.parse(&word.text, &word.bbox, &bounds) {
                Some(value) => blocks.push(TextBlock::label(value, word.bbox)),
                None => loose.push(word),
            }
        }
        blocks.extend(group_words(loose));

        let metrics = LineMetrics::from_blocks(&blocks);
        log::debug!(
            "Page {}: {} blocks, line height {:.1}",
            self.index,
            blocks.len(),
            metrics.line_height
        );

        PageLayout {
            index: self.index,
            bounds,
            blocks,
            metrics,
        }
    }
}

/// Median positive word height, [`DEFAULT_LINE_HEIGHT`] without words.
fn median_word_height<'a>(words: impl Iterator<Item = &'a Word>) -> f32 {
    let mut heights: Vec<f32> = words.map(|w| w.bbox.height).filter(|&h| h > 0.0).collect();
    heights.sort_by(|a, b| a.total_cmp(b));
    heights.get(heights.len() / 2).copied().unwrap_or(DEFAULT_LINE_HEIGHT)
}

/// Cluster loose words into paragraph blocks.
fn group_words(words: Vec<Word>) -> Vec<TextBlock> {
    if words.is_empty() {
        return vec![];
    }

    let word_height = median_word_height(words.iter());

    let lines = cluster_words_into_lines(&words, word_height * 0.5);
    let line_tops: Vec<f32> = lines.iter().map(|l| l.bbox.top()).collect();
    let spacing = median_gap(&line_tops).unwrap_or(word_height.max(DEFAULT_LINE_HEIGHT));

    let mut slots: Vec<Option<Word>> = words.into_iter().map(Some).collect();
    cluster_lines_into_blocks(&lines, spacing)
        .into_iter()
        .map(|line_ids| {
            let block_words: Vec<Word> = line_ids
                .iter()
                .flat_map(|&l| lines[l].words.iter())
                .filter_map(|&w| slots[w].take())
                .collect();
            TextBlock::from_words(block_words)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Rect {
        Rect::new(0.0, 0.0, 600.0, 800.0)
    }

    fn words_line(y: f32, texts: &[&str]) -> Vec<Word> {
        let mut x = 100.0;
        texts
            .iter()
            .map(|t| {
                let w = Word::new(*t, Rect::new(x, y, 6.0 * t.len() as f32, 10.0));
                x += 6.0 * t.len() as f32 + 4.0;
                w
            })
            .collect()
    }

    #[test]
    fn test_empty_page() {
        let layout = PageLayoutBuilder::new(3, page()).build(&LineLabelFormat::numeric());
        assert!(layout.is_empty());
        assert_eq!(layout.index(), 3);
        assert_eq!(layout.metrics().line_height, DEFAULT_LINE_HEIGHT);
    }

    #[test]
    fn test_label_only_page_is_empty() {
        let layout = PageLayoutBuilder::new(0, page())
            .block(TextBlock::new("1", Rect::new(20.0, 100.0, 8.0, 10.0)))
            .build(&LineLabelFormat::numeric());
        assert!(layout.is_empty());
        assert!(layout.has_line_labels());
    }

    #[test]
    fn test_words_only_page_with_margin_numbers() {
        let mut words = Vec::new();
        for (i, y) in [100.0, 112.0, 124.0].iter().enumerate() {
            words.push(Word::new((i + 1).to_string(), Rect::new(20.0, *y, 8.0, 10.0)));
            words.extend(words_line(*y, &["some", "body", "text"]));
        }
        let layout = PageLayoutBuilder::new(0, page())
            .words(words)
            .build(&LineLabelFormat::numeric());

        let labels: Vec<u32> = layout.label_blocks().iter().filter_map(|b| b.line_label).collect();
        assert_eq!(labels, vec![1, 2, 3]);
        let text: Vec<&TextBlock> = layout.text_blocks().collect();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].text, "some body text some body text some body text");
        assert_eq!(text[0].words.len(), 9);
        assert_eq!(layout.metrics().line_height, 12.0);
        assert_eq!(layout.metrics().first_top, 100.0);
        assert_eq!(layout.metrics().last_top, 124.0);
    }

    #[test]
    fn test_disabled_format_keeps_numbers_as_text() {
        let layout = PageLayoutBuilder::new(0, page())
            .block(TextBlock::new("12", Rect::new(20.0, 100.0, 10.0, 10.0)))
            .build(&LineLabelFormat::disabled());
        assert!(!layout.has_line_labels());
        assert!(!layout.is_empty());
    }

    #[test]
    fn test_metrics_from_block_tops() {
        let layout = PageLayoutBuilder::new(0, page())
            .block(TextBlock::new("a", Rect::new(100.0, 100.0, 300.0, 10.0)))
            .block(TextBlock::new("b", Rect::new(100.0, 114.0, 300.0, 10.0)))
            .block(TextBlock::new("c", Rect::new(100.0, 128.0, 300.0, 56.0)))
            .build(&LineLabelFormat::disabled());
        let m = layout.metrics();
        assert_eq!(m.line_height, 14.0);
        assert_eq!(m.first_top, 100.0);
        // Last block spans down to 184, so its last line starts at 170
        assert_eq!(m.last_top, 170.0);
    }

    #[test]
    fn test_plain_text_skips_labels() {
        let layout = PageLayoutBuilder::new(0, page())
            .block(TextBlock::new("Intro", Rect::new(100.0, 100.0, 300.0, 10.0)))
            .block(TextBlock::label(1, Rect::new(20.0, 100.0, 8.0, 10.0)))
            .block(TextBlock::new("Body", Rect::new(100.0, 114.0, 300.0, 10.0)))
            .build(&LineLabelFormat::disabled());
        assert_eq!(layout.plain_text(), "Intro\nBody");
    }

    #[test]
    fn test_metrics_ignore_word_baseline_jitter() {
        let mut words = Vec::new();
        for i in 0..10 {
            let y = 100.0 + 12.0 * i as f32;
            let mut line = words_line(y, &["plain", "italic", "plain"]);
            line[1].bbox.y += 1.0;
            words.extend(line);
        }
        let layout = PageLayoutBuilder::new(0, page())
            .words(words)
            .build(&LineLabelFormat::disabled());

        let m = layout.metrics();
        assert_eq!(m.line_height, 12.0);
        assert_eq!(m.first_top, 100.0);
        assert_eq!(m.last_top, 208.0);
        assert_eq!(m.estimated_line_count(), 10);
        assert_eq!(m.line_at(124.0), 3);
    }

    #[test]
    fn test_metrics_from_block_with_jittered_words() {
        let mut words = Vec::new();
        for i in 0..4 {
            let y = 300.0 + 14.0 * i as f32;
            let mut line = words_line(y, &["alpha", "beta"]);
            line[0].bbox.y -= 0.8;
            words.extend(line);
        }
        let block = TextBlock::from_words(words);
        let layout = PageLayoutBuilder::new(0, page())
            .block(block)
            .build(&LineLabelFormat::disabled());
        assert!((layout.metrics().line_height - 14.0).abs() < 1e-3);
        assert_eq!(layout.metrics().estimated_line_count(), 4);
    }

    #[test]
    fn test_line_at_clamps() {
        let m = LineMetrics {
            line_height: 12.0,
            first_top: 100.0,
            last_top: 100.0,
        };
        assert_eq!(m.estimated_line_count(), 1);
        assert_eq!(m.line_at(500.0), 1);
    }
}
