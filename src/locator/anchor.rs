//! Anchor extraction inside a paragraph block.
//!
//! The anchor is always a byte span of the block text: either the
//! highlighted substring the source reported, or the run of words from the
//! first to the last word touched by the probe box.

use crate::geometry::{Rect, euclidean_distance};
use crate::layout::TextBlock;

/// A word of the block text with its (real or synthesized) box.
#[derive(Debug, Clone, PartialEq)]
pub struct WordSpan {
    /// Byte offset of the first character in the block text
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Word box
    pub bbox: Rect,
}

/// Whitespace-separated tokens with byte and char offsets.
struct Token {
    start: usize,
    end: usize,
    char_start: usize,
    char_end: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut char_pos = 0;

    for (byte_pos, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some((start, char_start)) = current.take() {
                tokens.push(Token {
                    start,
                    end: byte_pos,
                    char_start,
                    char_end: char_pos,
                });
            }
        } else if current.is_none() {
            current = Some((byte_pos, char_pos));
        }
        char_pos += 1;
    }
    if let Some((start, char_start)) = current {
        tokens.push(Token {
            start,
            end: text.len(),
            char_start,
            char_end: char_pos,
        });
    }
    tokens
}

/// Map the block's word boxes onto the block text.
///
/// Returns `None` when a word cannot be found in order, so the caller falls
/// back to synthesized boxes.
fn spans_from_word_boxes(block: &TextBlock) -> Option<Vec<WordSpan>> {
    if block.words.is_empty() {
        return None;
    }

    let mut spans = Vec::with_capacity(block.words.len());
    let mut cursor = 0;
    for word in &block.words {
        let needle = word.text.trim();
        if needle.is_empty() {
            continue;
        }
        let offset = block.text[cursor..].find(needle)?;
        let start = cursor + offset;
        let end = start + needle.len();
        spans.push(WordSpan {
            start,
            end,
            bbox: word.bbox,
        });
        cursor = end;
    }
    Some(spans)
}

/// Synthesize word boxes by proportional position.
///
/// The text is wrapped evenly over `round(height / line_height)` visual
/// lines; each word's horizontal extent is proportional to its character
/// offset within its line.
pub fn synthesize_word_spans(block: &TextBlock, line_height: f32) -> Vec<WordSpan> {
    let tokens = tokenize(&block.text);
    let Some(last) = tokens.last() else {
        return vec![];
    };

    let total_chars = last.char_end.max(1);
    let line_count = ((block.bbox.height / line_height.max(f32::EPSILON)).round() as usize)
        .clamp(1, tokens.len());
    let line_h = block.bbox.height / line_count as f32;

    let line_of = |t: &Token| ((t.char_start * line_count) / total_chars).min(line_count - 1);

    let mut spans = Vec::with_capacity(tokens.len());
    for line in 0..line_count {
        let members: Vec<&Token> = tokens.iter().filter(|t| line_of(t) == line).collect();
        let (Some(first), Some(last)) = (members.first(), members.last()) else {
            continue;
        };
        let line_start = first.char_start;
        let line_len = (last.char_end - line_start).max(1) as f32;
        let top = block.bbox.top() + line as f32 * line_h;

        for t in members {
            let x0 = block.bbox.left() + block.bbox.width * (t.char_start - line_start) as f32 / line_len;
            let x1 = block.bbox.left() + block.bbox.width * (t.char_end - line_start) as f32 / line_len;
            spans.push(WordSpan {
                start: t.start,
                end: t.end,
                bbox: Rect::from_points(x0, top, x1, top + line_h),
            });
        }
    }
    spans
}

/// Word spans of a block: real word boxes when usable, synthesized otherwise.
pub fn word_spans(block: &TextBlock, line_height: f32) -> Vec<WordSpan> {
    spans_from_word_boxes(block).unwrap_or_else(|| synthesize_word_spans(block, line_height))
}

/// Extract the anchor text for `probe` inside `block`.
///
/// Returns an empty string only when the block has no words at all.
pub fn extract_anchor<'a>(
    block: &'a TextBlock,
    probe: &Rect,
    highlighted: Option<&str>,
    line_height: f32,
) -> &'a str {
    if let Some(h) = highlighted.map(str::trim).filter(|h| !h.is_empty()) {
        if let Some(pos) = block.text.find(h) {
            return &block.text[pos..pos + h.len()];
        }
    }

    let spans = word_spans(block, line_height);
    let overlapping: Vec<&WordSpan> = spans.iter().filter(|s| s.bbox.intersects(probe)).collect();

    if let (Some(first), Some(last)) = (
        overlapping.iter().map(|s| s.start).min(),
        overlapping.iter().map(|s| s.end).max(),
    ) {
        return &block.text[first..last];
    }

    // No word overlaps: nearest word center, leftmost on ties
    let center = probe.center();
    let nearest = spans.iter().min_by(|a, b| {
        euclidean_distance(&a.bbox.center(), &center)
            .total_cmp(&euclidean_distance(&b.bbox.center(), &center))
            .then(a.bbox.left().total_cmp(&b.bbox.left()))
    });
    match nearest {
        Some(span) => &block.text[span.start..span.end],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Word;

    fn block_with_words() -> TextBlock {
        let words = vec![
            Word::new("The", Rect::new(100.0, 100.0, 20.0, 10.0)),
            Word::new("quick", Rect::new(124.0, 100.0, 30.0, 10.0)),
            Word::new("brown", Rect::new(158.0, 100.0, 30.0, 10.0)),
            Word::new("fox", Rect::new(192.0, 100.0, 20.0, 10.0)),
        ];
        TextBlock::from_words(words)
    }

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("  Maß  nahme ");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].start, 2);
        assert_eq!(tokens[0].end, 6);
        assert_eq!(tokens[0].char_end, 5);
        assert_eq!(tokens[1].char_start, 7);
    }

    #[test]
    fn test_anchor_spans_overlapping_words() {
        let block = block_with_words();
        let probe = Rect::new(130.0, 101.0, 40.0, 5.0);
        assert_eq!(extract_anchor(&block, &probe, None, 12.0), "quick brown");
    }

    #[test]
    fn test_anchor_prefers_highlighted_substring() {
        let block = block_with_words();
        let probe = Rect::new(100.0, 100.0, 5.0, 5.0);
        assert_eq!(extract_anchor(&block, &probe, Some(" brown fox "), 12.0), "brown fox");
        // Unknown highlight falls back to geometry
        assert_eq!(extract_anchor(&block, &probe, Some("lazy dog"), 12.0), "The");
    }

    #[test]
    fn test_anchor_nearest_word_when_nothing_overlaps() {
        let block = block_with_words();
        // Below the line, closest to "fox"
        let probe = Rect::new(200.0, 115.0, 4.0, 4.0);
        assert_eq!(extract_anchor(&block, &probe, None, 12.0), "fox");
    }

    #[test]
    fn test_synthesized_spans_two_lines() {
        let block = TextBlock::new("aaaa bbbb cccc dddd", Rect::new(0.0, 0.0, 100.0, 24.0));
        let spans = synthesize_word_spans(&block, 12.0);
        assert_eq!(spans.len(), 4);
        // First two words on the first visual line, the rest on the second
        assert_eq!(spans[0].bbox.top(), 0.0);
        assert_eq!(spans[1].bbox.top(), 0.0);
        assert_eq!(spans[2].bbox.top(), 12.0);
        assert_eq!(spans[0].bbox.left(), 0.0);
        assert!((spans[1].bbox.right() - 100.0).abs() < 1e-3);

        let probe = Rect::new(60.0, 14.0, 30.0, 4.0);
        assert_eq!(extract_anchor(&block, &probe, None, 12.0), "dddd");
    }

    #[test]
    fn test_mismatched_word_boxes_fall_back() {
        let block = TextBlock::new("alpha beta", Rect::new(0.0, 0.0, 100.0, 12.0))
            .with_words(vec![Word::new("gamma", Rect::new(0.0, 0.0, 40.0, 12.0))]);
        let spans = word_spans(&block, 12.0);
        assert_eq!(spans.len(), 2);
        assert_eq!(&block.text[spans[1].start..spans[1].end], "beta");
    }

    #[test]
    fn test_empty_block() {
        let block = TextBlock::new("   ", Rect::new(0.0, 0.0, 100.0, 12.0));
        assert_eq!(extract_anchor(&block, &Rect::new(0.0, 0.0, 10.0, 10.0), None, 12.0), "");
    }
}
