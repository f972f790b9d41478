//! Grouping of loose word cells into lines and paragraph blocks.
//!
//! Some extraction dumps only carry word boxes. These are grouped in two
//! passes: words into lines (similar top, horizontally connected, never
//! across a column gap) and lines into paragraphs (small vertical gap,
//! horizontally overlapping).

use crate::geometry::Rect;
use crate::layout::page::Word;

/// Horizontal distance beyond which two words belong to different columns.
const COLUMN_GAP_THRESHOLD: f32 = 50.0;

/// Paragraph break when the gap between line tops exceeds this multiple of
/// the regular line spacing.
const PARAGRAPH_GAP_FACTOR: f32 = 1.6;

/// A clustered line: word indices left-to-right plus their bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct WordLine {
    /// Indices into the clustered word slice, sorted by x
    pub words: Vec<usize>,
    /// Union of the word boxes
    pub bbox: Rect,
}

/// Cluster words into lines using column-aware top-coordinate grouping.
///
/// Words whose tops differ by at most `epsilon_y` and whose horizontal
/// distance is below the column gap end up on the same line.
///
/// # Returns
///
/// One [`WordLine`] per line, sorted top-to-bottom then left-to-right.
///
/// # Examples
///
/// ```
/// use pdf_remarks::geometry::Rect;
/// use pdf_remarks::layout::Word;
/// use pdf_remarks::layout::clustering::cluster_words_into_lines;
///
/// let words = vec![
///     Word::new("world", Rect::new(40.0, 101.0, 30.0, 10.0)),
///     Word::new("Hello", Rect::new(5.0, 100.0, 30.0, 10.0)),
///     Word::new("next", Rect::new(5.0, 114.0, 20.0, 10.0)),
/// ];
/// let lines = cluster_words_into_lines(&words, 3.0);
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].words, vec![1, 0]);
/// ```
pub fn cluster_words_into_lines(words: &[Word], epsilon_y: f32) -> Vec<WordLine> {
    if words.is_empty() {
        return vec![];
    }

    let mut lines: Vec<WordLine> = vec![];
    let mut assigned = vec![false; words.len()];

    for i in 0..words.len() {
        if assigned[i] {
            continue;
        }

        let mut cluster = vec![i];
        assigned[i] = true;

        // BFS over horizontally connected words at the same top
        let mut j = 0;
        while j < cluster.len() {
            let current = &words[cluster[j]];

            for k in 0..words.len() {
                if assigned[k] {
                    continue;
                }
                let other = &words[k];

                if (current.bbox.top() - other.bbox.top()).abs() > epsilon_y {
                    continue;
                }

                let x_dist = (current.bbox.right() - other.bbox.left())
                    .abs()
                    .min((other.bbox.right() - current.bbox.left()).abs());

                if x_dist < COLUMN_GAP_THRESHOLD {
                    cluster.push(k);
                    assigned[k] = true;
                }
            }

            j += 1;
        }

        cluster.sort_by(|&a, &b| words[a].bbox.left().total_cmp(&words[b].bbox.left()));
        let bbox = cluster
            .iter()
            .skip(1)
            .fold(words[cluster[0]].bbox, |acc, &idx| acc.union(&words[idx].bbox));
        lines.push(WordLine {
            words: cluster,
            bbox,
        });
    }

    lines.sort_by(|a, b| {
        a.bbox
            .top()
            .total_cmp(&b.bbox.top())
            .then(a.bbox.left().total_cmp(&b.bbox.left()))
    });

    log::debug!("Clustered {} words into {} lines", words.len(), lines.len());
    lines
}

/// Group lines (sorted top-to-bottom) into paragraph blocks.
///
/// A line joins the open paragraph whose last line sits at most
/// `1.6 × line_spacing` above it and overlaps it horizontally. Otherwise it
/// starts a new paragraph.
///
/// # Returns
///
/// Paragraphs as vectors of line indices, in order of their first line.
pub fn cluster_lines_into_blocks(lines: &[WordLine], line_spacing: f32) -> Vec<Vec<usize>> {
    let max_gap = line_spacing * PARAGRAPH_GAP_FACTOR;
    let mut blocks: Vec<Vec<usize>> = vec![];

    for (idx, line) in lines.iter().enumerate() {
        let target = blocks.iter_mut().rev().find(|block| {
            let last = &lines[block[block.len() - 1]];
            let gap = line.bbox.top() - last.bbox.top();
            let overlaps = line.bbox.left() < last.bbox.right() && line.bbox.right() > last.bbox.left();
            gap > 0.0 && gap <= max_gap && overlaps
        });

        match target {
            Some(block) => block.push(idx),
            None => blocks.push(vec![idx]),
        }
    }

    blocks
}

/// Median of positive gaps (> 0.5 units) between consecutive sorted values.
///
/// Returns `None` when no such gap exists.
pub fn median_gap(values: &[f32]) -> Option<f32> {
    let mut sorted: Vec<f32> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut gaps: Vec<f32> = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&gap| gap > 0.5)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(|a, b| a.total_cmp(b));
    Some(gaps[gaps.len() / 2])
}

/// Collapse word tops into line tops.
///
/// Sorted tops within `tolerance` of the first top of the current run
/// belong to one line; each line is represented by its smallest top.
///
/// # Examples
///
/// ```
/// use pdf_remarks::layout::clustering::merge_line_tops;
///
/// let tops = [113.0, 100.0, 112.0, 101.0, 124.0, 125.0];
/// assert_eq!(merge_line_tops(&tops, 5.0), vec![100.0, 112.0, 124.0]);
/// ```
pub fn merge_line_tops(tops: &[f32], tolerance: f32) -> Vec<f32> {
    let mut sorted: Vec<f32> = tops.iter().copied().filter(|t| t.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut lines: Vec<f32> = Vec::new();
    for top in sorted {
        match lines.last() {
            Some(&start) if top - start <= tolerance => {},
            _ => lines.push(top),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f32, y: f32) -> Word {
        Word::new(text, Rect::new(x, y, 8.0 * text.len() as f32, 10.0))
    }

    #[test]
    fn test_empty() {
        assert!(cluster_words_into_lines(&[], 3.0).is_empty());
        assert!(cluster_lines_into_blocks(&[], 12.0).is_empty());
    }

    #[test]
    fn test_column_gap_splits_line() {
        let words = vec![
            word("left", 10.0, 100.0),
            word("column", 50.0, 100.0),
            word("right", 300.0, 100.0),
        ];
        let lines = cluster_words_into_lines(&words, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].words, vec![0, 1]);
        assert_eq!(lines[1].words, vec![2]);
    }

    #[test]
    fn test_paragraph_break_on_large_gap() {
        let words = vec![
            word("one", 10.0, 100.0),
            word("two", 10.0, 112.0),
            word("three", 10.0, 124.0),
            word("four", 10.0, 160.0),
        ];
        let lines = cluster_words_into_lines(&words, 3.0);
        assert_eq!(lines.len(), 4);
        let blocks = cluster_lines_into_blocks(&lines, 12.0);
        assert_eq!(blocks, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_lines_in_different_columns_stay_apart() {
        let words = vec![
            word("a", 10.0, 100.0),
            word("b", 300.0, 100.0),
            word("c", 10.0, 112.0),
            word("d", 300.0, 112.0),
        ];
        let lines = cluster_words_into_lines(&words, 3.0);
        let blocks = cluster_lines_into_blocks(&lines, 12.0);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].len(), 2);
        assert_eq!(blocks[1].len(), 2);
    }

    #[test]
    fn test_median_gap() {
        assert_eq!(median_gap(&[100.0, 112.0, 124.0, 160.0]), Some(12.0));
        assert_eq!(median_gap(&[100.0, 100.2]), None);
        assert_eq!(median_gap(&[]), None);
    }

    #[test]
    fn test_merge_line_tops_absorbs_baseline_jitter() {
        let mut tops = Vec::new();
        for i in 0..10 {
            let y = 100.0 + 12.0 * i as f32;
            tops.extend([y, y + 1.0, y + 0.5]);
        }
        let lines = merge_line_tops(&tops, 5.0);
        assert_eq!(lines.len(), 10);
        assert_eq!(median_gap(&lines), Some(12.0));
        // Raw word tops would report the jitter as the spacing
        assert!(median_gap(&tops).unwrap() < 2.0);
    }

    #[test]
    fn test_merge_line_tops_empty() {
        assert!(merge_line_tops(&[], 5.0).is_empty());
    }
}
