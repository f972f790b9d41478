//! Line numbers for annotation positions.

use crate::layout::PageLayout;
use serde::{Deserialize, Serialize};

/// Where a line number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSource {
    /// Read from a printed margin label
    Printed,
    /// Interpolated from page geometry
    Interpolated,
}

/// Line number of a vertical position on a page.
///
/// With printed labels this is the label of the last label block whose top
/// is at or above `top + line_height / 2` (the first label when the position
/// lies above all of them). Otherwise the number is interpolated from the
/// page's line metrics and clamped to its estimated line range.
pub fn line_number_at(layout: &PageLayout, top: f32) -> (u32, LineSource) {
    let metrics = layout.metrics();
    let labels = layout.label_blocks();

    if let Some(first) = labels.first() {
        let threshold = top + metrics.line_height / 2.0;
        let label = labels
            .iter()
            .take_while(|b| b.bbox.top() <= threshold)
            .last()
            .unwrap_or(first);
        if let Some(value) = label.line_label {
            return (value, LineSource::Printed);
        }
    }

    (metrics.line_at(top), LineSource::Interpolated)
}
