//! Page layout model for annotation placement.
//!
//! This module turns extracted page content into an immutable [`PageLayout`]:
//! - Printed line-number detection ([`LineLabelFormat`])
//! - Clustering of loose words into lines and paragraph blocks
//! - Line metrics for interpolated line numbers

pub mod clustering;
pub mod line_labels;
pub mod page;

// Re-export main types
pub use line_labels::LineLabelFormat;
pub use page::{DEFAULT_LINE_HEIGHT, LineMetrics, PageLayout, PageLayoutBuilder, TextBlock, Word};
