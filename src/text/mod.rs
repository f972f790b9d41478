//! Text clean-up for anchors and paragraph context.
//!
//! Everything here is a pure character transform with no positional logic.

pub mod normalize;

pub use normalize::{collapse_whitespace, fold_compatibility, is_dash, normalize};
