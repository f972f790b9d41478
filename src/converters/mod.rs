//! Output documents built from rewritten remarks.
//!
//! - **LaTeX**: the colloquium letter to the examination board, plus the
//!   escaping used for every model reply that ends up in it
//! - **Markdown**: the peer review sent to the authors
//!
//! # Examples
//!
//! ```
//! use pdf_remarks::converters::escape_for_latex;
//!
//! assert_eq!(escape_for_latex("Straße 5 & 6", true), "Stra{\\ss}e 5 \\& 6");
//! ```

pub mod latex;
pub mod markdown;

pub use latex::{
    ColloquiumLetter, DEFAULT_LATEX_ENGINE, compile_latex, concatenate_questions, escape_for_latex,
    summary_with_remarks,
};
pub use markdown::{ReviewDocument, ReviewEntry};
