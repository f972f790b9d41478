// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Remarks
//!
//! Turns margin annotations in academic PDFs into polished feedback: examiner
//! questions for a thesis colloquium letter, or comments for a peer review.
//!
//! ## Core Features
//!
//! - **Annotation Locator**: places every annotation in its paragraph, extracts
//!   the anchored words and assigns a printed or interpolated line number
//! - **Context Packager**: deduplicates remarks and trims paragraph context
//!   without cutting words
//! - **Rewriting**: OpenAI, Groq, Gemini and Ollama behind one provider trait,
//!   chosen from the available credentials, with optional free-tier pacing
//! - **Documents**: KOMA-Script colloquium letter (LaTeX) and Markdown review
//!
//! ## Architecture
//!
//! ```text
//! source → layout → locator → packager → rewrite → converters
//! ```
//!
//! Text layout is read from an extraction dump; annotations from the same dump
//! or straight from the PDF. Coordinates are top-left origin page space.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_remarks::config::{Credentials, PipelineConfig};
//! use pdf_remarks::pipeline::AnnotationPipeline;
//! use pdf_remarks::rewrite::select_provider;
//! use pdf_remarks::source::ExtractedDocument;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = ExtractedDocument::load(Path::new("thesis.json"))?;
//! let config = PipelineConfig::from_env()?;
//! let provider = select_provider(&config, &Credentials::from_env())?;
//!
//! let pipeline = AnnotationPipeline::new(config);
//! let output = pipeline.run_colloquium(&doc, provider.as_ref(), Path::new("out"), false)?;
//! println!("{}", output.tex_path.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry and text normalization
pub mod geometry;
pub mod text;

// Page layout and annotations
pub mod annotations;
pub mod layout;

// Input boundary (extraction dump, PDF annotations)
pub mod source;

// Placement and packaging
pub mod locator;
pub mod packager;

// Language model rewriting
pub mod rewrite;

// Output documents
pub mod converters;

// End-to-end runs
pub mod pipeline;

// Re-exports
pub use annotations::{AnnotationCategory, AnnotationSubtype, CategoryStats, RawAnnotation};
pub use config::{ApiChoice, Credentials, DocumentKind, PipelineConfig};
pub use error::{Error, LocateError, Result};
pub use locator::{Confidence, Locator, ResolvedAnnotation};
pub use packager::{ContextPackager, RewriteRequest};
pub use pipeline::AnnotationPipeline;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_remarks");
    }
}
