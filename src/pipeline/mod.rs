//! End-to-end runs from an extraction dump to a finished document.
//!
//! ```text
//! ExtractedDocument
//!     ↓
//! [PageLayout] + [RawAnnotation]   (source)
//!     ↓
//! ResolvedAnnotation               (locator)
//!     ↓
//! RewriteRequest                   (packager)
//!     ↓
//! RewrittenComment                 (rewrite, via LlmProvider)
//!     ↓
//! LaTeX letter | Markdown review   (converters)
//! ```
//!
//! All layouts are built before the first annotation is resolved, and the
//! language model is only called once every remark is packaged.

use crate::annotations::CategoryStats;
use crate::config::{DocumentKind, PipelineConfig};
use crate::converters::{
    ColloquiumLetter, DEFAULT_LATEX_ENGINE, ReviewDocument, compile_latex, concatenate_questions,
    escape_for_latex, summary_with_remarks,
};
use crate::error::{LocateError, Result};
use crate::layout::{LineLabelFormat, PageLayout};
use crate::locator::Locator;
use crate::packager::{ContextPackager, RewriteRequest};
use crate::rewrite::{
    CommentRewriter, DocumentAssistant, Language, LlmProvider, RateLimited, RateLimiter, Rewriter,
    RewrittenComment, ThesisMetadata,
};
use crate::source::ExtractedDocument;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Everything known before the language model is involved.
#[derive(Debug, Clone)]
pub struct PreparedFeedback {
    /// Rewrite requests in page and line order
    pub requests: Vec<RewriteRequest>,
    /// Annotations that could not be placed
    pub failures: Vec<LocateError>,
    /// Source and language remark counts
    pub stats: CategoryStats,
    /// Layout of every page
    pub layouts: Vec<PageLayout>,
}

/// Result of a colloquium run.
#[derive(Debug, Clone)]
pub struct ColloquiumOutput {
    /// The written `.tex` file
    pub tex_path: PathBuf,
    /// The compiled PDF, when compilation ran and succeeded
    pub pdf_path: Option<PathBuf>,
    /// Detected document language
    pub language: Language,
    /// Title page metadata
    pub metadata: ThesisMetadata,
    /// Questions as they appear in the letter
    pub comments: Vec<RewrittenComment>,
    /// When the letter was generated
    pub generated_at: DateTime<Local>,
}

/// Orchestrates locating, packaging, rewriting and document assembly.
#[derive(Debug, Clone, Default)]
pub struct AnnotationPipeline {
    config: PipelineConfig,
    locator: Locator,
    packager: ContextPackager,
}

impl AnnotationPipeline {
    /// Create a pipeline.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            locator: Locator::new(config.locator),
            packager: ContextPackager::new(config.packager),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Locate and package every annotation for the configured document kind.
    pub fn prepare(&self, doc: &ExtractedDocument) -> PreparedFeedback {
        self.prepare_for(doc, self.config.document_kind)
    }

    fn prepare_for(&self, doc: &ExtractedDocument, kind: DocumentKind) -> PreparedFeedback {
        let format = LineLabelFormat::for_document(kind);
        let (layouts, annotations, stats) = doc.into_parts(&format, self.config.ignore_source_comments);

        let mut resolved = Vec::with_capacity(annotations.len());
        let mut failures = Vec::new();
        for result in self.locator.resolve_all(&annotations, &layouts) {
            match result {
                Ok(annotation) => resolved.push(annotation),
                Err(e) => failures.push(e),
            }
        }

        let requests = self.packager.package(&resolved, kind);
        log::info!(
            "Prepared {} rewrite requests ({} annotations could not be placed)",
            requests.len(),
            failures.len()
        );
        PreparedFeedback {
            requests,
            failures,
            stats,
            layouts,
        }
    }

    /// Rewrite every request in order.
    ///
    /// A failed or empty rewrite keeps the raw comment (LaTeX-escaped for
    /// theses) so no remark is lost.
    pub fn rewrite_all(&self, requests: &[RewriteRequest], rewriter: &dyn Rewriter) -> Vec<RewrittenComment> {
        requests
            .iter()
            .enumerate()
            .map(|(i, request)| {
                log::info!("Rewriting comment {}/{}", i + 1, requests.len());
                let text = match rewriter.rewrite(request) {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => {
                        log::warn!("Empty rewrite for annotation #{}, keeping raw comment", request.order);
                        raw_text(request)
                    },
                    Err(e) => {
                        log::warn!("Rewrite of annotation #{} failed: {}", request.order, e);
                        raw_text(request)
                    },
                };
                RewrittenComment {
                    request: request.clone(),
                    text,
                }
            })
            .collect()
    }

    /// Wrap the provider in the rate limiter when pacing is enabled.
    fn paced<'a>(&self, provider: &'a dyn LlmProvider) -> Box<dyn LlmProvider + 'a> {
        if self.config.rate_limit_enabled {
            Box::new(RateLimited::new(provider, RateLimiter::new(true)))
        } else {
            Box::new(provider)
        }
    }

    /// Write `review_comments_<file_stem>.md` into `output_dir`.
    pub fn run_review(
        &self,
        doc: &ExtractedDocument,
        provider: &dyn LlmProvider,
        output_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf> {
        let prepared = self.prepare_for(doc, DocumentKind::PeerReview);
        let provider = self.paced(provider);
        let rewriter = CommentRewriter::new(&*provider);
        let comments = self.rewrite_all(&prepared.requests, &rewriter);

        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("review_comments_{}.md", file_stem));
        ReviewDocument::from_comments(&comments).write_to(&path)?;
        Ok(path)
    }

    /// Write the colloquium letter into `output_dir` and optionally compile it.
    ///
    /// Language detection, summary and metadata fall back to defaults when
    /// the provider fails; a failed compilation leaves `pdf_path` empty.
    pub fn run_colloquium(
        &self,
        doc: &ExtractedDocument,
        provider: &dyn LlmProvider,
        output_dir: &Path,
        compile: bool,
    ) -> Result<ColloquiumOutput> {
        let prepared = self.prepare_for(doc, DocumentKind::Thesis);
        let provider = self.paced(provider);
        let rewriter = CommentRewriter::new(&*provider);
        let comments = self.rewrite_all(&prepared.requests, &rewriter);

        let assistant = DocumentAssistant::new(&*provider);
        let language = assistant.detect_language(&comments).unwrap_or_else(|e| {
            log::warn!("Language detection failed: {}", e);
            Language::default()
        });
        let pages = doc.page_texts();
        let summary = assistant.summarize(&pages, language).unwrap_or_else(|e| {
            log::warn!("Summary failed: {}", e);
            String::new()
        });
        let metadata = assistant.extract_metadata(&pages, language).unwrap_or_else(|e| {
            log::warn!("Metadata extraction failed: {}", e);
            ThesisMetadata::default()
        });

        let letter = ColloquiumLetter::from_metadata(
            &metadata,
            summary_with_remarks(&summary, &prepared.stats),
            concatenate_questions(&comments, language),
        );

        std::fs::create_dir_all(output_dir)?;
        let tex_path = output_dir.join(letter_file_name(&metadata));
        letter.write_to(&tex_path)?;

        let pdf_path = if compile {
            match compile_latex(&tex_path, Some(output_dir), DEFAULT_LATEX_ENGINE) {
                Ok(pdf) => {
                    log::info!("PDF created: {}", pdf.display());
                    Some(pdf)
                },
                Err(e) => {
                    log::warn!("{}", e);
                    None
                },
            }
        } else {
            None
        };

        Ok(ColloquiumOutput {
            tex_path,
            pdf_path,
            language,
            metadata,
            comments,
            generated_at: Local::now(),
        })
    }
}

fn raw_text(request: &RewriteRequest) -> String {
    match request.kind {
        DocumentKind::Thesis => escape_for_latex(&request.raw_comment, true),
        DocumentKind::PeerReview => request.raw_comment.clone(),
    }
}

/// `bewertung_brief_<matriculation>.tex`, with `unknown` when missing.
pub fn letter_file_name(metadata: &ThesisMetadata) -> String {
    let id: String = metadata
        .matriculation_number
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let id = if id.is_empty() { "unknown" } else { id.as_str() };
    format!("bewertung_brief_{}.tex", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::locator::Confidence;

    struct Broken;

    impl Rewriter for Broken {
        fn rewrite(&self, _request: &RewriteRequest) -> Result<String> {
            Err(Error::Provider {
                provider: "test".to_string(),
                message: "HTTP 500".to_string(),
            })
        }
    }

    fn request(kind: DocumentKind, raw: &str) -> RewriteRequest {
        RewriteRequest {
            order: 0,
            page: 0,
            line_number: 1,
            anchor_text: "x".to_string(),
            paragraph_context: "x".to_string(),
            raw_comment: raw.to_string(),
            kind,
            confidence: Confidence::Estimated,
        }
    }

    #[test]
    fn test_failed_rewrite_keeps_raw_comment() {
        let pipeline = AnnotationPipeline::default();
        let out = pipeline.rewrite_all(
            &[request(DocumentKind::Thesis, "100% sicher?"), request(DocumentKind::PeerReview, "100%?")],
            &Broken,
        );
        assert_eq!(out[0].text, "100\\% sicher?");
        assert_eq!(out[1].text, "100%?");
    }

    #[test]
    fn test_letter_file_name() {
        let mut meta = ThesisMetadata::default();
        assert_eq!(letter_file_name(&meta), "bewertung_brief_unknown.tex");
        meta.matriculation_number = Some("11 123/456".to_string());
        assert_eq!(letter_file_name(&meta), "bewertung_brief_11123456.tex");
    }

    #[test]
    fn test_prepare_empty_document() {
        let prepared = AnnotationPipeline::default().prepare(&ExtractedDocument::default());
        assert!(prepared.requests.is_empty());
        assert!(prepared.failures.is_empty());
        assert!(prepared.layouts.is_empty());
    }
}
