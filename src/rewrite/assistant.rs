//! Document-level language model tasks for the colloquium letter.
//!
//! Besides rewriting single remarks, the letter needs the document language,
//! a short summary and the title page metadata.

use crate::converters::escape_for_latex;
use crate::error::Result;
use crate::rewrite::{LlmProvider, RewrittenComment, prompt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pages used for the summary.
pub const SUMMARY_PAGES: usize = 10;

/// Pages used for metadata extraction.
pub const METADATA_PAGES: usize = 2;

/// Rewritten comments sampled for language detection.
pub const LANGUAGE_SAMPLE_SIZE: usize = 3;

/// Document language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// German
    #[default]
    German,
    /// English
    English,
}

impl Language {
    /// English name of the language, as used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::German => "German",
            Self::English => "English",
        }
    }

    /// Word for "page" in this language.
    pub fn page_label(&self) -> &'static str {
        match self {
            Self::German => "Seite",
            Self::English => "page",
        }
    }

    /// Interpret a one-word model reply; anything not recognizably English
    /// counts as German.
    pub fn from_reply(reply: &str) -> Self {
        let lower = reply.to_lowercase();
        if lower.contains("english") || lower.contains("englisch") {
            Self::English
        } else {
            Self::German
        }
    }
}

/// Title page metadata of a thesis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThesisMetadata {
    /// Author's full name
    pub author: Option<String>,
    /// Matriculation number
    pub matriculation_number: Option<String>,
    /// Thesis title
    pub title: Option<String>,
    /// First examiner, full name with titles
    pub first_examiner: Option<String>,
    /// First examiner's christian name
    pub first_examiner_christian: Option<String>,
    /// First examiner's family name
    pub first_examiner_family: Option<String>,
    /// Second examiner
    pub second_examiner: Option<String>,
    /// `Bachelor` or `Master`
    pub bachelor_master: Option<String>,
}

fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ThesisMetadata {
    /// Parse a model reply, tolerating code fences, surrounding prose and
    /// numbers where strings are expected. Unparsable replies yield defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::rewrite::ThesisMetadata;
    ///
    /// let reply = "```json\n{\"author\": \"Erika Muster\", \"matriculation_number\": 1234567}\n```";
    /// let meta = ThesisMetadata::from_reply(reply);
    /// assert_eq!(meta.author.as_deref(), Some("Erika Muster"));
    /// assert_eq!(meta.matriculation_number.as_deref(), Some("1234567"));
    /// assert!(meta.title.is_none());
    /// ```
    pub fn from_reply(reply: &str) -> Self {
        let json_str = match (reply.find('{'), reply.rfind('}')) {
            (Some(start), Some(end)) if start < end => &reply[start..=end],
            _ => {
                log::warn!("Metadata reply contains no JSON object");
                return Self::default();
            },
        };

        let value: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Could not parse metadata JSON: {}", e);
                return Self::default();
            },
        };

        let field = |key: &str| value_as_string(value.get(key));
        Self {
            author: field("author"),
            matriculation_number: field("matriculation_number"),
            title: field("title"),
            first_examiner: field("first_examiner"),
            first_examiner_christian: field("first_examiner_christian"),
            first_examiner_family: field("first_examiner_family"),
            second_examiner: field("second_examiner"),
            bachelor_master: field("bachelor_master"),
        }
    }
}

/// Runs the document-level tasks on a provider.
#[derive(Debug)]
pub struct DocumentAssistant<P> {
    provider: P,
}

impl<P: LlmProvider> DocumentAssistant<P> {
    /// Create an assistant.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Detect the language from a few rewritten comments.
    ///
    /// Without comments no request is made and German is assumed.
    pub fn detect_language(&self, comments: &[RewrittenComment]) -> Result<Language> {
        let sample: Vec<&str> = comments
            .iter()
            .take(LANGUAGE_SAMPLE_SIZE)
            .map(|c| c.text.as_str())
            .collect();
        if sample.is_empty() {
            return Ok(Language::default());
        }

        let reply = self.provider.complete(&prompt::language_prompt(&sample.join("\n")))?;
        let language = Language::from_reply(&reply);
        log::info!("Detected document language: {}", language.as_str());
        Ok(language)
    }

    /// LaTeX-formatted summary of the first pages.
    pub fn summarize(&self, pages: &[String], language: Language) -> Result<String> {
        let text = pages.iter().take(SUMMARY_PAGES).cloned().collect::<Vec<_>>().join("\n\n");
        let reply = self.provider.complete(&prompt::summary_prompt(&text, language.as_str()))?;
        Ok(escape_for_latex(reply.trim(), true))
    }

    /// Title page metadata from the first pages.
    pub fn extract_metadata(&self, pages: &[String], language: Language) -> Result<ThesisMetadata> {
        let text = pages.iter().take(METADATA_PAGES).cloned().collect::<Vec<_>>().join("\n\n");
        let reply = self.provider.complete(&prompt::metadata_prompt(&text, language.as_str()))?;
        Ok(ThesisMetadata::from_reply(&reply))
    }
}
