//! Pipeline configuration.
//!
//! One explicit [`PipelineConfig`] is built at startup and handed to the
//! pipeline entry point. Credentials are read once into [`Credentials`];
//! nothing downstream consults the environment again.

use crate::error::{Error, Result};
use crate::locator::LocatorConfig;
use crate::packager::PackagerConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which kind of document is being annotated.
///
/// Selects the rewrite prompt, the output document and the line-label format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Thesis colloquium: comments become examiner questions in a LaTeX letter
    #[default]
    Thesis,
    /// Paper review: comments become reviewer remarks in a Markdown review
    PeerReview,
}

impl DocumentKind {
    /// Hint passed to the rewrite collaborator.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Thesis => "thesis question",
            Self::PeerReview => "peer review comment",
        }
    }
}

/// Which language model API to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiChoice {
    /// First provider in priority order with usable credentials
    #[default]
    Auto,
    /// api.openai.com
    OpenAi,
    /// api.groq.com (OpenAI-compatible)
    Groq,
    /// Google Gemini `generateContent`
    Gemini,
    /// Local Ollama server (OpenAI-compatible)
    Ollama,
}

impl ApiChoice {
    /// Lowercase name used in logs, flags and environment variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

impl FromStr for ApiChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(Error::InvalidConfig(format!("unknown api choice '{}'", other))),
        }
    }
}

/// API credentials discovered at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// `OPENAI_API_KEY`
    pub openai_api_key: Option<String>,
    /// `GROQ_API_KEY`
    pub groq_api_key: Option<String>,
    /// `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`
    pub gemini_api_key: Option<String>,
    /// `OLLAMA_HOST` (e.g. `http://localhost:11434`)
    pub ollama_host: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Credentials {
    /// Read all known credential variables from the environment.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            groq_api_key: non_empty_var("GROQ_API_KEY"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY")
                .or_else(|| non_empty_var("GOOGLE_API_KEY")),
            ollama_host: non_empty_var("OLLAMA_HOST"),
        }
    }
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Which provider probes run; `Auto` walks the priority chain.
    pub api_choice: ApiChoice,

    /// Model override; each provider has its own default.
    pub model: Option<String>,

    /// Sampling temperature for rewrites.
    pub temperature: f32,

    /// Pace requests for free-tier rate limits (3 s apart, 10 s every 5th).
    pub rate_limit_enabled: bool,

    /// Thesis letter or peer review.
    pub document_kind: DocumentKind,

    /// Treat short "Quelle"/"source" remarks as missing-citation markers
    /// instead of rewriting them.
    pub ignore_source_comments: bool,

    /// Spatial search settings.
    pub locator: LocatorConfig,

    /// Context trimming and filtering.
    pub packager: PackagerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            api_choice: ApiChoice::Auto,
            model: None,
            temperature: 0.4,
            rate_limit_enabled: false,
            document_kind: DocumentKind::Thesis,
            ignore_source_comments: true,
            locator: LocatorConfig::default(),
            packager: PackagerConfig::default(),
        }
    }

    /// Defaults overridden by `PDF_REMARKS_API`, `PDF_REMARKS_MODEL`,
    /// `PDF_REMARKS_TEMPERATURE` and `PDF_REMARKS_RATE_LIMIT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        if let Some(api) = non_empty_var("PDF_REMARKS_API") {
            config.api_choice = api.parse()?;
        }
        config.model = non_empty_var("PDF_REMARKS_MODEL");
        if let Some(t) = non_empty_var("PDF_REMARKS_TEMPERATURE") {
            config = config.with_temperature(parse_temperature(&t)?);
        }
        if let Some(flag) = non_empty_var("PDF_REMARKS_RATE_LIMIT") {
            config.rate_limit_enabled = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(config)
    }

    /// Select the API.
    pub fn with_api_choice(mut self, choice: ApiChoice) -> Self {
        self.api_choice = choice;
        self
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature (clamped to 0.0..=2.0).
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Enable free-tier pacing.
    pub fn with_rate_limit(mut self, enable: bool) -> Self {
        self.rate_limit_enabled = enable;
        self
    }

    /// Select thesis or peer-review mode.
    pub fn with_document_kind(mut self, kind: DocumentKind) -> Self {
        self.document_kind = kind;
        self
    }

    /// Classify short source remarks separately.
    pub fn with_ignore_source_comments(mut self, ignore: bool) -> Self {
        self.ignore_source_comments = ignore;
        self
    }

    /// Replace the locator settings.
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    /// Replace the packager settings.
    pub fn with_packager(mut self, packager: PackagerConfig) -> Self {
        self.packager = packager;
        self
    }
}

/// Parse a temperature flag or variable.
pub fn parse_temperature(value: &str) -> Result<f32> {
    let t: f32 = value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("temperature '{}' is not a number", value)))?;
    if !(0.0..=2.0).contains(&t) {
        return Err(Error::InvalidConfig(format!("temperature {} outside 0.0..=2.0", t)));
    }
    Ok(t)
}
