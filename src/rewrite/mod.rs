//! Rewrite layer: turns terse remarks into polite questions or comments.
//!
//! The pipeline only depends on [`Rewriter`], a single rewrite operation.
//! [`CommentRewriter`] implements it on top of any [`LlmProvider`]; the
//! provider is chosen once at startup by [`select_provider`].

pub mod assistant;
pub mod prompt;
pub mod provider;
pub mod rate_limit;
pub mod selection;

pub use assistant::{DocumentAssistant, Language, ThesisMetadata};
pub use provider::{Gemini, OpenAiCompatible};
pub use rate_limit::RateLimiter;
pub use selection::select_provider;

use crate::config::DocumentKind;
use crate::converters::escape_for_latex;
use crate::error::Result;
use crate::packager::RewriteRequest;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A language model that completes a single prompt.
pub trait LlmProvider {
    /// Provider name (`groq`, `openai`, ...)
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Send `prompt` and return the reply text.
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<P: LlmProvider + ?Sized> LlmProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

impl<P: LlmProvider + ?Sized> LlmProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// The rewrite collaborator contract.
pub trait Rewriter {
    /// Rewrite one packaged remark.
    fn rewrite(&self, request: &RewriteRequest) -> Result<String>;
}

/// A rewritten remark with the request it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenComment {
    /// The packaged request
    pub request: RewriteRequest,
    /// Rewritten text, or the raw comment when rewriting failed
    pub text: String,
}

/// Paces every call of the wrapped provider with a [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimited<P> {
    inner: P,
    limiter: Mutex<RateLimiter>,
}

impl<P: LlmProvider> RateLimited<P> {
    /// Wrap a provider.
    pub fn new(inner: P, limiter: RateLimiter) -> Self {
        Self {
            inner,
            limiter: Mutex::new(limiter),
        }
    }
}

impl<P: LlmProvider> LlmProvider for RateLimited<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .wait();
        self.inner.complete(prompt)
    }
}

/// [`Rewriter`] backed by a language model provider.
#[derive(Debug)]
pub struct CommentRewriter<P> {
    provider: P,
}

impl<P: LlmProvider> CommentRewriter<P> {
    /// Create a rewriter.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: LlmProvider> Rewriter for CommentRewriter<P> {
    fn rewrite(&self, request: &RewriteRequest) -> Result<String> {
        let reply = self.provider.complete(&prompt::rewrite_prompt(request))?;
        let reply = reply.trim();
        Ok(match request.kind {
            DocumentKind::Thesis => escape_for_latex(reply, true),
            DocumentKind::PeerReview => reply.to_string(),
        })
    }
}
