//! HTTP language model providers.
//!
//! Two wire formats cover every supported API: the OpenAI chat-completions
//! format (OpenAI, Groq and Ollama) and Google's `generateContent`.

use crate::error::{Error, Result};
use crate::rewrite::LlmProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for a single completion.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// OpenAI chat-completions endpoint.
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Gemini API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model per provider.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default Groq model.
pub const GROQ_DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
/// Default Gemini model.
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default Ollama model.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.1";

fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn provider_error(provider: &str, message: impl Into<String>) -> Error {
    Error::Provider {
        provider: provider.to_string(),
        message: message.into(),
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Send a JSON request and return the body of a 2xx response.
fn send_json(provider: &str, request: reqwest::blocking::RequestBuilder) -> Result<String> {
    let response = request
        .header("Content-Type", "application/json")
        .send()
        .map_err(|e| provider_error(provider, e.to_string()))?;

    let status = response.status();
    let body = response.text().unwrap_or_default();
    if !status.is_success() {
        return Err(provider_error(provider, format!("HTTP {}: {}", status, excerpt(&body))));
    }
    Ok(body)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a chat-completions response body.
pub fn parse_chat_response(provider: &str, body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| provider_error(provider, "response contained no choices"))
}

/// A provider speaking the OpenAI chat-completions format.
#[derive(Debug, Clone)]
pub struct OpenAiCompatible {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

impl OpenAiCompatible {
    /// Create a provider for any chat-completions endpoint.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            temperature: 0.4,
            client: http_client()?,
        })
    }

    /// api.openai.com
    pub fn openai(api_key: impl Into<String>) -> Result<Self> {
        Self::new("openai", OPENAI_ENDPOINT, Some(api_key.into()), OPENAI_DEFAULT_MODEL)
    }

    /// api.groq.com
    pub fn groq(api_key: impl Into<String>) -> Result<Self> {
        Self::new("groq", GROQ_ENDPOINT, Some(api_key.into()), GROQ_DEFAULT_MODEL)
    }

    /// Local Ollama server, e.g. `localhost:11434` or `http://gpu-box:11434`.
    pub fn ollama(host: &str) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Self::new("ollama", format!("{}/v1/chat/completions", base), None, OLLAMA_DEFAULT_MODEL)
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Chat-completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LlmProvider for OpenAiCompatible {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        log::debug!("{}: sending {} prompt chars to {}", self.name, prompt.len(), self.model);
        let body = send_json(&self.name, builder)?;
        parse_chat_response(&self.name, &body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Join the text parts of the first candidate of a `generateContent` body.
pub fn parse_gemini_response(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(provider_error("gemini", "response contained no candidates"));
    }
    Ok(text.to_string())
}

/// Google Gemini through the `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

impl Gemini {
    /// Create a provider with the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            model: GEMINI_DEFAULT_MODEL.to_string(),
            temperature: 0.4,
            client: http_client()?,
        })
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model)
    }
}

impl LlmProvider for Gemini {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
            },
        };

        let builder = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request);

        log::debug!("gemini: sending {} prompt chars to {}", prompt.len(), self.model);
        let body = send_json("gemini", builder)?;
        parse_gemini_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Warum?  "}}]}"#;
        assert_eq!(parse_chat_response("groq", body).unwrap(), "Warum?");
    }

    #[test]
    fn test_parse_chat_response_without_choices() {
        let err = parse_chat_response("openai", r#"{"choices":[]}"#).unwrap_err();
        assert!(format!("{}", err).contains("openai"));
        assert!(parse_chat_response("openai", "not json").is_err());
    }

    #[test]
    fn test_parse_gemini_response() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hallo "},{"text":"Welt"}]}}]}"#;
        assert_eq!(parse_gemini_response(body).unwrap(), "Hallo Welt");
        assert!(parse_gemini_response(r#"{"candidates":[]}"#).is_err());
    }

    #[test]
    fn test_ollama_endpoint() {
        let p = OpenAiCompatible::ollama("localhost:11434/").unwrap();
        assert_eq!(p.endpoint(), "http://localhost:11434/v1/chat/completions");
        let p = OpenAiCompatible::ollama("https://gpu.example.org").unwrap();
        assert_eq!(p.endpoint(), "https://gpu.example.org/v1/chat/completions");
        assert_eq!(p.name(), "ollama");
    }

    #[test]
    fn test_model_override() {
        let p = OpenAiCompatible::groq("key").unwrap().with_model("llama-3.3-70b-versatile");
        assert_eq!(p.model(), "llama-3.3-70b-versatile");
        let g = Gemini::new("key").unwrap();
        assert!(g.endpoint().ends_with("gemini-2.0-flash:generateContent"));
    }

    #[test]
    fn test_excerpt_is_char_safe() {
        let body = "ä".repeat(ERROR_BODY_LIMIT + 10);
        assert_eq!(excerpt(&body).chars().count(), ERROR_BODY_LIMIT);
    }
}
