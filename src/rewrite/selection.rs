//! Provider selection from configuration and credentials.
//!
//! Selection is an ordered list of probes. Each probe either yields a
//! provider or passes; the first hit wins. `Auto` tries every API in
//! priority order, an explicit choice runs only its own probe.

use crate::config::{ApiChoice, Credentials, PipelineConfig};
use crate::error::{Error, Result};
use crate::rewrite::LlmProvider;
use crate::rewrite::provider::{Gemini, OpenAiCompatible};

/// Probe order for [`ApiChoice::Auto`].
pub const AUTO_PRIORITY: [ApiChoice; 4] = [ApiChoice::Groq, ApiChoice::OpenAi, ApiChoice::Gemini, ApiChoice::Ollama];

/// Probes that run for a configured choice.
pub fn probe_order(choice: ApiChoice) -> Vec<ApiChoice> {
    match choice {
        ApiChoice::Auto => AUTO_PRIORITY.to_vec(),
        explicit => vec![explicit],
    }
}

/// Run one probe.
fn probe(choice: ApiChoice, config: &PipelineConfig, credentials: &Credentials) -> Result<Option<Box<dyn LlmProvider>>> {
    let model = config.model.clone();
    let temperature = config.temperature;

    let provider: Box<dyn LlmProvider> = match choice {
        ApiChoice::Groq => match &credentials.groq_api_key {
            Some(key) => {
                let p = OpenAiCompatible::groq(key.as_str())?.with_temperature(temperature);
                Box::new(match model {
                    Some(m) => p.with_model(m),
                    None => p,
                })
            },
            None => return Ok(None),
        },
        ApiChoice::OpenAi => match &credentials.openai_api_key {
            Some(key) => {
                let p = OpenAiCompatible::openai(key.as_str())?.with_temperature(temperature);
                Box::new(match model {
                    Some(m) => p.with_model(m),
                    None => p,
                })
            },
            None => return Ok(None),
        },
        ApiChoice::Gemini => match &credentials.gemini_api_key {
            Some(key) => {
                let p = Gemini::new(key.as_str())?.with_temperature(temperature);
                Box::new(match model {
                    Some(m) => p.with_model(m),
                    None => p,
                })
            },
            None => return Ok(None),
        },
        ApiChoice::Ollama => match &credentials.ollama_host {
            Some(host) => {
                let p = OpenAiCompatible::ollama(host)?.with_temperature(temperature);
                Box::new(match model {
                    Some(m) => p.with_model(m),
                    None => p,
                })
            },
            None => return Ok(None),
        },
        ApiChoice::Auto => return Ok(None),
    };
    Ok(Some(provider))
}

/// Pick the language model provider for a run.
///
/// # Errors
///
/// [`Error::NoProviderAvailable`] when no probe finds credentials.
pub fn select_provider(config: &PipelineConfig, credentials: &Credentials) -> Result<Box<dyn LlmProvider>> {
    let probes = probe_order(config.api_choice);
    for choice in &probes {
        match probe(*choice, config, credentials)? {
            Some(provider) => {
                log::info!("Using LLM API {} with model {}", provider.name(), provider.model());
                return Ok(provider);
            },
            None => log::debug!("No credentials for {}", choice.as_str()),
        }
    }

    let tried: Vec<&str> = probes.iter().map(|c| c.as_str()).collect();
    Err(Error::NoProviderAvailable(tried.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            openai_api_key: Some("sk-test".to_string()),
            groq_api_key: None,
            gemini_api_key: Some("g-test".to_string()),
            ollama_host: Some("localhost:11434".to_string()),
        }
    }

    #[test]
    fn test_auto_follows_priority() {
        let provider = select_provider(&PipelineConfig::default(), &creds()).unwrap();
        assert_eq!(provider.name(), "openai");

        let mut with_groq = creds();
        with_groq.groq_api_key = Some("gsk-test".to_string());
        let provider = select_provider(&PipelineConfig::default(), &with_groq).unwrap();
        assert_eq!(provider.name(), "groq");
        assert_eq!(provider.model(), "openai/gpt-oss-120b");
    }

    #[test]
    fn test_explicit_choice_only_runs_its_probe() {
        let config = PipelineConfig::default().with_api_choice(ApiChoice::Gemini).with_model("gemini-1.5-pro");
        let provider = select_provider(&config, &creds()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-1.5-pro");

        let config = PipelineConfig::default().with_api_choice(ApiChoice::Groq);
        match select_provider(&config, &creds()) {
            Err(Error::NoProviderAvailable(tried)) => assert_eq!(tried, "groq"),
            other => panic!("expected NoProviderAvailable, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[test]
    fn test_no_credentials() {
        let err = select_provider(&PipelineConfig::default(), &Credentials::default())
            .err()
            .unwrap();
        assert!(format!("{}", err).contains("groq, openai, gemini, ollama"));
    }

    #[test]
    fn test_ollama_last_resort() {
        let only_ollama = Credentials {
            ollama_host: Some("localhost:11434".to_string()),
            ..Credentials::default()
        };
        let provider = select_provider(&PipelineConfig::default(), &only_ollama).unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}
