//! rig-core integration for LLM inference.
//!
//! Uses rig-core's provider clients and Agent abstraction for multi-provider
//! support. Currently supports: Anthropic, OpenAI, Cohere, Gemini, Perplexity,
//! DeepSeek, xAI, Groq, and any OpenAI-compatible API.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::models::ProviderName;
use crate::prompt::InferenceParams;

use super::{InferenceProvider, ProviderError};

/// Build a single-turn agent from a rig-core client and prompt it.
///
/// `top_p` is not forwarded; rig's agent builder has no portable knob for it.
macro_rules! prompt_once {
    ($client:expr, $model:expr, $user:expr, $params:expr, $label:expr) => {{
        let agent = $client
            .agent($model)
            .temperature($params.temperature)
            .max_tokens($params.max_tokens)
            .build();
        agent
            .prompt($user)
            .await
            .map_err(|e| ProviderError::ApiError(format!("{} API error: {e}", $label)))
    }};
}

/// Create a rig-core client using the `Client::new(api_key)` convention.
macro_rules! new_client {
    ($provider_mod:path, $api_key:expr, $label:expr) => {{
        <$provider_mod>::new($api_key).map_err(|e| {
            ProviderError::ApiError(format!("failed to create {} client: {e}", $label))
        })
    }};
}

/// rig-core based inference provider.
///
/// The provider name in config selects which rig-core client is used.
pub struct RigProvider {
    config: ProviderConfig,
}

impl RigProvider {
    /// Create a new RigProvider with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "no API key found for provider '{}'. Set {} or the provider-specific env var.",
                config.name,
                crate::constants::ENV_API_KEY
            )));
        }
        Ok(Self { config })
    }

    fn build_openai_client(
        &self,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<providers::openai::CompletionsClient, ProviderError> {
        let mut builder = providers::openai::CompletionsClient::builder().api_key(api_key);
        if let Some(base_url) = base_url {
            builder = builder.base_url(base_url);
        }
        builder
            .build()
            .map_err(|e| ProviderError::ApiError(format!("failed to create OpenAI client: {e}")))
    }

    /// Require `base_url` for OpenAI-compatible providers.
    fn require_base_url(&self) -> Result<&str, ProviderError> {
        self.config.base_url.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "openai-compatible provider requires base_url to be set".to_string(),
            )
        })
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("missing API key".to_string()))
    }
}

#[async_trait]
impl InferenceProvider for RigProvider {
    async fn infer(&self, prompt: &str, params: &InferenceParams) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let model = self.config.model.as_str();
        debug!(
            provider = %self.config.name,
            model,
            max_tokens = params.max_tokens,
            "sending inference request"
        );

        match self.config.name {
            ProviderName::Anthropic => {
                let client: providers::anthropic::Client = providers::anthropic::Client::builder()
                    .api_key(api_key)
                    .build()
                    .map_err(|e| {
                        ProviderError::ApiError(format!("failed to create Anthropic client: {e}"))
                    })?;
                prompt_once!(client, model, prompt, params, "Anthropic")
            }
            ProviderName::OpenAI => {
                let client = self.build_openai_client(api_key, self.config.base_url.as_deref())?;
                prompt_once!(client, model, prompt, params, "OpenAI")
            }
            ProviderName::Cohere => {
                let client = new_client!(providers::cohere::Client, api_key, "Cohere")?;
                prompt_once!(client, model, prompt, params, "Cohere")
            }
            ProviderName::Gemini => {
                let client = new_client!(providers::gemini::Client, api_key, "Gemini")?;
                prompt_once!(client, model, prompt, params, "Gemini")
            }
            ProviderName::Perplexity => {
                let client = new_client!(providers::perplexity::Client, api_key, "Perplexity")?;
                prompt_once!(client, model, prompt, params, "Perplexity")
            }
            ProviderName::DeepSeek => {
                let client = new_client!(providers::deepseek::Client, api_key, "DeepSeek")?;
                prompt_once!(client, model, prompt, params, "DeepSeek")
            }
            ProviderName::XAI => {
                let client = new_client!(providers::xai::Client, api_key, "xAI")?;
                prompt_once!(client, model, prompt, params, "xAI")
            }
            ProviderName::Groq => {
                let client = new_client!(providers::groq::Client, api_key, "Groq")?;
                prompt_once!(client, model, prompt, params, "Groq")
            }
            ProviderName::OpenAICompatible => {
                let base_url = self.require_base_url()?;
                let client = self.build_openai_client(api_key, Some(base_url))?;
                prompt_once!(client, model, prompt, params, "OpenAI-compatible")
            }
        }
    }
}

/// Classifies a provider error into a short, user-friendly message.
///
/// Returns `Some(message)` for throttling and transport failures, `None`
/// for anything unrecognised.
pub fn classify_error(err: &ProviderError) -> Option<&'static str> {
    match err {
        ProviderError::ApiError(msg) => {
            let msg_lower = msg.to_lowercase();
            if msg_lower.contains("429")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("throttl")
            {
                Some("Rate limited by API")
            } else if msg_lower.contains("503")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("high demand")
            {
                Some("High model load")
            } else if msg_lower.contains("529") || msg_lower.contains("overloaded") {
                Some("API overloaded")
            } else if msg_lower.contains("502") {
                Some("API gateway error")
            } else if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
                Some("Request timed out")
            } else if msg_lower.contains("connection") {
                Some("Connection error")
            } else if msg_lower.contains("temporarily") || msg_lower.contains("try again") {
                Some("Temporary API error")
            } else {
                None
            }
        }
        ProviderError::NotConfigured(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: ProviderName, api_key: Option<&str>, base_url: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name,
            model: "test-model".to_string(),
            base_url: base_url.map(str::to_string),
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn new_provider_missing_api_key() {
        match RigProvider::new(config(ProviderName::Anthropic, None, None)) {
            Err(e) => assert!(e.to_string().contains("API key"), "got: {e}"),
            Ok(_) => panic!("expected error for missing API key"),
        }
    }

    #[test]
    fn new_provider_with_api_key() {
        assert!(RigProvider::new(config(ProviderName::Anthropic, Some("sk-test"), None)).is_ok());
    }

    #[test]
    fn require_base_url_missing() {
        let provider =
            RigProvider::new(config(ProviderName::OpenAICompatible, Some("key"), None)).unwrap();
        let err = provider.require_base_url().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn require_base_url_present() {
        let provider = RigProvider::new(config(
            ProviderName::OpenAICompatible,
            Some("key"),
            Some("http://localhost:11434/v1"),
        ))
        .unwrap();
        assert_eq!(provider.require_base_url().unwrap(), "http://localhost:11434/v1");
    }

    #[test]
    fn classify_rate_limit() {
        let err = ProviderError::ApiError(
            "Anthropic API error: HttpError: Invalid status code 429 Too Many Requests".into(),
        );
        assert_eq!(classify_error(&err), Some("Rate limited by API"));
        let err = ProviderError::ApiError("ThrottlingException: slow down".into());
        assert_eq!(classify_error(&err), Some("Rate limited by API"));
    }

    #[test]
    fn classify_transport_errors() {
        let cases = [
            ("HTTP 503 Service Unavailable", "High model load"),
            ("529 overloaded_error", "API overloaded"),
            ("HTTP 502 Bad Gateway", "API gateway error"),
            ("request timed out after 30s", "Request timed out"),
            ("connection refused", "Connection error"),
            ("please try again later", "Temporary API error"),
        ];
        for (msg, expected) in cases {
            let err = ProviderError::ApiError(msg.into());
            assert_eq!(classify_error(&err), Some(expected), "{msg}");
        }
    }

    #[test]
    fn classify_unknown_and_config_errors() {
        assert_eq!(classify_error(&ProviderError::ApiError("bad model".into())), None);
        assert_eq!(classify_error(&ProviderError::NotConfigured("x".into())), None);
    }
}
