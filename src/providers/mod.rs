//! InferenceProvider trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core to decouple the
//! pipeline from the specific LLM library.

pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::prompt::InferenceParams;

/// Errors from the inference provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Trait for single-turn text completion.
///
/// Callers are responsible for the payload guard; implementations only
/// send the prompt and return the raw answer text.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn infer(&self, prompt: &str, params: &InferenceParams) -> Result<String, ProviderError>;
}
