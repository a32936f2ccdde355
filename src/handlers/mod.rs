//! Serverless-style entry points.
//!
//! Each handler takes a parsed [`Request`], talks to the blob store and
//! the inference provider held by a [`HandlerContext`], and returns a JSON
//! payload. [`dispatch`] wraps a handler in the response envelope.

pub mod analyze;
pub mod envelope;
pub mod generate;
pub mod upload;

use std::sync::Arc;

use serde_json::Value;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{error, warn};

use crate::archive::ArchiveError;
use crate::config::Config;
use crate::pipeline;
use crate::prompt::{self, InferenceParams, PromptError};
use crate::providers::rig::classify_error;
use crate::providers::{InferenceProvider, ProviderError};
use crate::storage::{BlobStore, StorageError};

pub use envelope::{Request, Response};

/// Errors surfaced by a handler, mapped onto HTTP status codes.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::MissingField(_)
            | HandlerError::InvalidField { .. }
            | HandlerError::Archive(_)
            | HandlerError::Storage(StorageError::InvalidKey(_)) => 400,
            HandlerError::NotFound(_) | HandlerError::Storage(StorageError::NotFound { .. }) => 404,
            HandlerError::Prompt(PromptError::PayloadTooLarge { .. }) => 413,
            HandlerError::Storage(_)
            | HandlerError::Provider(ProviderError::ApiError(_))
            | HandlerError::Prompt(PromptError::MalformedJson(_)) => 502,
            HandlerError::Provider(ProviderError::NotConfigured(_))
            | HandlerError::Prompt(PromptError::Serialize(_))
            | HandlerError::Internal(_) => 500,
        }
    }

    /// Short type name shown in error details.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::MissingField(_) => "MissingField",
            HandlerError::InvalidField { .. } => "InvalidField",
            HandlerError::NotFound(_) => "NotFound",
            HandlerError::Archive(_) => "ArchiveError",
            HandlerError::Storage(_) => "StorageError",
            HandlerError::Provider(_) => "ProviderError",
            HandlerError::Prompt(_) => "PromptError",
            HandlerError::Internal(_) => "Internal",
        }
    }

    /// Classification code safe to expose outside debug mode.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            HandlerError::Provider(e) => classify_error(e),
            HandlerError::Storage(StorageError::Io { .. }) => Some("Storage I/O error"),
            _ => None,
        }
    }

    /// Human-readable reason for the response body. Client errors echo
    /// the message; server errors stay generic.
    pub fn reason(&self) -> String {
        match self.status() {
            400..=499 => self.to_string(),
            _ => match self {
                HandlerError::Storage(_) => "storage request failed".to_string(),
                HandlerError::Provider(_) | HandlerError::Prompt(_) => {
                    "model request failed".to_string()
                }
                _ => "internal processing error".to_string(),
            },
        }
    }
}

/// Shared collaborators for every handler invocation.
pub struct HandlerContext {
    pub store: Arc<dyn BlobStore>,
    provider: Option<Arc<dyn InferenceProvider>>,
    pub config: Config,
}

impl HandlerContext {
    pub fn new(
        store: Arc<dyn BlobStore>,
        provider: Option<Arc<dyn InferenceProvider>>,
        config: Config,
    ) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// The inference provider, or a configuration error when none is set up.
    pub fn provider(&self) -> Result<Arc<dyn InferenceProvider>, HandlerError> {
        self.provider.clone().ok_or_else(|| {
            ProviderError::NotConfigured("no inference provider configured".to_string()).into()
        })
    }

    /// Guard the payload size, then run one generation call.
    pub async fn generate(
        &self,
        prompt: &str,
        params: &InferenceParams,
    ) -> Result<String, HandlerError> {
        let provider = self.provider()?;
        prompt::check_payload(prompt, params, self.config.limits.payload_ceiling_bytes)?;
        Ok(provider.infer(prompt, params).await?)
    }
}

/// Every entry point, named as on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Endpoint {
    StartUpload,
    Analyze,
    Terraform,
    Cost,
    Actions,
    CliScript,
    ActionsUrl,
    Survey,
    Deliver,
}

/// Run one entry point against a raw event and wrap the outcome.
pub async fn dispatch(ctx: &HandlerContext, endpoint: Endpoint, event: &Value) -> Response {
    let req = Request::from_event(event);
    let result = match endpoint {
        Endpoint::StartUpload => upload::start_upload(ctx, &req).await,
        Endpoint::Analyze => analyze::analyze(ctx, &req).await,
        Endpoint::Terraform => generate::terraform(ctx, &req).await,
        Endpoint::Cost => generate::cost(ctx, &req).await,
        Endpoint::Actions => generate::actions(ctx, &req).await,
        Endpoint::CliScript => generate::cli_script(ctx, &req).await,
        Endpoint::ActionsUrl => generate::actions_url(ctx, &req).await,
        Endpoint::Survey => pipeline::survey(ctx, &req).await,
        Endpoint::Deliver => pipeline::deliver(ctx, &req).await,
    };

    match result {
        Ok(body) => Response::ok(&body),
        Err(err) => {
            let status = err.status();
            if status >= 500 {
                error!(endpoint = %endpoint, status, "{err}");
            } else {
                warn!(endpoint = %endpoint, status, "{err}");
            }
            let debug = ctx.config.debug || req.query_debug();
            Response::error(&err, req.str_field("request_id"), debug)
        }
    }
}
