//! Prompt assembly, payload guarding and response cleanup.
//!
//! The analysis prompt is fixed text plus the selected file snippets. The
//! generation prompts live in [`templates`]. Every prompt, whatever its
//! origin, goes through [`check_payload`] before it may be sent.

pub mod templates;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::{FileSummary, Metadata};

/// Dotted JSON paths the analysis response may fill.
pub const SHAPE_HINT: &str = "services[].name,services[].language,services[].framework,services[].artifact,services[].docker.hasDockerfile,services[].docker.ports[],services[].env,services[].dependsOn[],services[].runtime.javaVersion,services[].runtime.nodeVersion,services[].runtime.pythonVersion,infrastructure.aws.ec2,infrastructure.aws.alb,infrastructure.aws.rds,infrastructure.aws.s3,infrastructure.aws.ecr,infrastructure.aws.vpc,infrastructure.aws.iam,infrastructure.aws.lambda,infrastructure.aws.apigw,infrastructure.aws.bedrock,infrastructure.aws.kafka_msksqs,infrastructure.aws.redis_elasticache,infrastructure.external[],deployment.buildTool,deployment.ci,deployment.containerOrchestration,deployment.terraformHints.terraformRequiredProviders[],deployment.terraformHints.terraformModulesCandidates[],deployment.terraformHints.variables.*,deployment.terraformHints.outputs.*,findings[].type,findings[].message,findings[].path";

const FILES_HEADER: &str = "\n=== FILES ===\n";
const FILE_SEPARATOR: &str = "\n---\n";
const CLOSING_INSTRUCTION: &str = "Output strictly valid JSON.";

/// Errors while preparing a request or interpreting a response.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("request payload is {bytes} bytes, over the {cap}-byte ceiling")]
    PayloadTooLarge { bytes: usize, cap: usize },

    #[error("failed to serialize request payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("model response is not a JSON object: {0}")]
    MalformedJson(String),
}

/// Sampling parameters sent with one inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceParams {
    pub max_tokens: u64,
    pub temperature: f64,
    pub top_p: f64,
}

impl InferenceParams {
    /// Architecture analysis: deterministic, short.
    pub const fn analysis() -> Self {
        Self {
            max_tokens: 1500,
            temperature: 0.0,
            top_p: 0.9,
        }
    }

    pub const fn terraform() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    pub const fn cost() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    pub const fn actions() -> Self {
        Self {
            max_tokens: 4000,
            temperature: 0.3,
            top_p: 0.9,
        }
    }

    pub const fn cli_script() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

/// Context line naming the project being analysed.
pub fn project_context(name: &str, root: &str) -> String {
    format!("project '{name}' at '{root}'")
}

/// Build the analysis prompt for one project.
pub fn build_analysis_prompt(summaries: &[FileSummary], project_context: &str) -> String {
    let body_len: usize = summaries
        .iter()
        .map(|s| s.path.len() + s.content.len() + 8)
        .sum();
    let mut prompt = String::with_capacity(SHAPE_HINT.len() + body_len + 256);

    prompt.push_str("Analyze ");
    prompt.push_str(project_context);
    prompt.push_str(
        ". Return JSON only (no backticks, no prose). If uncertain, omit fields. \
         Fill only these keys: ",
    );
    prompt.push_str(SHAPE_HINT);
    prompt.push_str(FILES_HEADER);
    for summary in summaries {
        prompt.push('[');
        prompt.push_str(&summary.path);
        prompt.push_str("]\n");
        prompt.push_str(&summary.content);
        prompt.push_str(FILE_SEPARATOR);
    }
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

/// Serialized size of the request that would carry `prompt`.
pub fn payload_size(prompt: &str, params: &InferenceParams) -> Result<usize, PromptError> {
    let body = json!({
        "messages": [{ "role": "user", "content": [{ "text": prompt }] }],
        "inferenceConfig": {
            "maxTokens": params.max_tokens,
            "temperature": params.temperature,
            "topP": params.top_p,
        }
    });
    Ok(serde_json::to_vec(&body)?.len())
}

/// Refuse requests whose serialized form exceeds `ceiling` bytes.
///
/// Returns the measured size on success.
pub fn check_payload(
    prompt: &str,
    params: &InferenceParams,
    ceiling: usize,
) -> Result<usize, PromptError> {
    let bytes = payload_size(prompt, params)?;
    if bytes > ceiling {
        return Err(PromptError::PayloadTooLarge { bytes, cap: ceiling });
    }
    Ok(bytes)
}

/// Isolate the JSON body of a model answer.
///
/// Fenced answers lose their backticks and everything outside the
/// outermost braces. Unfenced answers are only trimmed.
pub fn clean_json_response(raw: &str) -> &str {
    let mut text = raw.trim();
    if !text.starts_with("```") {
        return text;
    }
    text = text.trim_matches('`');
    if let Some(start) = text.find('{') {
        text = &text[start..];
    }
    if let Some(end) = text.rfind('}') {
        text = &text[..=end];
    }
    text
}

/// Parse an analysis answer into a metadata document.
pub fn parse_metadata(raw: &str) -> Result<Metadata, PromptError> {
    let cleaned = clean_json_response(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PromptError::MalformedJson(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(PromptError::MalformedJson(e.to_string())),
    }
}

/// Drop a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fence(raw: &str) -> String {
    let text = raw.trim();
    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

static COST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// First decimal number in a cost answer.
pub fn extract_cost(raw: &str) -> Option<String> {
    COST_RE.find(raw).map(|m| m.as_str().to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
