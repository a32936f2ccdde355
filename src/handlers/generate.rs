//! Artifact generation entry points: Terraform, cost, workflow, CLI script.
//!
//! The typed `generate_*` functions are shared with the sequencer; the
//! request-level wrappers only parse fields and shape the response.

use serde_json::{json, Value};
use tracing::info;

use crate::constants::RESULTS_PREFIX;
use crate::models::metadata::is_truthy;
use crate::models::CloudProvider;
use crate::prompt::{self, templates, InferenceParams};
use crate::storage::{self, ArtifactKind, UrlMethod};

use super::{HandlerContext, HandlerError, Request};

async fn read_text(ctx: &HandlerContext, key: &str) -> Result<String, HandlerError> {
    let bytes = ctx.store.get(key).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Generate and store the Terraform configuration; returns its key.
pub async fn generate_terraform(
    ctx: &HandlerContext,
    request_id: &str,
    cloud: CloudProvider,
    survey: &Value,
) -> Result<String, HandlerError> {
    let meta_key = storage::metadata_key(request_id)?;
    let metadata: Value = serde_json::from_str(&read_text(ctx, &meta_key).await?)
        .map_err(|e| HandlerError::Internal(format!("stored metadata is not valid JSON: {e}")))?;

    let text = templates::terraform(cloud, &metadata, survey);
    let answer = ctx.generate(&text, &InferenceParams::terraform()).await?;
    let hcl = prompt::strip_code_fence(&answer);

    let key = storage::artifact_key(request_id, ArtifactKind::Terraform, cloud)?;
    ctx.store
        .put(&key, hcl.into_bytes(), ArtifactKind::Terraform.content_type())
        .await?;
    info!(%cloud, key = %key, "terraform stored");
    Ok(key)
}

/// Estimate the monthly cost of a stored Terraform configuration.
///
/// `None` when the answer holds no number.
pub async fn estimate_cost(
    ctx: &HandlerContext,
    request_id: &str,
    cloud: CloudProvider,
    terraform_key: Option<&str>,
) -> Result<Option<String>, HandlerError> {
    let key = match terraform_key {
        Some(key) => checked_result_key(request_id, key)?,
        None => storage::artifact_key(request_id, ArtifactKind::Terraform, cloud)?,
    };
    let terraform = read_text(ctx, &key).await?;

    let region = ctx.config.generation.pricing_region.as_deref();
    let text = templates::cost(cloud, &terraform, region);
    let answer = ctx.generate(&text, &InferenceParams::cost()).await?;
    let cost = prompt::extract_cost(&answer);
    info!(%cloud, cost = cost.as_deref().unwrap_or("none"), "cost estimated");
    Ok(cost)
}

/// Generate and store the GitHub Actions workflow; returns a GET URL.
pub async fn generate_actions(
    ctx: &HandlerContext,
    request_id: &str,
    cloud: CloudProvider,
) -> Result<String, HandlerError> {
    let tf_key = storage::artifact_key(request_id, ArtifactKind::Terraform, cloud)?;
    let terraform = read_text(ctx, &tf_key).await?;

    let text = templates::actions(cloud, &terraform, &ctx.config.generation.project_name);
    let answer = ctx.generate(&text, &InferenceParams::actions()).await?;
    let workflow = prompt::strip_code_fence(&answer);

    let key = storage::artifact_key(request_id, ArtifactKind::Actions, cloud)?;
    ctx.store
        .put(&key, workflow.into_bytes(), ArtifactKind::Actions.content_type())
        .await?;
    info!(%cloud, key = %key, "workflow stored");
    get_url(ctx, &key).await
}

/// Generate and store the deployment script; returns a GET URL.
pub async fn generate_cli(
    ctx: &HandlerContext,
    request_id: &str,
    cloud: CloudProvider,
) -> Result<String, HandlerError> {
    let text = templates::cli_script(cloud, request_id, &ctx.config.generation.project_name);
    let script = ctx.generate(&text, &InferenceParams::cli_script()).await?;

    let key = storage::artifact_key(request_id, ArtifactKind::CliScript, cloud)?;
    ctx.store
        .put(&key, script.into_bytes(), ArtifactKind::CliScript.content_type())
        .await?;
    info!(%cloud, key = %key, "cli script stored");
    get_url(ctx, &key).await
}

/// GET URL for an artifact, or `None` when it has not been generated.
pub async fn artifact_url(
    ctx: &HandlerContext,
    request_id: &str,
    kind: ArtifactKind,
    cloud: CloudProvider,
) -> Result<Option<String>, HandlerError> {
    let key = storage::artifact_key(request_id, kind, cloud)?;
    if !ctx.store.head_exists(&key).await? {
        return Ok(None);
    }
    get_url(ctx, &key).await.map(Some)
}

async fn get_url(ctx: &HandlerContext, key: &str) -> Result<String, HandlerError> {
    Ok(ctx
        .store
        .presigned_url(key, UrlMethod::Get, ctx.config.storage.artifact_url_expiry_secs)
        .await?)
}

/// Accept a caller-supplied key only inside the request's result prefix.
fn checked_result_key(request_id: &str, key: &str) -> Result<String, HandlerError> {
    let prefix = format!("{RESULTS_PREFIX}/{request_id}/");
    let artifact = key.strip_prefix(&prefix).ok_or_else(|| HandlerError::InvalidField {
        field: "terraform_key",
        reason: format!("must start with {prefix}"),
    })?;
    Ok(storage::result_key(request_id, artifact)?)
}

pub async fn terraform(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;
    let survey = req
        .field("survey")
        .filter(|v| is_truthy(v))
        .ok_or(HandlerError::MissingField("survey"))?;

    let key = generate_terraform(ctx, request_id, cloud, survey).await?;
    Ok(json!({
        "request_id": request_id,
        "provider": cloud,
        "terraform_key": key,
        "status": "success",
    }))
}

pub async fn cost(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;
    let cost = estimate_cost(ctx, request_id, cloud, req.str_field("terraform_key")).await?;
    Ok(json!({
        "request_id": request_id,
        "provider": cloud,
        "cost": cost,
    }))
}

pub async fn actions(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;
    let url = generate_actions(ctx, request_id, cloud).await?;
    Ok(json!({ "actions": url }))
}

pub async fn cli_script(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;
    let url = generate_cli(ctx, request_id, cloud).await?;
    Ok(json!({ "presigned_url": url }))
}

pub async fn actions_url(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;
    let url = artifact_url(ctx, request_id, ArtifactKind::Actions, cloud)
        .await?
        .ok_or_else(|| {
            HandlerError::NotFound(format!("no {cloud} workflow for request {request_id}"))
        })?;
    Ok(json!({
        "request_id": request_id,
        "presigned_url": url,
    }))
}
