//! Multi-step sequencing across the generation handlers.
//!
//! `survey` walks every cloud once (Terraform, then cost) and collects the
//! figures; `deliver` produces the download set for the cloud the user
//! picked. Neither retries or branches.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::handlers::generate::{
    artifact_url, estimate_cost, generate_actions, generate_cli, generate_terraform,
};
use crate::handlers::{HandlerContext, HandlerError, Request};
use crate::models::metadata::is_truthy;
use crate::models::CloudProvider;
use crate::storage::ArtifactKind;

/// Cost recorded for a cloud whose estimate is missing or failed.
pub const ZERO_COST: &str = "0.00";

async fn price_cloud(
    ctx: &HandlerContext,
    request_id: &str,
    cloud: CloudProvider,
    survey: &Value,
) -> Result<Option<String>, HandlerError> {
    let key = generate_terraform(ctx, request_id, cloud, survey).await?;
    estimate_cost(ctx, request_id, cloud, Some(&key)).await
}

/// Generate Terraform and a cost estimate for every cloud.
pub async fn survey(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let survey = req
        .field("survey")
        .filter(|v| is_truthy(v))
        .ok_or(HandlerError::MissingField("survey"))?;

    let mut costs = IndexMap::new();
    for cloud in CloudProvider::ALL {
        let cost = match price_cloud(ctx, request_id, cloud, survey).await {
            Ok(cost) => cost.unwrap_or_else(|| ZERO_COST.to_string()),
            Err(err) => {
                warn!(%cloud, status = err.status(), "cloud skipped: {err}");
                ZERO_COST.to_string()
            }
        };
        costs.insert(cloud.to_string(), cost);
    }

    let mut urls = IndexMap::new();
    for cloud in CloudProvider::ALL {
        let url = artifact_url(ctx, request_id, ArtifactKind::Terraform, cloud).await?;
        urls.insert(cloud.to_string(), url);
    }

    info!(request_id, ?costs, "survey complete");
    Ok(json!({
        "costs": costs,
        "terraform_urls": urls,
    }))
}

/// Produce the Terraform, workflow and script URLs for one cloud.
pub async fn deliver(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let cloud = req.cloud()?;

    let terraform = artifact_url(ctx, request_id, ArtifactKind::Terraform, cloud)
        .await?
        .ok_or_else(|| {
            HandlerError::Internal(format!("terraform for {cloud} has not been generated"))
        })?;
    let actions = generate_actions(ctx, request_id, cloud).await?;
    let cli = generate_cli(ctx, request_id, cloud).await?;

    info!(request_id, %cloud, "delivery ready");
    Ok(json!({
        "cloud": cloud,
        "terraform": terraform,
        "actions": actions,
        "cli": cli,
    }))
}
