//! Source archive analysis entry point.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::analysis::AnalysisPipeline;
use crate::archive::SourceArchive;
use crate::storage::{self, ArtifactKind};

use super::{HandlerContext, HandlerError, Request};

/// Download an uploaded archive, analyse it and persist the metadata.
///
/// Succeeds even when no project could be analysed; in that case nothing
/// is written.
pub async fn analyze(ctx: &HandlerContext, req: &Request) -> Result<Value, HandlerError> {
    let request_id = req.request_id()?;
    let file_name = req.require_str("file_name")?;
    let zip_key = storage::upload_key(request_id, file_name)?;
    let provider = ctx.provider()?;

    info!(bucket = ctx.store.bucket(), key = %zip_key, "downloading archive");
    let bytes = ctx.store.get(&zip_key).await?;
    info!(key = %zip_key, bytes = bytes.len(), "download complete");

    let mut archive = SourceArchive::from_bytes(bytes)?;
    let pipeline = AnalysisPipeline::new(provider, ctx.config.limits);
    let report = pipeline.run(&mut archive).await;

    match report.outcome.document() {
        Some(doc) => {
            let meta_key = storage::metadata_key(request_id)?;
            let body = serde_json::to_vec_pretty(doc)
                .map_err(|e| HandlerError::Internal(format!("failed to encode metadata: {e}")))?;
            ctx.store
                .put(&meta_key, body, ArtifactKind::Metadata.content_type())
                .await?;
            info!(
                key = %meta_key,
                projects = report.projects_analyzed,
                files = report.files_collected,
                bytes = report.bytes_used,
                "metadata written"
            );
        }
        None => warn!(request_id, "no projects analysed; metadata not written"),
    }

    Ok(json!({
        "message": "analysis complete",
        "projectsAnalyzed": report.projects_analyzed,
        "filesCollected": report.files_collected,
    }))
}
